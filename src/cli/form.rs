// src/cli/form.rs

//! The entry form for the visible parameters of one operation.
//!
//! The form shows a "keep constant" toggle per parameter. The model stores the
//! opposite flag, `is_deferred`, and the translation happens only here.

use crate::{
    core::{registry::RegistryError, sequence::Sequence},
    models::{ParamKind, ParamValue, ValueError},
};
use anyhow::{Result, anyhow};
use colored::Colorize;
use dialoguer::{Confirm, Input, theme::ColorfulTheme};

/// One row of the form, as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    pub desc: String,
    pub kind: ParamKind,
    pub text: String,
    pub keep_constant: bool,
}

pub fn defers_from_keep_constant(keep_constant: &[bool]) -> Vec<bool> {
    keep_constant.iter().map(|keep| !keep).collect()
}

pub fn keep_constant_from_defers(defers: &[bool]) -> Vec<bool> {
    defers.iter().map(|deferred| !deferred).collect()
}

/// Seeds the form with previously entered values and flags, or with canonical
/// defaults the first time an operation is edited.
pub fn initial_fields(sequence: &Sequence, position: usize) -> Result<Vec<FormField>, RegistryError> {
    let params = sequence.visible_params_for(position)?;
    let defers: Vec<bool> = params.iter().map(|p| p.is_deferred()).collect();
    let keep_constant = keep_constant_from_defers(&defers);

    Ok(params
        .into_iter()
        .zip(keep_constant)
        .map(|(param, keep_constant)| FormField {
            name: param.name().to_string(),
            desc: param.desc().to_string(),
            kind: param.kind(),
            text: param
                .value()
                .or(param.default())
                .map(ToString::to_string)
                .unwrap_or_default(),
            keep_constant,
        })
        .collect())
}

/// Parses every field, failing on the first invalid entry.
pub fn parse_fields(fields: &[FormField]) -> Result<(Vec<ParamValue>, Vec<bool>), ValueError> {
    let values = fields
        .iter()
        .map(|f| ParamValue::parse(f.kind, &f.text))
        .collect::<Result<Vec<_>, _>>()?;
    let keep_constant: Vec<bool> = fields.iter().map(|f| f.keep_constant).collect();
    Ok((values, defers_from_keep_constant(&keep_constant)))
}

/// Parses the fields and presets the operation with them.
pub fn submit(sequence: &mut Sequence, position: usize, fields: &[FormField]) -> Result<()> {
    let (values, defers) = parse_fields(fields)?;
    sequence.preset(position, values, &defers)?;
    Ok(())
}

/// Asks the user for every visible parameter of the operation at `position`.
pub fn prompt_operation(sequence: &mut Sequence, position: usize) -> Result<()> {
    let mut fields = initial_fields(sequence, position)?;

    if let Some(field) = fields.iter().find(|f| !f.kind.is_enterable()) {
        return Err(anyhow!(
            t!("form.error.not_enterable"),
            name = field.name,
            kind = field.kind
        ));
    }
    if fields.is_empty() {
        println!("{}", t!("form.no_params").dimmed());
        return Ok(());
    }

    let theme = ColorfulTheme::default();
    for field in &mut fields {
        if !field.desc.is_empty() {
            println!("  {}", field.desc.dimmed());
        }
        let kind = field.kind;
        field.text = Input::<String>::with_theme(&theme)
            .with_prompt(format!(t!("form.prompt.value"), name = field.name, kind = kind))
            .default(field.text.clone())
            .allow_empty(kind == ParamKind::String)
            .validate_with(move |input: &String| -> Result<(), String> {
                ParamValue::parse(kind, input)
                    .map(|_| ())
                    .map_err(|e| e.to_string())
            })
            .interact_text()?;
        field.keep_constant = Confirm::with_theme(&theme)
            .with_prompt(t!("form.prompt.keep_constant"))
            .default(field.keep_constant)
            .interact()?;
    }

    submit(sequence, position, &fields)
}
