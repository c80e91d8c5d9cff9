// src/cli/handlers/plan.rs

use crate::{
    cli::{args::PlanArgs, handlers::commons},
    core::{
        catalog::Library,
        sequence::{Specification, WrappingMetadata},
    },
    models::{ParamValue, PlanFile, PlanOperation},
};
use anyhow::{Context, Result, anyhow};
use clap::Parser;
use colored::*;
use std::{fs, path::Path};

/// The main handler for the `plan` command.
/// Builds a specification from a plan file without prompting.
pub fn handle(args: Vec<String>) -> Result<()> {
    let plan_args = PlanArgs::try_parse_from(&args)?;
    let (config, library) = commons::load_library()?;

    let plan = read_plan(&plan_args.file)?;
    let spec = spec_from_plan(library, &plan)?;
    let finalized = commons::finalize_and_write(spec, plan_args.output, &config)?;

    eprintln!(
        "{}",
        format!(
            t!("plan.success"),
            name = finalized.name.cyan(),
            count = finalized.operations.len()
        )
        .green()
    );
    Ok(())
}

pub fn read_plan(path: &Path) -> Result<PlanFile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!(t!("plan.error.read"), path = path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!(t!("plan.error.parse"), path = path.display()))
}

/// Replays a plan into a fresh specification.
pub fn spec_from_plan(library: Library, plan: &PlanFile) -> Result<Specification> {
    let mut spec = Specification::new(library);
    spec.metadata = WrappingMetadata {
        name: plan.name.clone(),
        label: plan.label.clone().unwrap_or_default(),
        description: plan.description.clone().unwrap_or_default(),
    };

    for operation in &plan.operations {
        let position = spec.sequence.append(&operation.name)?;
        let (values, defers) = resolve_operation(&spec, position, operation)?;
        spec.sequence.preset(position, values, &defers)?;
        spec.sequence
            .set_use_last_values(position, operation.use_last_values)?;
        log::debug!("Plan: appended '{}' at {}.", operation.name, position);
    }
    Ok(spec)
}

/// Parses the texts of one plan entry against the visible parameters, falling
/// back to canonical defaults when the entry gives no values at all.
fn resolve_operation(
    spec: &Specification,
    position: usize,
    operation: &PlanOperation,
) -> Result<(Vec<ParamValue>, Vec<bool>)> {
    let params = spec.sequence.visible_params_for(position)?;

    let values = if operation.values.is_empty() {
        params
            .iter()
            .map(|p| {
                p.default().cloned().ok_or_else(|| {
                    anyhow!(
                        t!("plan.error.no_default"),
                        operation = operation.name,
                        param = p.name()
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?
    } else {
        if operation.values.len() != params.len() {
            return Err(anyhow!(
                t!("plan.error.value_count"),
                operation = operation.name,
                expected = params.len(),
                found = operation.values.len()
            ));
        }
        params
            .iter()
            .zip(&operation.values)
            .map(|(p, text)| {
                ParamValue::parse(p.kind(), text).with_context(|| {
                    format!(
                        t!("plan.error.bad_value"),
                        operation = operation.name,
                        param = p.name()
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?
    };

    let defers = if operation.deferred.is_empty() {
        vec![false; params.len()]
    } else {
        operation.deferred.clone()
    };
    Ok((values, defers))
}
