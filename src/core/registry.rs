//! # Parameter Registry
//!
//! Holds the parameters of every operation in a sequence, formal and actual, in one
//! flat list. Each operation owns a contiguous slice described by the boundary
//! index: the operation at position `i` owns `params[boundaries[i]..boundaries[i + 1]]`.
//!
//! Parameters are created in bulk when an operation is inserted, receive actual
//! values only through [`ParamRegistry::preset`] for their owning operation, and
//! are removed only together with their whole slice.

use crate::{
    core::{catalog::ParamSource, classifier},
    models::{ParamDef, ParamKind, ParamValue},
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::{collections::HashMap, ops::Range};
use thiserror::Error;

lazy_static! {
    static ref UNSAFE_IDENT_CHARS_RE: Regex =
        Regex::new(r"[^A-Za-z0-9_]").expect("identifier pattern is valid");
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("No operation at position {position} (the sequence has {len}).")]
    PositionOutOfRange { position: usize, len: usize },
    #[error(
        "Preset for position {position} expects {expected} values and defer flags, got {values} values and {defers} flags."
    )]
    ArityMismatch {
        position: usize,
        expected: usize,
        values: usize,
        defers: usize,
    },
    #[error("Unique parameter names have not been assigned yet.")]
    NamesNotAssigned,
}

/// One parameter of one operation: its formal definition plus what the user entered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    #[serde(flatten)]
    def: ParamDef,
    hidden: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<ParamValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<ParamValue>,
    is_deferred: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    unique_name: Option<String>,
}

impl Param {
    /// Hiddenness depends on the position in the parameter list, not on the
    /// definition alone, so it is decided by the caller.
    fn new(def: ParamDef, hidden: bool) -> Self {
        // Hidden parameters are never shown, so they get no default.
        let default = if hidden {
            None
        } else {
            def.kind.canonical_default()
        };
        Self {
            def,
            hidden,
            default,
            value: None,
            is_deferred: false,
            unique_name: None,
        }
    }

    pub fn def(&self) -> &ParamDef {
        &self.def
    }

    pub fn kind(&self) -> ParamKind {
        self.def.kind
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn desc(&self) -> &str {
        &self.def.desc
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn default(&self) -> Option<&ParamValue> {
        self.default.as_ref()
    }

    pub fn value(&self) -> Option<&ParamValue> {
        self.value.as_ref()
    }

    /// True when the value is supplied when the generated plugin runs.
    pub fn is_deferred(&self) -> bool {
        self.is_deferred
    }

    pub fn unique_name(&self) -> Option<&str> {
        self.unique_name.as_deref()
    }

    pub fn is_ephemeral(&self) -> bool {
        self.def.kind.is_ambient()
    }
}

/// The flat, range-indexed list of parameters of a whole sequence.
#[derive(Debug, Clone)]
pub struct ParamRegistry {
    params: Vec<Param>,
    /// First parameter index of each operation, plus the end of the last one.
    boundaries: Vec<usize>,
    /// Whether each operation's parameters came from a macro.
    macro_slices: Vec<bool>,
    names_assigned: bool,
}

impl Default for ParamRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ParamRegistry {
    pub fn new() -> Self {
        Self {
            params: Vec::new(),
            boundaries: vec![0],
            macro_slices: Vec::new(),
            names_assigned: false,
        }
    }

    /// Number of parameters across all operations.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Number of operations with a slice in the registry.
    pub fn operation_count(&self) -> usize {
        self.boundaries.len().saturating_sub(1)
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn boundaries(&self) -> &[usize] {
        &self.boundaries
    }

    /// Appends the formal parameters of `source` as a new slice and marks its
    /// hidden prefix.
    pub fn insert_params_of(&mut self, source: &ParamSource<'_>) -> classifier::Classification {
        let kinds = source.kinds();
        let classification = classifier::classify(&kinds);
        if classification.trailing_ambient {
            log::warn!(
                "'{}': classified {} leading parameter(s) as hidden, but the next parameter is also a session object ({}). It will be shown to the user.",
                source.name(),
                classification.hidden,
                kinds
                    .get(classification.hidden)
                    .map(ParamKind::as_str)
                    .unwrap_or_default()
            );
        }

        self.params.extend(
            source
                .params()
                .iter()
                .enumerate()
                .map(|(i, def)| Param::new(def.clone(), i < classification.hidden)),
        );
        self.boundaries.push(self.params.len());
        self.macro_slices.push(source.is_macro());
        self.invalidate_names();

        log::debug!(
            "Inserted {} parameter(s) of '{}' at position {} ({} hidden).",
            kinds.len(),
            source.name(),
            self.operation_count() - 1,
            classification.hidden
        );
        classification
    }

    /// Removes the whole slice of the operation at `position`, shifting later slices.
    pub fn remove_params_of(&mut self, position: usize) -> Result<Vec<Param>, RegistryError> {
        let range = self.range_for(position)?;
        let removed_len = range.len();
        let removed: Vec<Param> = self.params.drain(range).collect();

        self.boundaries.remove(position + 1);
        for boundary in self.boundaries.iter_mut().skip(position + 1) {
            *boundary -= removed_len;
        }
        self.macro_slices.remove(position);
        self.invalidate_names();

        log::debug!(
            "Removed {} parameter(s) at position {}.",
            removed.len(),
            position
        );
        Ok(removed)
    }

    fn range_for(&self, position: usize) -> Result<Range<usize>, RegistryError> {
        match (
            self.boundaries.get(position),
            self.boundaries.get(position + 1),
        ) {
            (Some(&start), Some(&end)) => Ok(start..end),
            _ => Err(RegistryError::PositionOutOfRange {
                position,
                len: self.operation_count(),
            }),
        }
    }

    /// The parameters owned by the operation at `position`.
    pub fn slice(&self, position: usize) -> Result<&[Param], RegistryError> {
        let range = self.range_for(position)?;
        self.params
            .get(range)
            .ok_or(RegistryError::PositionOutOfRange {
                position,
                len: self.operation_count(),
            })
    }

    pub fn visible_params_for(&self, position: usize) -> Result<Vec<&Param>, RegistryError> {
        Ok(self
            .slice(position)?
            .iter()
            .filter(|p| !p.is_hidden())
            .collect())
    }

    pub fn visible_count_for(&self, position: usize) -> Result<usize, RegistryError> {
        Ok(self.slice(position)?.iter().filter(|p| !p.is_hidden()).count())
    }

    pub fn visible_defaults_for(
        &self,
        position: usize,
    ) -> Result<Vec<Option<ParamValue>>, RegistryError> {
        Ok(self
            .visible_params_for(position)?
            .into_iter()
            .map(|p| p.default.clone())
            .collect())
    }

    pub fn visible_values_for(
        &self,
        position: usize,
    ) -> Result<Vec<Option<ParamValue>>, RegistryError> {
        Ok(self
            .visible_params_for(position)?
            .into_iter()
            .map(|p| p.value.clone())
            .collect())
    }

    pub fn defers_for(&self, position: usize) -> Result<Vec<bool>, RegistryError> {
        Ok(self
            .visible_params_for(position)?
            .into_iter()
            .map(|p| p.is_deferred)
            .collect())
    }

    /// Whether the operation at `position` was inserted from a macro.
    pub fn is_macro_slice(&self, position: usize) -> Result<bool, RegistryError> {
        self.macro_slices
            .get(position)
            .copied()
            .ok_or(RegistryError::PositionOutOfRange {
                position,
                len: self.operation_count(),
            })
    }

    /// Hidden parameters of the operation at `position` that are not the run mode.
    pub fn nonrunmode_hidden_count(&self, position: usize) -> Result<usize, RegistryError> {
        let kinds: Vec<ParamKind> = self.slice(position)?.iter().map(Param::kind).collect();
        Ok(classifier::count_nonrunmode_hidden_params(&kinds))
    }

    /// Stores the user's values and defer flags for the visible parameters of one
    /// operation. Nothing is written unless both lists match the visible count.
    pub fn preset(
        &mut self,
        position: usize,
        values: Vec<ParamValue>,
        defers: &[bool],
    ) -> Result<(), RegistryError> {
        let expected = self.visible_count_for(position)?;
        if values.len() != defers.len() || values.len() != expected {
            return Err(RegistryError::ArityMismatch {
                position,
                expected,
                values: values.len(),
                defers: defers.len(),
            });
        }
        log::trace!(
            "Preset position {} with {} value(s), defers {:?}",
            position,
            values.len(),
            defers
        );

        let range = self.range_for(position)?;
        let visible = self
            .params
            .get_mut(range)
            .into_iter()
            .flatten()
            .filter(|p| !p.hidden);
        for ((param, value), deferred) in visible.zip(values).zip(defers) {
            param.value = Some(value);
            param.is_deferred = *deferred;
        }
        Ok(())
    }

    fn invalidate_names(&mut self) {
        if self.names_assigned {
            log::debug!("Sequence changed; unique parameter names discarded.");
        }
        self.names_assigned = false;
        for param in &mut self.params {
            param.unique_name = None;
        }
    }

    pub fn names_assigned(&self) -> bool {
        self.names_assigned
    }

    /// Gives every parameter a name that is unique across the whole sequence and
    /// usable as an identifier in generated code.
    ///
    /// A repeated name gets the suffix `_k`, where `k` counts its earlier uses.
    /// Synthesized names are registered too, so a later parameter that really is
    /// called `n_1` becomes `n_1_1` instead of clashing:
    ///
    /// `n, n, n, n_1` => `n, n_1, n_2, n_1_1`
    /// `n_1, n, n_1` => `n_1, n, n_1_1`
    pub fn uniquify_names(&mut self) {
        let mut uses: HashMap<String, usize> = HashMap::new();

        for param in &mut self.params {
            let base = normalize_identifier(&param.def.name);

            let unique_name = match uses.get(&base).copied() {
                None => base,
                Some(mut suffix) => {
                    let mut candidate = format!("{}_{}", base, suffix);
                    // A synthesized name can still equal one seen earlier.
                    while uses.contains_key(&candidate) {
                        suffix += 1;
                        candidate = format!("{}_{}", base, suffix);
                    }
                    uses.insert(base, suffix + 1);
                    candidate
                }
            };
            uses.entry(unique_name.clone()).or_insert(1);
            param.unique_name = Some(unique_name);
        }
        self.names_assigned = true;
    }

    /// Unique names of every deferred parameter, in sequence order.
    pub fn deferred_unique_names(&self) -> Result<Vec<&str>, RegistryError> {
        if !self.names_assigned {
            return Err(RegistryError::NamesNotAssigned);
        }
        Ok(self
            .params
            .iter()
            .filter(|p| p.is_deferred)
            .filter_map(Param::unique_name)
            .collect())
    }

    /// Whether any operation takes the image right after its run-mode parameter.
    /// If so, the wrapper must itself take an image.
    pub fn is_take_image(&self) -> bool {
        (0..self.operation_count()).any(|position| {
            self.slice(position).is_ok_and(|params| {
                params.first().is_some_and(|p| p.kind() == ParamKind::RunMode)
                    && params.get(1).is_some_and(|p| p.kind() == ParamKind::Image)
            })
        })
    }

    /// Whether any operation has parameters the user can see and enter.
    pub fn has_user_enterable_params(&self) -> bool {
        self.params.iter().any(|p| !p.is_hidden())
    }

    /// Whether any visible parameter names a session object, or any operation is a
    /// macro (macros reach session objects internally).
    pub fn has_ephemeral_params(&self) -> bool {
        self.params
            .iter()
            .any(|p| !p.is_hidden() && p.is_ephemeral())
            || self.macro_slices.iter().any(|m| *m)
    }
}

/// Turns a declared parameter name into a safe identifier.
fn normalize_identifier(name: &str) -> String {
    let replaced = UNSAFE_IDENT_CHARS_RE.replace_all(name, "_");
    if replaced.is_empty() {
        return "param".to_string();
    }
    if replaced.starts_with(|c: char| c.is_ascii_digit()) {
        return format!("_{}", replaced);
    }
    replaced.into_owned()
}
