// src/core/sequence.rs

//! # Sequence and Specification
//!
//! A [`Sequence`] is the ordered list of chosen operations together with the
//! registry of their parameters. A [`Specification`] adds the metadata of the
//! wrapper plugin being built, and [`Specification::finalize`] turns both into
//! the immutable [`FinalizedSpec`] handed to code generation.

use crate::{
    core::{
        catalog::{CatalogError, Library},
        registry::{Param, ParamRegistry, RegistryError},
    },
    models::{ParamKind, ParamValue},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpecError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("Nothing to generate: the sequence has no operations.")]
    NoOperations,
    #[error("The plugin needs a name.")]
    MissingName,
    #[error("Operation {position} ('{operation}') has no value for parameter '{param}'.")]
    MissingValue {
        position: usize,
        operation: String,
        param: String,
    },
}

/// One chosen operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub name: String,
    /// Where the operation is filed in the selection tree.
    pub path: Option<String>,
    pub position: usize,
    pub is_macro: bool,
    /// Run with the values the operation was last run with, instead of the preset ones.
    pub use_last_values: bool,
}

/// The operations of one wrapper, in order, with their parameters.
#[derive(Debug, Clone)]
pub struct Sequence {
    library: Library,
    operations: Vec<Operation>,
    registry: ParamRegistry,
}

impl Sequence {
    pub fn new(library: Library) -> Self {
        Self {
            library,
            operations: Vec::new(),
            registry: ParamRegistry::new(),
        }
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    /// Appends the named operation and returns its position.
    ///
    /// The name is resolved before anything changes, so on error the sequence is
    /// left as it was.
    pub fn append(&mut self, name: &str) -> Result<usize, CatalogError> {
        let source = self.library.source(name)?;
        let position = self.operations.len();

        self.registry.insert_params_of(&source);
        self.operations.push(Operation {
            name: name.to_string(),
            path: self.library.path_of(name),
            position,
            is_macro: source.is_macro(),
            use_last_values: false,
        });
        log::debug!("Appended '{}' at position {}", name, position);
        Ok(position)
    }

    /// Removes the operation at `position` and its parameters.
    pub fn remove(&mut self, position: usize) -> Result<Operation, RegistryError> {
        self.registry.remove_params_of(position)?;
        let removed = self.operations.remove(position);
        for operation in self.operations.iter_mut().skip(position) {
            operation.position -= 1;
        }
        log::debug!("Removed '{}' from position {}", removed.name, position);
        Ok(removed)
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn operation(&self, position: usize) -> Option<&Operation> {
        self.operations.get(position)
    }

    pub fn registry(&self) -> &ParamRegistry {
        &self.registry
    }

    pub fn visible_params_for(&self, position: usize) -> Result<Vec<&Param>, RegistryError> {
        self.registry.visible_params_for(position)
    }

    pub fn visible_defaults_for(
        &self,
        position: usize,
    ) -> Result<Vec<Option<ParamValue>>, RegistryError> {
        self.registry.visible_defaults_for(position)
    }

    pub fn visible_values_for(
        &self,
        position: usize,
    ) -> Result<Vec<Option<ParamValue>>, RegistryError> {
        self.registry.visible_values_for(position)
    }

    pub fn defers_for(&self, position: usize) -> Result<Vec<bool>, RegistryError> {
        self.registry.defers_for(position)
    }

    pub fn preset(
        &mut self,
        position: usize,
        values: Vec<ParamValue>,
        defers: &[bool],
    ) -> Result<(), RegistryError> {
        self.registry.preset(position, values, defers)
    }

    pub fn set_use_last_values(&mut self, position: usize, value: bool) -> Result<(), RegistryError> {
        let len = self.operations.len();
        let operation = self
            .operations
            .get_mut(position)
            .ok_or(RegistryError::PositionOutOfRange { position, len })?;
        operation.use_last_values = value;
        Ok(())
    }

    pub fn is_take_image(&self) -> bool {
        self.registry.is_take_image()
    }

    pub fn has_user_enterable_params(&self) -> bool {
        self.registry.has_user_enterable_params()
    }

    pub fn has_ephemeral_params(&self) -> bool {
        self.registry.has_ephemeral_params()
    }

    pub fn has_macros(&self) -> bool {
        self.operations.iter().any(|op| op.is_macro)
    }

    /// Whether any operation takes session objects as inputs (beyond the run mode).
    pub fn has_in_params(&self) -> bool {
        self.operations.iter().any(|op| {
            op.is_macro
                || self
                    .registry
                    .nonrunmode_hidden_count(op.position)
                    .is_ok_and(|count| count > 0)
        })
    }
}

/// How the generated wrapper presents itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappingMetadata {
    pub name: String,
    /// Menu label. Falls back to the name.
    pub label: String,
    pub description: String,
}

/// A sequence being built into a wrapper plugin.
#[derive(Debug, Clone)]
pub struct Specification {
    pub metadata: WrappingMetadata,
    pub sequence: Sequence,
}

impl Specification {
    pub fn new(library: Library) -> Self {
        Self {
            metadata: WrappingMetadata::default(),
            sequence: Sequence::new(library),
        }
    }

    /// Checks that the specification is complete, without consuming it.
    pub fn check_complete(&self) -> Result<(), SpecError> {
        if self.sequence.is_empty() {
            return Err(SpecError::NoOperations);
        }
        if self.metadata.name.trim().is_empty() {
            return Err(SpecError::MissingName);
        }
        for operation in self.sequence.operations() {
            let missing = self
                .sequence
                .visible_params_for(operation.position)?
                .into_iter()
                .find(|p| !p.is_deferred() && p.value().is_none());
            if let Some(param) = missing {
                return Err(SpecError::MissingValue {
                    position: operation.position,
                    operation: operation.name.clone(),
                    param: param.name().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Closes the specification for editing, assigns unique parameter names and
    /// produces what code generation consumes.
    pub fn finalize(mut self) -> Result<FinalizedSpec, SpecError> {
        self.check_complete()?;
        self.sequence.registry.uniquify_names();

        let sequence = &self.sequence;
        let mut operations = Vec::with_capacity(sequence.len());
        for operation in sequence.operations() {
            let params = sequence
                .registry
                .slice(operation.position)?
                .iter()
                .map(FinalizedParam::from_param)
                .collect();
            operations.push(FinalizedOperation {
                name: operation.name.clone(),
                path: operation.path.clone(),
                is_macro: operation.is_macro,
                use_last_values: operation.use_last_values,
                params,
            });
        }

        let deferred_names = sequence
            .registry
            .deferred_unique_names()?
            .into_iter()
            .map(str::to_string)
            .collect();

        let name = self.metadata.name.trim().to_string();
        let label = if self.metadata.label.trim().is_empty() {
            name.clone()
        } else {
            self.metadata.label.clone()
        };

        log::debug!(
            "Finalized '{}' with {} operation(s).",
            name,
            operations.len()
        );
        Ok(FinalizedSpec {
            name,
            label,
            description: self.metadata.description.clone(),
            is_take_image: sequence.is_take_image(),
            has_user_enterable_params: sequence.has_user_enterable_params(),
            has_ephemeral_params: sequence.has_ephemeral_params(),
            has_macros: sequence.has_macros(),
            has_in_params: sequence.has_in_params(),
            deferred_names,
            operations,
        })
    }
}

// --- HAND-OFF MODELS (What code generation reads) ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizedParam {
    pub unique_name: String,
    pub name: String,
    pub kind: ParamKind,
    pub hidden: bool,
    pub deferred: bool,
    /// The entered value, or the canonical default for a deferred parameter left empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ParamValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub literal: Option<String>,
}

impl FinalizedParam {
    fn from_param(param: &Param) -> Self {
        let value = param
            .value()
            .cloned()
            .or_else(|| param.default().cloned().filter(|_| param.is_deferred()));
        Self {
            unique_name: param.unique_name().unwrap_or(param.name()).to_string(),
            name: param.name().to_string(),
            kind: param.kind(),
            hidden: param.is_hidden(),
            deferred: param.is_deferred(),
            literal: value.as_ref().map(ParamValue::to_literal),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizedOperation {
    pub name: String,
    #[serde(default)]
    pub path: Option<String>,
    pub is_macro: bool,
    pub use_last_values: bool,
    pub params: Vec<FinalizedParam>,
}

/// A complete, immutable specification of one wrapper plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizedSpec {
    pub name: String,
    pub label: String,
    pub description: String,
    pub is_take_image: bool,
    pub has_user_enterable_params: bool,
    pub has_ephemeral_params: bool,
    pub has_macros: bool,
    pub has_in_params: bool,
    /// Unique names of every deferred parameter, in sequence order.
    pub deferred_names: Vec<String>,
    pub operations: Vec<FinalizedOperation>,
}
