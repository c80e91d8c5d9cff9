// src/core/paths.rs

use crate::constants::{CONFIG_DIR_NAME, CONFIG_FILENAME};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Could not find system config directory.")]
    ConfigDirNotFound,
    #[error("Failed to expand path '{path}': {message}")]
    Expansion { path: String, message: String },
}

/// Returns the gimpscripter configuration directory (`~/.config/gimpscripter`).
/// The directory is not created; a missing one simply means default settings.
pub fn get_config_dir() -> Result<PathBuf, PathError> {
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME))
        .ok_or(PathError::ConfigDirNotFound)
}

/// Returns the path to the user's `config.toml`.
pub fn get_config_file_path() -> Result<PathBuf, PathError> {
    get_config_dir().map(|dir| dir.join(CONFIG_FILENAME))
}

/// Expands the home directory (`~`) and environment variables (`$VAR`) in a path.
pub fn expand_path(template: &str) -> Result<PathBuf, PathError> {
    let expanded = shellexpand::full(template).map_err(|e| PathError::Expansion {
        path: template.to_string(),
        message: e.to_string(),
    })?;
    Ok(PathBuf::from(expanded.into_owned()))
}
