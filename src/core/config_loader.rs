//! # Config Loader
//!
//! Reads the user configuration and assembles the [`Library`] a session works
//! with: the embedded catalog (unless disabled), then each configured catalog
//! file in order, then the file named by `GIMPSCRIPTER_CATALOG`. Later catalogs
//! override earlier procedures with the same name.

use crate::{
    constants::CATALOG_ENV_VAR,
    core::{
        catalog::{Catalog, CatalogError, Library},
        macros::MacroTable,
        paths::{self, PathError},
    },
};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("I/O error while reading config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config '{path}': {source}")]
    TomlParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

fn default_true() -> bool {
    true
}

/// The contents of `config.toml`. Every field is optional.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Extra catalog files, loaded after the embedded catalog.
    #[serde(default)]
    pub catalogs: Vec<String>,
    #[serde(default = "default_true")]
    pub include_default_catalog: bool,
    /// Where `build` and `plan` write their output when no `--output` is given.
    pub output_dir: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalogs: Vec::new(),
            include_default_catalog: true,
            output_dir: None,
        }
    }
}

impl AppConfig {
    pub fn output_dir(&self) -> Result<Option<PathBuf>, ConfigError> {
        self.output_dir
            .as_deref()
            .map(paths::expand_path)
            .transpose()
            .map_err(ConfigError::from)
    }
}

/// Loads the user's configuration from the standard location.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let path = paths::get_config_file_path()?;
    load_config_from(&path)
}

/// Loads a configuration file. A missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        log::debug!(
            "No config file at '{}', using defaults.",
            path.display()
        );
        return Ok(AppConfig::default());
    }
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: AppConfig = toml::from_str(&text).map_err(|source| ConfigError::TomlParse {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("Loaded config from '{}': {:?}", path.display(), config);
    Ok(config)
}

/// The catalog files to load, expanded, in load order.
pub fn catalog_paths(
    config: &AppConfig,
    env_catalog: Option<&str>,
) -> Result<Vec<PathBuf>, ConfigError> {
    config
        .catalogs
        .iter()
        .map(String::as_str)
        .chain(env_catalog.filter(|p| !p.trim().is_empty()))
        .map(|p| paths::expand_path(p).map_err(ConfigError::from))
        .collect()
}

/// Builds the library from the embedded catalog plus the configured catalog files.
pub fn load_library(config: &AppConfig) -> Result<Library, ConfigError> {
    let env_catalog = env::var(CATALOG_ENV_VAR).ok();
    build_library(config, env_catalog.as_deref())
}

pub fn build_library(
    config: &AppConfig,
    env_catalog: Option<&str>,
) -> Result<Library, ConfigError> {
    let mut catalog = if config.include_default_catalog {
        Catalog::embedded()?
    } else {
        Catalog::new()
    };
    for path in catalog_paths(config, env_catalog)? {
        catalog.merge(Catalog::from_file(&path)?);
    }
    log::debug!("Library ready: {} procedures.", catalog.len());
    Ok(Library::new(catalog, MacroTable::builtin()))
}
