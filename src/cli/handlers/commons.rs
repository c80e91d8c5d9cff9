// src/cli/handlers/commons.rs

// Shared functions used by multiple handlers.

use anyhow::{Context, Result, anyhow};
use colored::Colorize;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::core::{
    catalog::Library,
    catalog_tree::TreeReport,
    config_loader::{self, AppConfig},
    sequence::{FinalizedSpec, Specification},
};

/// Loads the user configuration and the library it describes.
pub fn load_library() -> Result<(AppConfig, Library)> {
    let config = config_loader::load_config().context(t!("common.error.config"))?;
    let library = config_loader::load_library(&config).context(t!("common.error.library"))?;
    Ok((config, library))
}

/// Decides where a finalized specification goes: the explicit path, else
/// `<output_dir>/<name>.json` when configured, else stdout (`None`).
pub fn resolve_output_path(
    explicit: Option<PathBuf>,
    config: &AppConfig,
    name: &str,
) -> Result<Option<PathBuf>> {
    if explicit.is_some() {
        return Ok(explicit);
    }
    let Some(dir) = config.output_dir()? else {
        return Ok(None);
    };
    if !is_plain_file_stem(name) {
        return Err(anyhow!(t!("common.error.bad_output_name"), name = name));
    }
    Ok(Some(dir.join(format!("{}.json", name))))
}

/// A name that stays inside the output directory when used as a file name.
fn is_plain_file_stem(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && Path::new(name).components().count() == 1
}

/// Finalizes the specification and writes it as JSON.
pub fn finalize_and_write(
    spec: Specification,
    explicit_output: Option<PathBuf>,
    config: &AppConfig,
) -> Result<FinalizedSpec> {
    let finalized = spec.finalize()?;
    let json = serde_json::to_string_pretty(&finalized)?;
    let output = resolve_output_path(explicit_output, config, &finalized.name)?;
    write_output(&json, output.as_deref())?;
    Ok(finalized)
}

pub fn write_output(json: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!(t!("common.error.create_dir"), path = parent.display()))?;
            }
            fs::write(path, json)
                .with_context(|| format!(t!("common.error.write"), path = path.display()))?;
            eprintln!(
                "{}",
                format!(t!("common.success.written"), path = path.display()).green()
            );
        }
        None => println!("{}", json),
    }
    Ok(())
}

/// Prints the non-fatal problems found while building the catalog tree.
pub fn print_tree_warnings(report: &TreeReport) {
    if report.is_clean() {
        return;
    }
    eprintln!(
        "\n{}",
        format!(t!("tree.warnings.header"), count = report.warnings.len()).yellow()
    );
    for warning in &report.warnings {
        eprintln!("  - {}", warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_resolve_output_path_priority() {
        let configured = AppConfig {
            output_dir: Some("/tmp/plugins".to_string()),
            ..AppConfig::default()
        };

        let explicit = resolve_output_path(Some(PathBuf::from("x.json")), &configured, "w").unwrap();
        assert_eq!(explicit, Some(PathBuf::from("x.json")));

        let from_config = resolve_output_path(None, &configured, "wrapper").unwrap();
        assert_eq!(from_config, Some(PathBuf::from("/tmp/plugins/wrapper.json")));

        let stdout = resolve_output_path(None, &AppConfig::default(), "wrapper").unwrap();
        assert_eq!(stdout, None);
    }

    #[test]
    fn test_output_name_cannot_leave_output_dir() {
        let configured = AppConfig {
            output_dir: Some("/tmp/plugins".to_string()),
            ..AppConfig::default()
        };

        for name in ["../x", "a/b", "..", "/etc/wrapper", "a\\b"] {
            assert!(
                resolve_output_path(None, &configured, name).is_err(),
                "accepted {:?}",
                name
            );
        }
        // Stdout and an explicit --output take the name as given.
        assert_eq!(resolve_output_path(None, &AppConfig::default(), "a/b").unwrap(), None);
        assert!(resolve_output_path(Some(PathBuf::from("../x.json")), &configured, "../x").is_ok());
    }

    #[test]
    fn test_write_output_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("spec.json");

        write_output("{}", Some(&path)).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
    }
}
