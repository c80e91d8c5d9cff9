// src/cli/handlers/check.rs

use crate::{
    cli::handlers::commons,
    core::{
        catalog::Library,
        catalog_tree::{self, TreeReport},
        classifier,
        macros::MacroError,
    },
};
use anyhow::{Result, anyhow};
use clap::Parser;
use colored::*;

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Validates the configured catalogs and the built-in macros."
)]
struct CheckArgs {}

/// Everything `check` found in a library.
#[derive(Debug, Default)]
pub struct CheckReport {
    pub macro_problems: Vec<MacroError>,
    pub tree: TreeReport,
    /// Procedures whose hidden-parameter scan ended on another ambient parameter.
    pub trailing_ambient: Vec<String>,
}

impl CheckReport {
    /// Trailing-ambient procedures are only noted; they do not fail the check.
    pub fn has_errors(&self) -> bool {
        !self.macro_problems.is_empty() || !self.tree.is_clean()
    }
}

pub fn check_library(library: &Library) -> CheckReport {
    let (_, tree) = catalog_tree::build_catalog_tree(library);
    let trailing_ambient = library
        .catalog()
        .procedures()
        .filter(|p| {
            let kinds: Vec<_> = p.params.iter().map(|d| d.kind).collect();
            classifier::classify(&kinds).trailing_ambient
        })
        .map(|p| p.name.clone())
        .collect();

    CheckReport {
        macro_problems: library.macros().validate(),
        tree,
        trailing_ambient,
    }
}

pub fn handle(args: Vec<String>) -> Result<()> {
    CheckArgs::try_parse_from(&args)?;
    let (_, library) = commons::load_library()?;

    println!(
        "\n{}",
        format!(
            t!("check.header"),
            procedures = library.catalog().len(),
            macros = library.macros().len()
        )
        .yellow()
    );

    let report = check_library(&library);

    for problem in &report.macro_problems {
        println!("  {} {}", "✗".red(), problem);
    }
    commons::print_tree_warnings(&report.tree);

    if !report.trailing_ambient.is_empty() {
        println!("\n{}", t!("check.trailing_ambient.header").blue());
        for name in &report.trailing_ambient {
            println!("  - {}", name.cyan());
        }
    }

    if report.has_errors() {
        return Err(anyhow!(
            t!("check.error.failed"),
            count = report.macro_problems.len() + report.tree.warnings.len()
        ));
    }
    println!("\n{}", t!("check.success").green());
    Ok(())
}
