// src/cli/handlers/show.rs

use crate::{
    cli::{args::ShowArgs, handlers::commons},
    core::{
        catalog::{Library, ParamSource},
        classifier,
    },
};
use anyhow::Result;
use clap::Parser;
use colored::*;

/// The main handler for the `show` command.
/// Describes one operation and how its parameters are classified.
pub fn handle(args: Vec<String>) -> Result<()> {
    let show_args = ShowArgs::try_parse_from(&args)?;
    let (_, library) = commons::load_library()?;
    let source = library.source(&show_args.operation)?;

    print_metadata(&library, &source);
    print_params(&source);
    if let ParamSource::Macro(def) = source {
        println!("\n  {}:", t!("show.label.template").blue());
        for line in def.template.lines() {
            println!("    {}", line.dimmed());
        }
    }
    println!("\n---------------------------------");
    Ok(())
}

fn print_metadata(library: &Library, source: &ParamSource<'_>) {
    println!("\n--- {} '{}' ---", t!("show.header"), source.name().yellow());

    let kind = if source.is_macro() {
        t!("show.kind.macro")
    } else {
        t!("show.kind.procedure")
    };
    println!("  {:<12} {}", t!("show.label.kind").blue(), kind);
    if !source.blurb().is_empty() {
        println!("  {:<12} {}", t!("show.label.blurb").blue(), source.blurb());
    }
    let path = library
        .path_of(source.name())
        .unwrap_or_else(|| t!("show.value.no_path").to_string());
    println!("  {:<12} {}", t!("show.label.path").blue(), path);

    if let ParamSource::Native(def) = source {
        if let Some(help) = def.help.as_deref().filter(|h| !h.is_empty()) {
            println!("  {:<12} {}", t!("show.label.help").blue(), help);
        }
        if !def.imagetype.is_empty() {
            println!("  {:<12} {}", t!("show.label.imagetype").blue(), def.imagetype);
        }
    }
}

fn print_params(source: &ParamSource<'_>) {
    let kinds = source.kinds();
    let classification = classifier::classify(&kinds);

    println!(
        "\n  {}:",
        format!(
            t!("show.label.params"),
            total = kinds.len(),
            hidden = classification.hidden
        )
        .blue()
    );
    if kinds.is_empty() {
        println!("    {}", t!("show.value.no_params").dimmed());
    }
    for (i, param) in source.params().iter().enumerate() {
        let hidden = i < classification.hidden;
        let marker = if hidden {
            t!("show.marker.hidden").dimmed()
        } else {
            t!("show.marker.visible").green()
        };
        let default = if hidden {
            String::new()
        } else {
            param
                .kind
                .canonical_default()
                .map(|d| format!(" = {}", d.to_literal()))
                .unwrap_or_default()
        };
        println!(
            "    {:>2}. {} {} {}{}",
            i,
            marker,
            param.name.cyan(),
            format!("({})", param.kind).dimmed(),
            default
        );
        if !param.desc.is_empty() {
            println!("        {}", param.desc.dimmed());
        }
    }

    if classification.trailing_ambient {
        println!(
            "\n  {}",
            t!("show.warning.trailing_ambient").yellow()
        );
    }
    if source.is_macro() || classification.nonrunmode_hidden > 0 {
        println!("  {}", t!("show.note.needs_session").dimmed());
    }
}
