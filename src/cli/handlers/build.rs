// src/cli/handlers/build.rs

use crate::{
    cli::{args::BuildArgs, form, handlers::commons},
    core::{
        catalog_tree,
        path_tree::PathTree,
        sequence::{Sequence, SpecError, Specification, WrappingMetadata},
    },
};
use anyhow::Result;
use clap::Parser;
use colored::*;
use dialoguer::{Confirm, FuzzySelect, Input, Select, theme::ColorfulTheme};

/// A selectable catalog entry: what the picker shows and the operation it appends.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Choice {
    label: String,
    operation: String,
}

/// The main handler for the `build` command.
/// Runs an interactive session that ends by writing the finalized specification.
pub fn handle(args: Vec<String>) -> Result<()> {
    let build_args = BuildArgs::try_parse_from(&args)?;
    let (config, library) = commons::load_library()?;

    let (tree, report) = catalog_tree::build_catalog_tree(&library);
    commons::print_tree_warnings(&report);
    let choices = leaf_choices(&tree);

    let mut spec = Specification::new(library);
    if let Some(name) = build_args.name {
        spec.metadata.name = name;
    }

    let theme = ColorfulTheme::default();
    loop {
        print_sequence(&spec.sequence);

        let actions = [
            t!("build.action.add"),
            t!("build.action.edit"),
            t!("build.action.remove"),
            t!("build.action.finish"),
            t!("build.action.cancel"),
        ];
        let selection = Select::with_theme(&theme)
            .with_prompt(t!("build.prompt.action"))
            .items(&actions)
            .default(0)
            .interact_opt()?;

        match selection {
            Some(0) => add_operation(&mut spec.sequence, &choices, &theme)?,
            Some(1) => edit_operation(&mut spec.sequence, &theme)?,
            Some(2) => remove_operation(&mut spec.sequence, &theme)?,
            Some(3) => {
                let metadata = prompt_metadata(&spec.metadata, &theme)?;
                match apply_metadata(&mut spec, metadata) {
                    Ok(()) => {
                        commons::finalize_and_write(spec, build_args.output, &config)?;
                        return Ok(());
                    }
                    Err(e) => println!("{}", format!("Error: {}", e).red()),
                }
            }
            _ => {
                if spec.sequence.is_empty() || confirm_cancel(&theme)? {
                    println!("{}", t!("build.cancelled").yellow());
                    return Ok(());
                }
            }
        }
    }
}

/// Every leaf of the tree, labelled with its path and operation name.
fn leaf_choices(tree: &PathTree) -> Vec<Choice> {
    tree.walk()
        .into_iter()
        .filter_map(|(id, _)| {
            tree.leaf(id).map(|leaf| Choice {
                label: format!("{}  [{}]", tree.path_string(id), leaf.id),
                operation: leaf.id.clone(),
            })
        })
        .collect()
}

fn print_sequence(sequence: &Sequence) {
    println!("\n--- {} ---", t!("build.header.sequence").yellow());
    if sequence.is_empty() {
        println!("  {}", t!("build.sequence.empty").dimmed());
        return;
    }
    for operation in sequence.operations() {
        let values: Vec<String> = sequence
            .visible_params_for(operation.position)
            .unwrap_or_default()
            .into_iter()
            .map(|p| {
                let value = p
                    .value()
                    .map(|v| v.to_literal())
                    .unwrap_or_else(|| "?".to_string());
                if p.is_deferred() {
                    format!("{}={}*", p.name(), value)
                } else {
                    format!("{}={}", p.name(), value)
                }
            })
            .collect();
        println!(
            "  {}. {} {}",
            operation.position,
            operation.name.cyan(),
            values.join(", ").dimmed()
        );
    }
}

fn add_operation(sequence: &mut Sequence, choices: &[Choice], theme: &ColorfulTheme) -> Result<()> {
    let labels: Vec<&str> = choices.iter().map(|c| c.label.as_str()).collect();
    let picked = FuzzySelect::with_theme(theme)
        .with_prompt(t!("build.prompt.pick"))
        .items(&labels)
        .interact_opt()?;
    let Some(choice) = picked.and_then(|i| choices.get(i)) else {
        return Ok(());
    };

    let position = sequence.append(&choice.operation)?;
    if let Err(e) = form::prompt_operation(sequence, position) {
        // The operation cannot be used without its values.
        sequence.remove(position)?;
        println!("{}", format!("Error: {}", e).red());
    }
    Ok(())
}

fn pick_position(sequence: &Sequence, theme: &ColorfulTheme, prompt: &str) -> Result<Option<usize>> {
    if sequence.is_empty() {
        println!("{}", t!("build.sequence.empty").dimmed());
        return Ok(None);
    }
    let items: Vec<String> = sequence
        .operations()
        .iter()
        .map(|op| format!("{}. {}", op.position, op.name))
        .collect();
    Ok(Select::with_theme(theme)
        .with_prompt(prompt)
        .items(&items)
        .default(0)
        .interact_opt()?)
}

fn edit_operation(sequence: &mut Sequence, theme: &ColorfulTheme) -> Result<()> {
    let Some(position) = pick_position(sequence, theme, t!("build.prompt.edit"))? else {
        return Ok(());
    };
    if let Err(e) = form::prompt_operation(sequence, position) {
        println!("{}", format!("Error: {}", e).red());
    }
    let current = sequence
        .operation(position)
        .is_some_and(|op| op.use_last_values);
    let use_last_values = Confirm::with_theme(theme)
        .with_prompt(t!("build.prompt.use_last_values"))
        .default(current)
        .interact()?;
    sequence.set_use_last_values(position, use_last_values)?;
    Ok(())
}

fn remove_operation(sequence: &mut Sequence, theme: &ColorfulTheme) -> Result<()> {
    if let Some(position) = pick_position(sequence, theme, t!("build.prompt.remove"))? {
        let removed = sequence.remove(position)?;
        println!("{}", format!(t!("build.removed"), name = removed.name).dimmed());
    }
    Ok(())
}

/// Asks for the wrapper metadata, seeded with what was entered before.
fn prompt_metadata(current: &WrappingMetadata, theme: &ColorfulTheme) -> Result<WrappingMetadata> {
    let name: String = Input::with_theme(theme)
        .with_prompt(t!("build.prompt.name"))
        .default(current.name.clone())
        .allow_empty(true)
        .interact_text()?;
    let name = name.trim().to_string();

    let label: String = Input::with_theme(theme)
        .with_prompt(t!("build.prompt.label"))
        .default(if current.label.is_empty() {
            name.clone()
        } else {
            current.label.clone()
        })
        .allow_empty(true)
        .interact_text()?;

    let description: String = Input::with_theme(theme)
        .with_prompt(t!("build.prompt.description"))
        .default(current.description.clone())
        .allow_empty(true)
        .interact_text()?;

    Ok(WrappingMetadata {
        name,
        label,
        description,
    })
}

/// Stores the metadata in the specification, then checks the finish gate.
/// The metadata is kept even when the gate fails.
fn apply_metadata(spec: &mut Specification, metadata: WrappingMetadata) -> Result<(), SpecError> {
    spec.metadata = metadata;
    spec.check_complete()
}

fn confirm_cancel(theme: &ColorfulTheme) -> Result<bool> {
    Ok(Confirm::with_theme(theme)
        .with_prompt(t!("build.prompt.confirm_cancel"))
        .default(false)
        .interact()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        catalog::{Catalog, Library},
        macros::MacroTable,
        path_tree::Leaf,
    };

    #[test]
    fn test_leaf_choices_follow_tree_order() {
        let mut tree = PathTree::new();
        tree.insert("Filters/Blur/Gaussian Blur...", Leaf::new("plug-in-gauss", ""))
            .unwrap();
        tree.insert("Edit/Fill", Leaf::new("gimp-edit-fill", "")).unwrap();

        let choices = leaf_choices(&tree);

        assert_eq!(
            choices,
            vec![
                Choice {
                    label: "Edit/Fill  [gimp-edit-fill]".to_string(),
                    operation: "gimp-edit-fill".to_string(),
                },
                Choice {
                    label: "Filters/Blur/Gaussian Blur...  [plug-in-gauss]".to_string(),
                    operation: "plug-in-gauss".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_metadata_survives_a_failed_finish() {
        // --- Setup ---
        let catalog = Catalog::from_toml_str(
            "test",
            r#"
            [procedures.plug-in-blur]
            params = [
                { kind = "run-mode", name = "run-mode" },
                { kind = "float", name = "radius" },
            ]
            "#,
        )
        .unwrap();
        let mut spec = Specification::new(Library::new(catalog, MacroTable::builtin()));
        spec.sequence.append("plug-in-blur").unwrap();
        let metadata = WrappingMetadata {
            name: "soften".to_string(),
            label: "Soften".to_string(),
            description: "Blur once".to_string(),
        };

        // --- Execute ---
        let result = apply_metadata(&mut spec, metadata.clone());

        // --- Assert ---
        assert!(matches!(result, Err(SpecError::MissingValue { .. })));
        assert_eq!(spec.metadata, metadata);
    }
}
