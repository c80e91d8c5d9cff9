// src/bin/gimpscripter.rs

use anyhow::Result;
use clap::Parser;
use colored::*;
use gimpscripter::{
    cli::{Cli, handlers},
    t,
};

// --- Command Definition and Registry ---

/// A command, its aliases, and its handler.
struct CommandDefinition {
    name: &'static str,
    aliases: &'static [&'static str],
    handler: fn(Vec<String>) -> Result<()>,
}

/// Every command the binary understands. Adding a command means adding an entry here.
static COMMAND_REGISTRY: &[CommandDefinition] = &[
    CommandDefinition {
        name: "build",
        aliases: &["new"],
        handler: handlers::build::handle,
    },
    CommandDefinition {
        name: "check",
        aliases: &[],
        handler: handlers::check::handle,
    },
    CommandDefinition {
        name: "plan",
        aliases: &[],
        handler: handlers::plan::handle,
    },
    CommandDefinition {
        name: "show",
        aliases: &["info"],
        handler: handlers::show::handle,
    },
    CommandDefinition {
        name: "tree",
        aliases: &["ls"],
        handler: handlers::tree::handle,
    },
];

/// Finds a command definition in the registry by its name or alias.
fn find_command(name: &str) -> Option<&'static CommandDefinition> {
    COMMAND_REGISTRY
        .iter()
        .find(|cmd| cmd.name == name || cmd.aliases.contains(&name))
}

/// Sets up logging, dispatches to the handler and reports any error.
fn main() {
    env_logger::init();

    if let Err(e) = run_cli(Cli::parse()) {
        eprintln!("\n{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run_cli(cli: Cli) -> Result<()> {
    log::debug!("CLI args parsed: {:?}", cli);

    let Some(name) = cli.command else {
        println!("{}", t!("cli.usage"));
        return Ok(());
    };

    match find_command(&name) {
        Some(command) => (command.handler)(cli.args),
        None => Err(anyhow::anyhow!(t!("cli.error.unknown_command"), name = name)),
    }
}
