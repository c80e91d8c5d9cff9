// src/cli/args.rs
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true)] // The command name is consumed by the dispatcher.
pub struct BuildArgs {
    /// Where to write the finalized specification. Defaults to stdout, or to
    /// `<output_dir>/<name>.json` when `output_dir` is configured.
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// The name of the wrapper plugin. If not provided, will be asked at the end.
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true)]
pub struct PlanArgs {
    /// The plan file describing the sequence.
    pub file: PathBuf,

    /// Where to write the finalized specification. Defaults to stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true)]
pub struct ShowArgs {
    /// The procedure or macro to describe.
    pub operation: String,
}
