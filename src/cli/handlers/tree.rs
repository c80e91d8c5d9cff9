use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use crate::{
    cli::handlers::commons,
    core::{
        catalog_tree,
        graph_display::{self, DisplayOptions},
    },
};

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Displays the catalog of procedures and macros as a tree."
)]
struct TreeArgs {
    /// Only show entries whose path or name contains this text.
    #[arg(long, short)]
    filter: Option<String>,

    /// Limit the depth of the tree display.
    #[arg(long, short)]
    depth: Option<usize>,

    /// Show the short description of each entry.
    #[arg(long, short)]
    blurbs: bool,
}

pub fn handle(args: Vec<String>) -> Result<()> {
    // 1. Parse this handler's specific arguments.
    let tree_args = TreeArgs::try_parse_from(&args)?;

    // 2. Build the tree from the configured catalogs.
    let (_, library) = commons::load_library()?;
    let (tree, report) = catalog_tree::build_catalog_tree(&library);

    let header = match &tree_args.filter {
        Some(filter) => format!(t!("tree.header.filtered"), filter = filter.cyan()),
        None => format!(t!("tree.header.full"), count = report.inserted),
    };

    // 3. Delegate to the display module for rendering.
    let display_options = DisplayOptions {
        filter: tree_args.filter,
        max_depth: tree_args.depth,
        show_blurbs: tree_args.blurbs,
    };
    println!("\n{}", header);
    graph_display::display_catalog_tree(&tree, &display_options);

    commons::print_tree_warnings(&report);
    Ok(())
}
