// src/core/mod.rs

pub mod catalog;
pub mod catalog_tree;
pub mod classifier;
pub mod config_loader;
pub mod graph_display;
pub mod macros;
pub mod path_tree;
pub mod paths;
pub mod registry;
pub mod sequence;
