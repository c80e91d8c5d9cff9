// src/core/graph_display.rs

use crate::core::path_tree::{Leaf, NodeId, PathTree};
use colored::Colorize;
use std::collections::HashSet;

/// Controls what `display_catalog_tree` prints.
#[derive(Debug, Clone, Default)]
pub struct DisplayOptions {
    /// Only show leaves whose path contains this text (case-insensitive), with their ancestors.
    pub filter: Option<String>,
    /// Children of the root have depth 0.
    pub max_depth: Option<usize>,
    pub show_blurbs: bool,
}

/// One rendered row of the tree, before coloring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeLine<'a> {
    pub prefix: String,
    pub label: &'a str,
    pub leaf: Option<&'a Leaf>,
}

/// Displays an ASCII tree of the catalog.
pub fn display_catalog_tree(tree: &PathTree, options: &DisplayOptions) {
    let lines = render_catalog_tree(tree, options);
    if lines.is_empty() {
        println!("\n{}", t!("tree.empty"));
        return;
    }
    for line in lines {
        match line.leaf {
            Some(leaf) => {
                let mut row = format!("{}{} {}", line.prefix, line.label, format!("[{}]", leaf.id).cyan());
                if options.show_blurbs && !leaf.blurb.is_empty() {
                    row.push_str(&format!("  {}", leaf.blurb.dimmed()));
                }
                println!("{}", row);
            }
            None => println!("{}{}", line.prefix, line.label.bold()),
        }
    }
}

/// Lays out the tree as rows with box-drawing prefixes.
pub fn render_catalog_tree<'a>(tree: &'a PathTree, options: &DisplayOptions) -> Vec<TreeLine<'a>> {
    let visible = options
        .filter
        .as_deref()
        .map(|text| matching_nodes(tree, text));

    let mut lines = Vec::new();
    let roots = visible_children(tree, tree.root(), visible.as_ref());
    let count = roots.len();
    for (i, id) in roots.into_iter().enumerate() {
        render_node(tree, id, "", i + 1 == count, 0, options, visible.as_ref(), &mut lines);
    }
    lines
}

/// Leaves whose path contains `text`, plus all of their ancestors.
fn matching_nodes(tree: &PathTree, text: &str) -> HashSet<NodeId> {
    let needle = text.to_lowercase();
    let mut visible = HashSet::new();
    for (id, _) in tree.walk() {
        if tree.leaf(id).is_none() {
            continue;
        }
        let leaf_matches = tree.path_string(id).to_lowercase().contains(&needle)
            || tree
                .leaf(id)
                .is_some_and(|leaf| leaf.id.to_lowercase().contains(&needle));
        if leaf_matches {
            let mut current = Some(id);
            while let Some(node) = current {
                if !visible.insert(node) {
                    break;
                }
                current = tree.parent(node);
            }
        }
    }
    visible
}

fn visible_children(tree: &PathTree, id: NodeId, visible: Option<&HashSet<NodeId>>) -> Vec<NodeId> {
    tree.children(id)
        .into_iter()
        .filter(|c| visible.is_none_or(|set| set.contains(c)))
        .collect()
}

/// Recursive function to lay out a tree node and its descendants.
fn render_node<'a>(
    tree: &'a PathTree,
    id: NodeId,
    prefix: &str,
    is_last: bool,
    depth: usize,
    options: &DisplayOptions,
    visible: Option<&HashSet<NodeId>>,
    lines: &mut Vec<TreeLine<'a>>,
) {
    let connector = if is_last { "└─" } else { "├─" };
    lines.push(TreeLine {
        prefix: format!("{}{}", prefix, connector),
        label: tree.label(id).unwrap_or_default(),
        leaf: tree.leaf(id),
    });

    if options.max_depth.is_some_and(|max| depth >= max) {
        return;
    }

    // Prepare the prefix for the children of this node
    let child_prefix = format!("{}{}", prefix, if is_last { "   " } else { "│  " });
    let children = visible_children(tree, id, visible);
    let count = children.len();
    for (i, child) in children.into_iter().enumerate() {
        render_node(tree, child, &child_prefix, i + 1 == count, depth + 1, options, visible, lines);
    }
}
