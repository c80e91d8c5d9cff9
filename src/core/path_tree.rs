// src/core/path_tree.rs

//! # Path Tree
//!
//! A trie of slash-delimited category paths. Each node may carry one leaf (a
//! selectable operation). Nodes live in an arena and refer to each other by
//! [`NodeId`], with children ordered by label.

use crate::constants::{PATH_SEPARATOR, UNKNOWN_PATH_STRING};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathTreeError {
    #[error("Path '{path}' already holds '{existing}'; '{rejected}' was not inserted.")]
    Collision {
        path: String,
        existing: String,
        rejected: String,
    },
    #[error("'{leaf}' is already inserted at '{path}'.")]
    Duplicate { path: String, leaf: String },
    #[error("Cannot insert '{0}' at an empty path.")]
    EmptyPath(String),
}

/// Index of a node in the tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// What a leaf node selects, plus a short text to show beside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    pub id: String,
    pub blurb: String,
}

impl Leaf {
    pub fn new(id: &str, blurb: &str) -> Self {
        Self {
            id: id.to_string(),
            blurb: blurb.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    label: String,
    parent: Option<NodeId>,
    children: BTreeMap<String, NodeId>,
    leaf: Option<Leaf>,
}

impl Node {
    fn new(label: &str, parent: Option<NodeId>) -> Self {
        Self {
            label: label.to_string(),
            parent,
            children: BTreeMap::new(),
            leaf: None,
        }
    }
}

/// A successful insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inserted {
    pub node: NodeId,
    /// The path had empty components (`a//b`). They were kept as labels.
    pub empty_components: bool,
}

#[derive(Debug, Clone)]
pub struct PathTree {
    nodes: Vec<Node>,
}

impl Default for PathTree {
    fn default() -> Self {
        Self::new()
    }
}

impl PathTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new("", None)],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    fn child(&self, id: NodeId, label: &str) -> Option<NodeId> {
        self.node(id)?.children.get(label).copied()
    }

    fn add_child(&mut self, parent: NodeId, label: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(label, Some(parent)));
        if let Some(node) = self.node_mut(parent) {
            node.children.insert(label.to_string(), id);
        }
        id
    }

    /// Inserts `leaf` at `path`.
    ///
    /// The path `<Unknown>` is special: the leaf gets its own child node, labelled
    /// with its id, under the `<Unknown>` node. On `Duplicate` or `Collision` the
    /// tree is left untouched.
    pub fn insert(&mut self, path: &str, leaf: Leaf) -> Result<Inserted, PathTreeError> {
        if path.is_empty() {
            return Err(PathTreeError::EmptyPath(leaf.id));
        }
        let mut components: Vec<&str> = path.split(PATH_SEPARATOR).collect();
        if path == UNKNOWN_PATH_STRING {
            components.push(&leaf.id);
        }
        let empty_components = components.iter().any(|c| c.is_empty());

        // Walk the existing prefix first, so a rejected insert creates nothing.
        let mut current = self.root();
        let mut matched = 0;
        for component in &components {
            match self.child(current, component) {
                Some(next) => {
                    current = next;
                    matched += 1;
                }
                None => break,
            }
        }

        if matched == components.len() {
            if let Some(existing) = self.leaf(current) {
                let full_path = components.join("/");
                return Err(if existing.id == leaf.id {
                    PathTreeError::Duplicate {
                        path: full_path,
                        leaf: leaf.id,
                    }
                } else {
                    PathTreeError::Collision {
                        path: full_path,
                        existing: existing.id.clone(),
                        rejected: leaf.id,
                    }
                });
            }
        }

        for component in components.iter().skip(matched) {
            current = self.add_child(current, component);
        }
        log::trace!("Inserted '{}' at '{}'", leaf.id, path);
        if let Some(node) = self.node_mut(current) {
            node.leaf = Some(leaf);
        }
        Ok(Inserted {
            node: current,
            empty_components,
        })
    }

    /// Finds the node at `path`, if it exists.
    pub fn find(&self, path: &str) -> Option<NodeId> {
        path.split(PATH_SEPARATOR)
            .try_fold(self.root(), |current, component| {
                self.child(current, component)
            })
    }

    pub fn label(&self, id: NodeId) -> Option<&str> {
        self.node(id).map(|n| n.label.as_str())
    }

    pub fn leaf(&self, id: NodeId) -> Option<&Leaf> {
        self.node(id)?.leaf.as_ref()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    /// Children of `id`, ordered by label.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.node(id)
            .map(|n| n.children.values().copied().collect())
            .unwrap_or_default()
    }

    /// Rebuilds the slash-delimited path of a node by walking up to the root.
    pub fn path_string(&self, id: NodeId) -> String {
        let mut labels = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            match self.node(node_id) {
                Some(node) if node.parent.is_some() => {
                    labels.push(node.label.as_str());
                    current = node.parent;
                }
                _ => break,
            }
        }
        labels.reverse();
        labels.join("/")
    }

    /// Number of nodes, including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.leaf.is_some()).count()
    }

    /// Depth-first, label-ordered list of every node below the root with its depth
    /// (children of the root have depth 0).
    pub fn walk(&self) -> Vec<(NodeId, usize)> {
        let mut visited = Vec::new();
        let mut stack: Vec<(NodeId, usize)> = self
            .children(self.root())
            .into_iter()
            .rev()
            .map(|id| (id, 0))
            .collect();
        while let Some((id, depth)) = stack.pop() {
            visited.push((id, depth));
            stack.extend(self.children(id).into_iter().rev().map(|c| (c, depth + 1)));
        }
        visited
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_duplicate_and_collision() {
        // --- Setup ---
        let mut tree = PathTree::new();
        tree.insert("a/b", Leaf::new("x", "")).unwrap();
        let nodes_before = tree.len();

        // --- Execute ---
        let duplicate = tree.insert("a/b", Leaf::new("x", ""));
        let collision = tree.insert("a/b", Leaf::new("y", ""));

        // --- Assert ---
        assert_eq!(
            duplicate,
            Err(PathTreeError::Duplicate {
                path: "a/b".to_string(),
                leaf: "x".to_string()
            })
        );
        assert_eq!(
            collision,
            Err(PathTreeError::Collision {
                path: "a/b".to_string(),
                existing: "x".to_string(),
                rejected: "y".to_string()
            })
        );
        assert_eq!(tree.len(), nodes_before);
        let node = tree.find("a/b").unwrap();
        assert_eq!(tree.leaf(node).unwrap().id, "x");
    }

    #[test]
    fn test_shared_prefix_and_path_string() {
        let mut tree = PathTree::new();
        let gauss = tree
            .insert("Filters/Blur/Gaussian Blur...", Leaf::new("plug-in-gauss", ""))
            .unwrap();
        tree.insert("Filters/Blur/Pixelize...", Leaf::new("plug-in-pixelize", ""))
            .unwrap();
        tree.insert("Filters/Enhance/Unsharp Mask...", Leaf::new("plug-in-unsharp-mask", ""))
            .unwrap();

        // root, Filters, Blur, Enhance and three leaves
        assert_eq!(tree.len(), 7);
        assert_eq!(tree.leaf_count(), 3);
        assert_eq!(tree.path_string(gauss.node), "Filters/Blur/Gaussian Blur...");
        assert!(!gauss.empty_components);

        let blur = tree.find("Filters/Blur").unwrap();
        let labels: Vec<&str> = tree
            .children(blur)
            .into_iter()
            .filter_map(|c| tree.label(c))
            .collect();
        assert_eq!(labels, vec!["Gaussian Blur...", "Pixelize..."]);
        assert!(tree.leaf(blur).is_none());
    }

    #[test]
    fn test_leaf_on_interior_node() {
        let mut tree = PathTree::new();
        tree.insert("Edit/Fill/With Pattern", Leaf::new("p", "")).unwrap();
        // "Edit/Fill" exists as an interior node without a leaf.
        let inserted = tree.insert("Edit/Fill", Leaf::new("fill", "")).unwrap();
        assert_eq!(tree.leaf(inserted.node).unwrap().id, "fill");
        assert_eq!(tree.children(inserted.node).len(), 1);
    }

    #[test]
    fn test_unknown_path_holds_many_leaves() {
        let mut tree = PathTree::new();
        tree.insert(UNKNOWN_PATH_STRING, Leaf::new("gimp-a", "")).unwrap();
        tree.insert(UNKNOWN_PATH_STRING, Leaf::new("gimp-b", "")).unwrap();

        let unknown = tree.find(UNKNOWN_PATH_STRING).unwrap();
        assert_eq!(tree.children(unknown).len(), 2);
        assert!(tree.leaf(unknown).is_none());
        assert_eq!(
            tree.insert(UNKNOWN_PATH_STRING, Leaf::new("gimp-a", "")),
            Err(PathTreeError::Duplicate {
                path: "<Unknown>/gimp-a".to_string(),
                leaf: "gimp-a".to_string()
            })
        );
    }

    #[test]
    fn test_empty_components_are_kept() {
        let mut tree = PathTree::new();
        let inserted = tree.insert("a//b", Leaf::new("x", "")).unwrap();
        assert!(inserted.empty_components);
        assert_eq!(tree.path_string(inserted.node), "a//b");
        assert!(tree.find("a//b").is_some());
        assert!(tree.find("a/b").is_none());
    }

    #[test]
    fn test_empty_path_rejected() {
        let mut tree = PathTree::new();
        assert_eq!(
            tree.insert("", Leaf::new("x", "")),
            Err(PathTreeError::EmptyPath("x".to_string()))
        );
        assert!(tree.is_empty());
    }

    #[test]
    fn test_walk_is_depth_first_and_ordered() {
        let mut tree = PathTree::new();
        tree.insert("b/y", Leaf::new("by", "")).unwrap();
        tree.insert("a/z", Leaf::new("az", "")).unwrap();
        tree.insert("a/x", Leaf::new("ax", "")).unwrap();

        let walked: Vec<(String, usize)> = tree
            .walk()
            .into_iter()
            .map(|(id, depth)| (tree.path_string(id), depth))
            .collect();
        assert_eq!(
            walked,
            vec![
                ("a".to_string(), 0),
                ("a/x".to_string(), 1),
                ("a/z".to_string(), 1),
                ("b".to_string(), 0),
                ("b/y".to_string(), 1),
            ]
        );
    }
}
