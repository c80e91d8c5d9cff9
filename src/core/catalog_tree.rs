// src/core/catalog_tree.rs

use crate::core::{
    catalog::Library,
    path_tree::{Leaf, PathTree, PathTreeError},
};
use std::collections::HashSet;
use thiserror::Error;

/// A problem found while building the selection tree. None of them stop the build.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeWarning {
    #[error(transparent)]
    Rejected(#[from] PathTreeError),
    #[error("Path '{path}' of '{leaf}' has an empty component.")]
    EmptyComponent { path: String, leaf: String },
    #[error("Menu entry '{path}' refers to '{target}', which is neither a procedure nor a macro.")]
    UnknownReference { path: String, target: String },
}

/// Everything noteworthy about one tree build.
#[derive(Debug, Clone, Default)]
pub struct TreeReport {
    pub warnings: Vec<TreeWarning>,
    pub inserted: usize,
}

impl TreeReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    fn push(&mut self, warning: TreeWarning) {
        log::warn!("{}", warning);
        self.warnings.push(warning);
    }
}

/// Builds the selection tree: every catalog procedure at its menu path, then
/// every supplemental menu entry. A menu entry replaces the menu path of the
/// procedure it files. Procedures with neither go under `<Unknown>`.
pub fn build_catalog_tree(library: &Library) -> (PathTree, TreeReport) {
    let mut tree = PathTree::new();
    let mut report = TreeReport::default();

    let filed: HashSet<&str> = library
        .catalog()
        .menu_entries()
        .map(|(_, target)| target)
        .collect();

    for procedure in library.catalog().procedures() {
        if filed.contains(procedure.name.as_str()) {
            continue;
        }
        insert_reporting(
            &mut tree,
            &mut report,
            &procedure.menupath,
            Leaf::new(&procedure.name, &procedure.blurb),
        );
    }

    for (path, target) in library.catalog().menu_entries() {
        match library.source(target) {
            Ok(source) => insert_reporting(
                &mut tree,
                &mut report,
                path,
                Leaf::new(target, source.blurb()),
            ),
            Err(_) => report.push(TreeWarning::UnknownReference {
                path: path.to_string(),
                target: target.to_string(),
            }),
        }
    }

    log::debug!(
        "Catalog tree built: {} leaves, {} nodes, {} warning(s).",
        report.inserted,
        tree.len(),
        report.warnings.len()
    );
    (tree, report)
}

fn insert_reporting(tree: &mut PathTree, report: &mut TreeReport, path: &str, leaf: Leaf) {
    let leaf_id = leaf.id.clone();
    match tree.insert(path, leaf) {
        Ok(inserted) => {
            report.inserted += 1;
            if inserted.empty_components {
                report.push(TreeWarning::EmptyComponent {
                    path: path.to_string(),
                    leaf: leaf_id,
                });
            }
        }
        Err(e) => report.push(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        constants::UNKNOWN_PATH_STRING,
        core::{catalog::Catalog, macros::MacroTable},
    };

    const CATALOG: &str = r#"
        [procedures.plug-in-gauss]
        blurb = "Gaussian blur"
        menupath = "<Image>/Filters/Blur/Gaussian Blur..."

        [procedures.plug-in-other-gauss]
        menupath = "<Image>/Filters/Blur/Gaussian Blur..."

        [procedures.gimp-image-flatten]
        blurb = "Flatten all visible layers"

        [procedures.gimp-lonely]
        blurb = "Not filed anywhere"

        [procedures.gimp-odd]
        menupath = "<Image>/Odd//Thing"

        [menu]
        "Image/Flatten Image" = "gimp-image-flatten"
        "Channel/New" = "macro-channel-new"
        "Layer/Vanish" = "gimp-no-such-procedure"
    "#;

    #[test]
    fn test_build_reports_without_failing() {
        // --- Setup ---
        let catalog = Catalog::from_toml_str("test", CATALOG).unwrap();
        let library = Library::new(catalog, MacroTable::builtin());

        // --- Execute ---
        let (tree, report) = build_catalog_tree(&library);

        // --- Assert ---
        // gauss, lonely, odd, flatten and the macro; the second gauss collides.
        assert_eq!(report.inserted, 5);
        assert_eq!(tree.leaf_count(), 5);
        assert_eq!(report.warnings.len(), 3);

        assert!(report.warnings.contains(&TreeWarning::Rejected(
            PathTreeError::Collision {
                path: "Filters/Blur/Gaussian Blur...".to_string(),
                existing: "plug-in-gauss".to_string(),
                rejected: "plug-in-other-gauss".to_string(),
            }
        )));
        assert!(report.warnings.contains(&TreeWarning::EmptyComponent {
            path: "Odd//Thing".to_string(),
            leaf: "gimp-odd".to_string(),
        }));
        assert!(report.warnings.contains(&TreeWarning::UnknownReference {
            path: "Layer/Vanish".to_string(),
            target: "gimp-no-such-procedure".to_string(),
        }));
        assert!(!report.is_clean());
    }

    #[test]
    fn test_build_places_leaves() {
        let catalog = Catalog::from_toml_str("test", CATALOG).unwrap();
        let library = Library::new(catalog, MacroTable::builtin());
        let (tree, _) = build_catalog_tree(&library);

        let gauss = tree.find("Filters/Blur/Gaussian Blur...").unwrap();
        assert_eq!(tree.leaf(gauss).unwrap().blurb, "Gaussian blur");

        let unplaced = tree
            .find(&format!("{}/gimp-lonely", UNKNOWN_PATH_STRING))
            .unwrap();
        assert_eq!(tree.leaf(unplaced).unwrap().id, "gimp-lonely");
        // Filed by a menu entry, so not listed as unplaced.
        assert!(tree
            .find(&format!("{}/gimp-image-flatten", UNKNOWN_PATH_STRING))
            .is_none());
        let flatten = tree.find("Image/Flatten Image").unwrap();
        assert_eq!(tree.leaf(flatten).unwrap().blurb, "Flatten all visible layers");

        let channel_new = tree.find("Channel/New").unwrap();
        assert_eq!(tree.leaf(channel_new).unwrap().id, "macro-channel-new");
        assert!(tree.find("Layer/Vanish").is_none());
    }

    #[test]
    fn test_embedded_catalog_tree_is_clean() {
        let library = Library::embedded().unwrap();
        let (tree, report) = build_catalog_tree(&library);
        // No collisions, empty components or dangling menu entries.
        assert!(report.is_clean(), "{:?}", report.warnings);
        assert!(tree.leaf_count() > 20);
    }

    #[test]
    fn test_menu_entry_replaces_own_menu_path() {
        // --- Setup ---
        let catalog = Catalog::from_toml_str(
            "test",
            r#"
            [procedures.plug-in-sharpen]
            menupath = "<Image>/Filters/Enhance/Sharpen..."

            [menu]
            "Filters/Sharpen..." = "plug-in-sharpen"
            "#,
        )
        .unwrap();
        let library = Library::new(catalog, MacroTable::builtin());

        // --- Execute ---
        let (tree, report) = build_catalog_tree(&library);

        // --- Assert ---
        assert!(report.is_clean());
        assert_eq!(tree.leaf_count(), 1);
        assert!(tree.find("Filters/Sharpen...").is_some());
        assert!(tree.find("Filters/Enhance/Sharpen...").is_none());
        assert_eq!(library.path_of("plug-in-sharpen").as_deref(), Some("Filters/Sharpen..."));
    }
}
