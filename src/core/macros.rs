// src/core/macros.rs

//! Built-in macros: named text templates that expand to one or more nested calls
//! of procedures. A macro declares its own formal parameters, referenced from the
//! template as `$name` placeholders. Session objects are referenced inside the
//! template as `ephemera.top(PF_FOO)`, so macros always draw on ambient state.

use crate::models::{ParamDef, ParamKind};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

lazy_static! {
    static ref PLACEHOLDER_RE: Regex =
        Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)").expect("placeholder pattern is valid");
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MacroError {
    #[error("Macro '{macro_name}' references '${placeholder}', which is not one of its parameters.")]
    UnknownPlaceholder {
        macro_name: String,
        placeholder: String,
    },
    #[error("Macro '{macro_name}' declares parameter '{param}' but its template never uses it.")]
    UnusedParameter { macro_name: String, param: String },
}

/// A single macro definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroDef {
    pub name: String,
    /// Code text with `$placeholder` substitutions.
    pub template: String,
    pub params: Vec<ParamDef>,
    pub blurb: String,
}

impl MacroDef {
    pub fn new(name: &str, template: &str, params: Vec<ParamDef>, blurb: &str) -> Self {
        Self {
            name: name.to_string(),
            template: template.to_string(),
            params,
            blurb: blurb.to_string(),
        }
    }

    /// Distinct placeholder names used by the template, in first-use order.
    pub fn placeholders(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        PLACEHOLDER_RE
            .captures_iter(&self.template)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// Checks that placeholders and declared parameters agree.
    pub fn validate(&self) -> Vec<MacroError> {
        let placeholders = self.placeholders();
        let declared: BTreeSet<&str> = self.params.iter().map(|p| p.name.as_str()).collect();

        let mut problems: Vec<MacroError> = placeholders
            .iter()
            .filter(|p| !declared.contains(**p))
            .map(|p| MacroError::UnknownPlaceholder {
                macro_name: self.name.clone(),
                placeholder: p.to_string(),
            })
            .collect();
        problems.extend(
            self.params
                .iter()
                .filter(|p| !placeholders.contains(&p.name.as_str()))
                .map(|p| MacroError::UnusedParameter {
                    macro_name: self.name.clone(),
                    param: p.name.clone(),
                }),
        );
        problems
    }
}

/// The closed, read-only table of macros known to a session.
#[derive(Debug, Clone, Default)]
pub struct MacroTable {
    macros: BTreeMap<String, MacroDef>,
}

impl MacroTable {
    /// Builds a table from definitions. Later definitions replace earlier ones with
    /// the same name.
    pub fn new(defs: impl IntoIterator<Item = MacroDef>) -> Self {
        Self {
            macros: defs.into_iter().map(|d| (d.name.clone(), d)).collect(),
        }
    }

    /// The macros shipped with gimpscripter.
    pub fn builtin() -> Self {
        Self::new(builtin_macros())
    }

    pub fn is_macro(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&MacroDef> {
        self.macros.get(name)
    }

    pub fn parameters_of(&self, name: &str) -> Option<&[ParamDef]> {
        self.macros.get(name).map(|m| m.params.as_slice())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.macros.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MacroDef> {
        self.macros.values()
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }

    /// Validates every macro, returning all problems found.
    pub fn validate(&self) -> Vec<MacroError> {
        self.macros.values().flat_map(MacroDef::validate).collect()
    }
}

fn builtin_macros() -> Vec<MacroDef> {
    vec![
        MacroDef::new(
            "macro-channel-new",
            "pdb.gimp_image_add_channel(ephemera.top(PF_IMAGE), pdb.gimp_channel_new_from_component(ephemera.top(PF_IMAGE), 0, $channelName), 1)",
            vec![ParamDef::new(
                ParamKind::String,
                "channelName",
                "The name to give to the channel",
            )],
            "Create new channel and add it to image.",
        ),
        MacroDef::new(
            "macro-layer-copy",
            "pdb.gimp_layer_copy(ephemera.top(PF_LAYER), $addAlpha)\n  pdb.gimp_displays_flush()",
            vec![ParamDef::new(
                ParamKind::Int32,
                "addAlpha",
                "Add an alpha channel?",
            )],
            "Copy layer and add it to image.",
        ),
        MacroDef::new(
            "macro-layer-new-visible",
            "pdb.gimp_image_add_layer(ephemera.top(PF_IMAGE), pdb.gimp_layer_new_from_visible(ephemera.top(PF_IMAGE), ephemera.top(PF_IMAGE), $layerName), 0)",
            vec![ParamDef::new(ParamKind::String, "layerName", "Layer name")],
            "Create layer from visible and add it to image on top.",
        ),
        MacroDef::new(
            "macro-layer-new-blank-attached",
            "pdb.gimp_image_add_layer(ephemera.top(PF_IMAGE), pdb.gimp_layer_new(ephemera.top(PF_IMAGE), ephemera.top(PF_IMAGE).width, ephemera.top(PF_IMAGE).height, ephemera.top(PF_LAYER).mode, $layerName, 100, 0), 0)",
            vec![ParamDef::new(ParamKind::String, "layerName", "Layer name")],
            "Create blank layer like the image and add it to image on top.",
        ),
        MacroDef::new(
            "macro-display-new",
            "pdb.gimp_display_new(ephemera.top(PF_IMAGE))\n  pdb.gimp_displays_flush()",
            vec![],
            "Create new display from current image and flush it so user can see it.",
        ),
        // The brush parameter is upgraded from a plain string so the generated
        // plugin shows a brush chooser.
        MacroDef::new(
            "macro-context-choose-brush",
            "pdb.gimp_context_set_brush($brush)",
            vec![ParamDef::new(ParamKind::Brush, "brush", "Brush")],
            "Set the context brush, chosen with a brush chooser.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        let table = MacroTable::builtin();
        assert_eq!(table.len(), 6);
        assert!(table.is_macro("macro-channel-new"));
        assert!(!table.is_macro("gimp-edit-fill"));

        let params = table.parameters_of("macro-layer-new-visible").unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].name, "layerName");
        assert_eq!(params[0].kind, ParamKind::String);

        assert_eq!(table.parameters_of("macro-display-new").unwrap().len(), 0);
        assert!(table.parameters_of("nope").is_none());
    }

    #[test]
    fn test_builtin_templates_validate_clean() {
        let problems = MacroTable::builtin().validate();
        assert!(problems.is_empty(), "{:?}", problems);
    }

    #[test]
    fn test_placeholders_deduplicated_in_order() {
        let def = MacroDef::new("m", "f($b, $a, $b)", vec![], "");
        assert_eq!(def.placeholders(), vec!["b", "a"]);
    }

    #[test]
    fn test_validate_reports_both_directions() {
        let def = MacroDef::new(
            "m",
            "f($typo)",
            vec![ParamDef::new(ParamKind::Int32, "amount", "")],
            "",
        );
        let problems = def.validate();
        assert_eq!(problems.len(), 2);
        assert!(matches!(
            &problems[0],
            MacroError::UnknownPlaceholder { placeholder, .. } if placeholder == "typo"
        ));
        assert!(matches!(
            &problems[1],
            MacroError::UnusedParameter { param, .. } if param == "amount"
        ));
    }

    #[test]
    fn test_later_definition_wins() {
        let table = MacroTable::new([
            MacroDef::new("m", "a()", vec![], "first"),
            MacroDef::new("m", "b()", vec![], "second"),
        ]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("m").unwrap().blurb, "second");
    }
}
