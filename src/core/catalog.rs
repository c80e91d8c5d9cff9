//! # Catalog
//!
//! The catalog is the set of native procedures an operation can be chosen from,
//! read from TOML documents. Together with the macro table it forms a [`Library`],
//! the immutable handle every session is built on.

use crate::{
    constants::UNKNOWN_PATH_STRING,
    core::macros::{MacroDef, MacroTable},
    models::{CatalogDocument, ParamDef, ParamKind},
};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use thiserror::Error;

/// The catalog compiled into the binary.
const EMBEDDED_CATALOG: &str = include_str!("../../data/catalog.toml");

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("I/O error while reading catalog '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse catalog '{origin}': {source}")]
    TomlParse {
        origin: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Unknown operation '{0}': it is neither a catalog procedure nor a macro.")]
    UnknownOperation(String),
}

/// A native procedure as known to the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedureDef {
    pub name: String,
    pub blurb: String,
    pub help: Option<String>,
    /// Standardized menu path, or `<Unknown>` when the procedure has none.
    pub menupath: String,
    pub imagetype: String,
    pub params: Vec<ParamDef>,
}

/// Removes `<` and `>` from a menu path and strips the implied leading `Image/`.
///
/// `<Image>/Filters/Blur/Gaussian Blur...` becomes `Filters/Blur/Gaussian Blur...`.
pub fn standardize_menu_path(path: &str) -> String {
    let stripped: String = path.chars().filter(|c| *c != '<' && *c != '>').collect();
    match stripped.strip_prefix("Image/") {
        Some(rest) => rest.to_string(),
        None => stripped,
    }
}

/// The native procedures plus the supplemental menu entries.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    procedures: BTreeMap<String, ProcedureDef>,
    menu: BTreeMap<String, String>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses one catalog document. `origin` names it in error messages.
    pub fn from_toml_str(origin: &str, text: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument =
            toml::from_str(text).map_err(|source| CatalogError::TomlParse {
                origin: origin.to_string(),
                source,
            })?;
        Ok(Self::from_document(document))
    }

    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        log::debug!("Reading catalog file '{}'", path.display());
        let text = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&path.display().to_string(), &text)
    }

    /// The catalog shipped inside the binary.
    pub fn embedded() -> Result<Self, CatalogError> {
        Self::from_toml_str("<embedded catalog>", EMBEDDED_CATALOG)
    }

    fn from_document(document: CatalogDocument) -> Self {
        let procedures = document
            .procedures
            .into_iter()
            .map(|(name, doc)| {
                let menupath = doc
                    .menupath
                    .as_deref()
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(standardize_menu_path)
                    .unwrap_or_else(|| UNKNOWN_PATH_STRING.to_string());
                let def = ProcedureDef {
                    name: name.clone(),
                    blurb: doc.blurb,
                    help: doc.help,
                    menupath,
                    imagetype: doc.imagetype.unwrap_or_default(),
                    params: doc.params,
                };
                (name, def)
            })
            .collect();
        Self {
            procedures,
            menu: document.menu,
        }
    }

    /// Merges `other` into this catalog. Entries of `other` replace existing ones.
    pub fn merge(&mut self, other: Self) {
        for (name, def) in other.procedures {
            if self.procedures.contains_key(&name) {
                log::debug!("Catalog procedure '{}' overridden by a later catalog.", name);
            }
            self.procedures.insert(name, def);
        }
        for (path, target) in other.menu {
            if let Some(previous) = self.menu.insert(path.clone(), target) {
                log::debug!("Menu entry '{}' (was '{}') overridden.", path, previous);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&ProcedureDef> {
        self.procedures.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.procedures.contains_key(name)
    }

    pub fn procedures(&self) -> impl Iterator<Item = &ProcedureDef> {
        self.procedures.values()
    }

    /// Supplemental `(tree path, target name)` pairs.
    pub fn menu_entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.menu.iter().map(|(p, t)| (p.as_str(), t.as_str()))
    }

    pub fn len(&self) -> usize {
        self.procedures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.procedures.is_empty()
    }
}

/// Where an operation's formal parameters come from.
///
/// Selected once when an operation is appended; everything downstream queries it
/// through the same methods.
#[derive(Debug, Clone, Copy)]
pub enum ParamSource<'a> {
    Native(&'a ProcedureDef),
    Macro(&'a MacroDef),
}

impl<'a> ParamSource<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            Self::Native(p) => &p.name,
            Self::Macro(m) => &m.name,
        }
    }

    pub fn params(&self) -> &'a [ParamDef] {
        match self {
            Self::Native(p) => &p.params,
            Self::Macro(m) => &m.params,
        }
    }

    pub fn kinds(&self) -> Vec<ParamKind> {
        self.params().iter().map(|p| p.kind).collect()
    }

    pub fn blurb(&self) -> &'a str {
        match self {
            Self::Native(p) => &p.blurb,
            Self::Macro(m) => &m.blurb,
        }
    }

    pub fn is_macro(&self) -> bool {
        matches!(self, Self::Macro(_))
    }
}

/// An immutable, cheaply clonable handle on the catalog and the macro table.
#[derive(Debug, Clone)]
pub struct Library {
    catalog: Arc<Catalog>,
    macros: Arc<MacroTable>,
}

impl Library {
    pub fn new(catalog: Catalog, macros: MacroTable) -> Self {
        Self {
            catalog: Arc::new(catalog),
            macros: Arc::new(macros),
        }
    }

    /// The embedded catalog and the built-in macros.
    pub fn embedded() -> Result<Self, CatalogError> {
        Ok(Self::new(Catalog::embedded()?, MacroTable::builtin()))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn macros(&self) -> &MacroTable {
        &self.macros
    }

    /// Resolves a name to its parameter source. Macros shadow procedures.
    pub fn source(&self, name: &str) -> Result<ParamSource<'_>, CatalogError> {
        if let Some(def) = self.macros.get(name) {
            return Ok(ParamSource::Macro(def));
        }
        self.catalog
            .get(name)
            .map(ParamSource::Native)
            .ok_or_else(|| CatalogError::UnknownOperation(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.macros.is_macro(name) || self.catalog.contains(name)
    }

    /// The tree path an operation is filed under, if it has one. A menu entry
    /// takes precedence over the procedure's own menu path.
    pub fn path_of(&self, name: &str) -> Option<String> {
        self.catalog
            .menu_entries()
            .find(|(_, target)| *target == name)
            .map(|(path, _)| path.to_string())
            .or_else(|| {
                self.catalog
                    .get(name)
                    .filter(|def| def.menupath != UNKNOWN_PATH_STRING)
                    .map(|def| def.menupath.clone())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SMALL_CATALOG: &str = r#"
        [procedures.plug-in-foo]
        blurb = "Foo the drawable"
        menupath = "<Image>/Filters/Foo..."
        params = [
            { kind = "run-mode", name = "run-mode", desc = "Interactive, non-interactive" },
            { kind = "image", name = "image" },
            { kind = "drawable", name = "drawable" },
            { kind = "float", name = "amount", desc = "How much" },
        ]

        [procedures.gimp-bar]
        params = [{ kind = "image", name = "image" }]

        [menu]
        "Image/Bar" = "gimp-bar"
    "#;

    #[test]
    fn test_standardize_menu_path() {
        assert_eq!(
            standardize_menu_path("<Image>/Filters/Blur/Gaussian Blur..."),
            "Filters/Blur/Gaussian Blur..."
        );
        assert_eq!(standardize_menu_path("<Toolbox>/Xtns/Thing"), "Toolbox/Xtns/Thing");
        assert_eq!(standardize_menu_path("Edit/Fill"), "Edit/Fill");
        // Only the leading component is stripped.
        assert_eq!(standardize_menu_path("Image/Image/Scale"), "Image/Scale");
    }

    #[test]
    fn test_parse_catalog_document() {
        let catalog = Catalog::from_toml_str("test", SMALL_CATALOG).unwrap();
        assert_eq!(catalog.len(), 2);

        let foo = catalog.get("plug-in-foo").unwrap();
        assert_eq!(foo.menupath, "Filters/Foo...");
        assert_eq!(foo.params.len(), 4);
        assert_eq!(foo.params[0].kind, ParamKind::RunMode);
        assert_eq!(foo.params[1].desc, "");

        let bar = catalog.get("gimp-bar").unwrap();
        assert_eq!(bar.menupath, UNKNOWN_PATH_STRING);
        assert_eq!(
            catalog.menu_entries().collect::<Vec<_>>(),
            vec![("Image/Bar", "gimp-bar")]
        );
    }

    #[test]
    fn test_unknown_fields_and_kinds_are_rejected() {
        let typo = "[procedures.x]\nblurp = \"typo\"\n";
        assert!(matches!(
            Catalog::from_toml_str("typo", typo),
            Err(CatalogError::TomlParse { .. })
        ));

        let bad_kind = "[procedures.x]\nparams = [{ kind = \"pixel\", name = \"p\" }]\n";
        assert!(Catalog::from_toml_str("kind", bad_kind).is_err());
    }

    #[test]
    fn test_merge_overrides_earlier_entries() {
        let mut base = Catalog::from_toml_str("base", SMALL_CATALOG).unwrap();
        let overlay = Catalog::from_toml_str(
            "overlay",
            "[procedures.gimp-bar]\nblurb = \"Replaced\"\n[menu]\n\"Image/Bar\" = \"plug-in-foo\"\n",
        )
        .unwrap();
        base.merge(overlay);

        assert_eq!(base.len(), 2);
        assert_eq!(base.get("gimp-bar").unwrap().blurb, "Replaced");
        assert!(base.get("gimp-bar").unwrap().params.is_empty());
        assert_eq!(
            base.menu_entries().collect::<Vec<_>>(),
            vec![("Image/Bar", "plug-in-foo")]
        );
    }

    #[test]
    fn test_from_file_and_missing_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SMALL_CATALOG.as_bytes()).unwrap();
        file.flush().unwrap();

        let catalog = Catalog::from_file(file.path()).unwrap();
        assert!(catalog.contains("plug-in-foo"));

        let missing = Catalog::from_file(Path::new("no_such_catalog_for_test.toml"));
        assert!(matches!(missing, Err(CatalogError::Io { .. })));
    }

    #[test]
    fn test_library_resolves_sources() {
        let catalog = Catalog::from_toml_str("test", SMALL_CATALOG).unwrap();
        let library = Library::new(catalog, MacroTable::builtin());

        let native = library.source("plug-in-foo").unwrap();
        assert!(!native.is_macro());
        assert_eq!(native.params().len(), 4);
        assert_eq!(native.blurb(), "Foo the drawable");

        let macro_source = library.source("macro-display-new").unwrap();
        assert!(macro_source.is_macro());
        assert!(macro_source.params().is_empty());

        assert!(matches!(
            library.source("gimp-nothing"),
            Err(CatalogError::UnknownOperation(name)) if name == "gimp-nothing"
        ));
    }

    #[test]
    fn test_library_path_of() {
        let catalog = Catalog::from_toml_str("test", SMALL_CATALOG).unwrap();
        let library = Library::new(catalog, MacroTable::builtin());
        assert_eq!(library.path_of("plug-in-foo").as_deref(), Some("Filters/Foo..."));
        assert_eq!(library.path_of("gimp-bar").as_deref(), Some("Image/Bar"));
        assert_eq!(library.path_of("macro-display-new"), None);
    }

    #[test]
    fn test_embedded_catalog_loads() {
        let library = Library::embedded().unwrap();
        assert!(!library.catalog().is_empty());
        assert!(library.contains("gimp-edit-fill"));
        assert!(library.contains("macro-channel-new"));
        // Every supplemental menu target resolves.
        for (path, target) in library.catalog().menu_entries() {
            assert!(library.contains(target), "{} -> {}", path, target);
        }
    }
}
