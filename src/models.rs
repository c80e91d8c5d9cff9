// src/models.rs

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

lazy_static! {
    // Accepts "r,g,b", "(r, g, b)" and "r g b".
    static ref COLOR_TUPLE_RE: Regex =
        Regex::new(r"^\(?\s*(\d{1,3})\s*[,\s]\s*(\d{1,3})\s*[,\s]\s*(\d{1,3})\s*\)?$")
            .expect("color tuple pattern is valid");
    static ref COLOR_HEX_RE: Regex =
        Regex::new(r"^#([0-9a-fA-F]{2})([0-9a-fA-F]{2})([0-9a-fA-F]{2})$")
            .expect("color hex pattern is valid");
}

// --- PARAMETER KINDS ---

/// The closed set of formal parameter kinds a procedure can declare.
///
/// Mirrors the argument types of the GIMP procedure database. `RunMode` is the
/// execution-context parameter every plugin accepts first.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum ParamKind {
    RunMode,
    Int8,
    Int16,
    Int32,
    Float,
    String,
    Color,
    Bool,
    Int8Array,
    Int16Array,
    Int32Array,
    FloatArray,
    StringArray,
    ColorArray,
    Display,
    Image,
    Layer,
    Channel,
    Drawable,
    Vectors,
    Selection,
    Parasite,
    Brush,
    Pattern,
    Gradient,
    Palette,
    Font,
}

impl ParamKind {
    /// The name used for this kind in catalog and plan files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RunMode => "run-mode",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Float => "float",
            Self::String => "string",
            Self::Color => "color",
            Self::Bool => "bool",
            Self::Int8Array => "int8-array",
            Self::Int16Array => "int16-array",
            Self::Int32Array => "int32-array",
            Self::FloatArray => "float-array",
            Self::StringArray => "string-array",
            Self::ColorArray => "color-array",
            Self::Display => "display",
            Self::Image => "image",
            Self::Layer => "layer",
            Self::Channel => "channel",
            Self::Drawable => "drawable",
            Self::Vectors => "vectors",
            Self::Selection => "selection",
            Self::Parasite => "parasite",
            Self::Brush => "brush",
            Self::Pattern => "pattern",
            Self::Gradient => "gradient",
            Self::Palette => "palette",
            Self::Font => "font",
        }
    }

    /// Whether this kind refers to a live session object rather than a literal value.
    ///
    /// The set of such objects existing when the wrapper is created can differ from
    /// the set existing when it runs, so the object's name stands in for an identity.
    pub fn is_ambient(&self) -> bool {
        matches!(
            self,
            Self::Display
                | Self::Image
                | Self::Layer
                | Self::Channel
                | Self::Drawable
                | Self::Vectors
        )
    }

    /// A typical value of the kind, used to seed an entry form.
    ///
    /// These are not the defaults a plugin author declared (the procedure database
    /// does not expose them), just a reasonable instance of the type.
    pub fn canonical_default(&self) -> Option<ParamValue> {
        match self {
            Self::Int8 | Self::Int16 | Self::Int32 => Some(ParamValue::Int(1)),
            Self::Float => Some(ParamValue::Float(5.0)),
            Self::String => Some(ParamValue::Str("bar".to_string())),
            Self::Color => Some(ParamValue::Color(37, 37, 37)),
            Self::Bool => Some(ParamValue::Bool(true)),
            Self::Image => Some(ParamValue::Str("Untitled".to_string())),
            Self::Layer | Self::Drawable => Some(ParamValue::Str("Clipboard".to_string())),
            Self::Channel => Some(ParamValue::Str("Alpha".to_string())),
            Self::Vectors => Some(ParamValue::Str("Path".to_string())),
            Self::Brush => Some(ParamValue::Str("Circle (05)".to_string())),
            Self::Pattern => Some(ParamValue::Str("Pine".to_string())),
            Self::Gradient => Some(ParamValue::Str("FG to BG (RGB)".to_string())),
            Self::Palette => Some(ParamValue::Str("Default".to_string())),
            Self::Font => Some(ParamValue::Str("Sans".to_string())),
            Self::RunMode
            | Self::Display
            | Self::Selection
            | Self::Parasite
            | Self::Int8Array
            | Self::Int16Array
            | Self::Int32Array
            | Self::FloatArray
            | Self::StringArray
            | Self::ColorArray => None,
        }
    }

    /// Whether a user can type a value of this kind into a text form.
    pub fn is_enterable(&self) -> bool {
        self.canonical_default().is_some()
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A formal parameter as declared by a catalog procedure or a macro.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ParamDef {
    pub kind: ParamKind,
    pub name: String,
    #[serde(default)]
    pub desc: String,
}

impl ParamDef {
    pub fn new(kind: ParamKind, name: &str, desc: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            desc: desc.to_string(),
        }
    }
}

// --- PARAMETER VALUES ---

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error("'{text}' is not a valid {kind} value.")]
    Malformed { kind: ParamKind, text: String },
    #[error("{kind} {value} is outside the range {min}..={max}.")]
    OutOfRange {
        kind: ParamKind,
        value: i64,
        min: i64,
        max: i64,
    },
    #[error("Parameters of kind {0} cannot be entered as text.")]
    NotEnterable(ParamKind),
}

/// An actual value for a parameter, as entered by the user or seeded from a default.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Color(u8, u8, u8),
}

impl ParamValue {
    /// Parses user text into a value of the given kind.
    pub fn parse(kind: ParamKind, text: &str) -> Result<Self, ValueError> {
        let trimmed = text.trim();
        let malformed = || ValueError::Malformed {
            kind,
            text: text.to_string(),
        };

        match kind {
            ParamKind::Int8 => parse_int(kind, trimmed, 0, 255),
            ParamKind::Int16 => parse_int(kind, trimmed, i16::MIN.into(), i16::MAX.into()),
            ParamKind::Int32 => parse_int(kind, trimmed, i32::MIN.into(), i32::MAX.into()),
            ParamKind::Float => trimmed
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Self::Float)
                .ok_or_else(malformed),
            ParamKind::Bool => match trimmed.to_lowercase().as_str() {
                "true" | "yes" | "y" | "1" => Ok(Self::Bool(true)),
                "false" | "no" | "n" | "0" => Ok(Self::Bool(false)),
                _ => Err(malformed()),
            },
            ParamKind::Color => parse_color(trimmed).ok_or_else(malformed),
            // Strings keep their inner whitespace; only resource and object names are trimmed.
            ParamKind::String => Ok(Self::Str(text.to_string())),
            ParamKind::Image
            | ParamKind::Layer
            | ParamKind::Channel
            | ParamKind::Drawable
            | ParamKind::Vectors
            | ParamKind::Brush
            | ParamKind::Pattern
            | ParamKind::Gradient
            | ParamKind::Palette
            | ParamKind::Font => {
                if trimmed.is_empty() {
                    Err(malformed())
                } else {
                    Ok(Self::Str(trimmed.to_string()))
                }
            }
            other => Err(ValueError::NotEnterable(other)),
        }
    }

    /// Renders the value as an evaluable literal in the generated plugin source.
    pub fn to_literal(&self) -> String {
        match self {
            Self::Bool(true) => "True".to_string(),
            Self::Bool(false) => "False".to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => format!("{:?}", f),
            Self::Str(s) => wrap_value(s),
            Self::Color(r, g, b) => format!("({}, {}, {})", r, g, b),
        }
    }
}

impl fmt::Display for ParamValue {
    /// The editable text form, accepted back by `ParamValue::parse`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{:?}", x),
            Self::Str(s) => f.write_str(s),
            Self::Color(r, g, b) => write!(f, "{},{},{}", r, g, b),
        }
    }
}

fn parse_int(kind: ParamKind, text: &str, min: i64, max: i64) -> Result<ParamValue, ValueError> {
    let value = text.parse::<i64>().map_err(|_| ValueError::Malformed {
        kind,
        text: text.to_string(),
    })?;
    if value < min || value > max {
        return Err(ValueError::OutOfRange {
            kind,
            value,
            min,
            max,
        });
    }
    Ok(ParamValue::Int(value))
}

fn parse_color(text: &str) -> Option<ParamValue> {
    if let Some(caps) = COLOR_HEX_RE.captures(text) {
        let channel = |i: usize| u8::from_str_radix(caps.get(i)?.as_str(), 16).ok();
        return Some(ParamValue::Color(channel(1)?, channel(2)?, channel(3)?));
    }
    let caps = COLOR_TUPLE_RE.captures(text)?;
    let channel = |i: usize| caps.get(i)?.as_str().parse::<u8>().ok();
    Some(ParamValue::Color(channel(1)?, channel(2)?, channel(3)?))
}

/// Wraps a string in double quotes, escaping backslashes and inner quotes.
pub fn wrap_value(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

// --- CATALOG FILE MODELS (What is read from catalog `.toml` files) ---

/// One procedure entry in a catalog file.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct ProcedureDoc {
    #[serde(default)]
    pub blurb: String,
    pub help: Option<String>,
    pub menupath: Option<String>,
    pub imagetype: Option<String>,
    #[serde(default)]
    pub params: Vec<ParamDef>,
}

/// The deserialized structure of a catalog file.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct CatalogDocument {
    #[serde(default)]
    pub procedures: BTreeMap<String, ProcedureDoc>,
    /// Supplemental tree paths, mapped to procedure or macro names.
    #[serde(default)]
    pub menu: BTreeMap<String, String>,
}

// --- PLAN FILE MODELS (non-interactive sequence building) ---

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct PlanOperation {
    pub name: String,
    /// Text for each visible parameter, in declaration order.
    #[serde(default)]
    pub values: Vec<String>,
    /// Which visible parameters are supplied at run time. Defaults to none.
    #[serde(default)]
    pub deferred: Vec<bool>,
    #[serde(default)]
    pub use_last_values: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct PlanFile {
    pub name: String,
    pub label: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub operations: Vec<PlanOperation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambient_subset() {
        let ambient: Vec<_> = [
            ParamKind::RunMode,
            ParamKind::Int32,
            ParamKind::Display,
            ParamKind::Image,
            ParamKind::Layer,
            ParamKind::Channel,
            ParamKind::Drawable,
            ParamKind::Vectors,
            ParamKind::Brush,
        ]
        .into_iter()
        .filter(ParamKind::is_ambient)
        .collect();
        assert_eq!(
            ambient,
            vec![
                ParamKind::Display,
                ParamKind::Image,
                ParamKind::Layer,
                ParamKind::Channel,
                ParamKind::Drawable,
                ParamKind::Vectors,
            ]
        );
    }

    #[test]
    fn test_kind_names_match_serde() {
        for kind in [
            ParamKind::RunMode,
            ParamKind::Int8Array,
            ParamKind::Vectors,
            ParamKind::StringArray,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_parse_values_per_kind() {
        assert_eq!(
            ParamValue::parse(ParamKind::Int32, " 42 "),
            Ok(ParamValue::Int(42))
        );
        assert_eq!(
            ParamValue::parse(ParamKind::Float, "2.5"),
            Ok(ParamValue::Float(2.5))
        );
        assert_eq!(
            ParamValue::parse(ParamKind::Bool, "No"),
            Ok(ParamValue::Bool(false))
        );
        assert_eq!(
            ParamValue::parse(ParamKind::Color, "(10, 20, 30)"),
            Ok(ParamValue::Color(10, 20, 30))
        );
        assert_eq!(
            ParamValue::parse(ParamKind::Color, "#ff0080"),
            Ok(ParamValue::Color(255, 0, 128))
        );
        assert_eq!(
            ParamValue::parse(ParamKind::String, " keep spaces "),
            Ok(ParamValue::Str(" keep spaces ".to_string()))
        );
        assert_eq!(
            ParamValue::parse(ParamKind::Layer, " Background "),
            Ok(ParamValue::Str("Background".to_string()))
        );
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(
            ParamValue::parse(ParamKind::Int32, "ten"),
            Err(ValueError::Malformed { .. })
        ));
        assert!(matches!(
            ParamValue::parse(ParamKind::Int8, "300"),
            Err(ValueError::OutOfRange { value: 300, .. })
        ));
        assert!(matches!(
            ParamValue::parse(ParamKind::Color, "300,0,0"),
            Err(ValueError::Malformed { .. })
        ));
        assert!(matches!(
            ParamValue::parse(ParamKind::Float, "NaN"),
            Err(ValueError::Malformed { .. })
        ));
        assert_eq!(
            ParamValue::parse(ParamKind::FloatArray, "1,2"),
            Err(ValueError::NotEnterable(ParamKind::FloatArray))
        );
    }

    #[test]
    fn test_display_text_parses_back() {
        for kind in [
            ParamKind::Int32,
            ParamKind::Float,
            ParamKind::Color,
            ParamKind::Bool,
            ParamKind::Brush,
        ] {
            let default = kind.canonical_default().unwrap();
            let reparsed = ParamValue::parse(kind, &default.to_string()).unwrap();
            assert_eq!(reparsed, default, "kind {}", kind);
        }
    }

    #[test]
    fn test_literals() {
        assert_eq!(ParamValue::Bool(true).to_literal(), "True");
        assert_eq!(ParamValue::Float(5.0).to_literal(), "5.0");
        assert_eq!(
            ParamValue::Str("say \"hi\"".to_string()).to_literal(),
            "\"say \\\"hi\\\"\""
        );
        assert_eq!(ParamValue::Color(1, 2, 3).to_literal(), "(1, 2, 3)");
    }

    #[test]
    fn test_hidden_only_kinds_have_no_default() {
        assert!(ParamKind::RunMode.canonical_default().is_none());
        assert!(ParamKind::Display.canonical_default().is_none());
        assert!(!ParamKind::Int32Array.is_enterable());
        assert!(ParamKind::Drawable.is_enterable());
    }
}
