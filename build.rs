// build.rs
//
// Generates the `t!` macro from `locales/`. English is always loaded and the
// selected language is laid over it, so a partial locale still compiles.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;

type Strings = BTreeMap<String, String>;

const LOCALES_DIR: &str = "locales";
const FALLBACK_LANG: &str = "en";

/// A `lang_*` cargo feature wins over `GIMPSCRIPTER_LANG`.
fn selected_language() -> String {
    let mut from_features: Vec<String> = env::vars()
        .filter_map(|(key, _)| {
            key.strip_prefix("CARGO_FEATURE_LANG_")
                .map(str::to_lowercase)
        })
        .collect();
    from_features.sort();

    match from_features.as_slice() {
        [] => env::var("GIMPSCRIPTER_LANG").unwrap_or_else(|_| FALLBACK_LANG.to_string()),
        [only] => only.clone(),
        [first, ..] => {
            println!(
                "cargo:warning=Several lang_* features are enabled ({:?}); using '{}'.",
                from_features, first
            );
            first.clone()
        }
    }
}

fn read_strings(lang: &str) -> Option<Strings> {
    let path = format!("{}/{}.toml", LOCALES_DIR, lang);
    let content = fs::read_to_string(&path).ok()?;
    match toml::from_str(&content) {
        Ok(strings) => Some(strings),
        Err(e) => panic!("{} is not a valid string table: {}", path, e),
    }
}

fn macro_source(strings: &Strings) -> String {
    let mut code = String::from("#[macro_export]\nmacro_rules! t {\n");
    for (key, value) in strings {
        let literal = value.replace('\\', "\\\\").replace('"', "\\\"");
        code.push_str(&format!("    (\"{}\") => {{ \"{}\" }};\n", key, literal));
    }
    code.push_str(
        "    ($key:expr) => {{ compile_error!(concat!(\"Missing translation key: \", $key)) }};\n}\n",
    );
    code
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed={}/", LOCALES_DIR);
    println!("cargo:rerun-if-env-changed=GIMPSCRIPTER_LANG");

    let lang = selected_language();
    println!("cargo:rustc-env=GIMPSCRIPTER_LANG_EFFECTIVE={}", lang);

    let mut strings = read_strings(FALLBACK_LANG)
        .unwrap_or_else(|| panic!("{}/{}.toml is required", LOCALES_DIR, FALLBACK_LANG));
    if lang != FALLBACK_LANG {
        match read_strings(&lang) {
            Some(overrides) => strings.extend(overrides),
            None => println!(
                "cargo:warning=No {}/{}.toml; falling back to '{}'.",
                LOCALES_DIR, lang, FALLBACK_LANG
            ),
        }
    }

    let out_dir = env::var("OUT_DIR").expect("cargo sets OUT_DIR for build scripts");
    fs::write(Path::new(&out_dir).join("translations.rs"), macro_source(&strings))
        .expect("OUT_DIR is writable");
}
