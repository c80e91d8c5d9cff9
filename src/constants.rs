// src/constants.rs

/// The name of the gimpscripter directory inside the system config directory.
pub const CONFIG_DIR_NAME: &str = "gimpscripter";

/// The name of the user configuration file (inside the config directory).
pub const CONFIG_FILENAME: &str = "config.toml";

/// Environment variable naming one extra catalog file to load last.
pub const CATALOG_ENV_VAR: &str = "GIMPSCRIPTER_CATALOG";

/// Separator between components of a category path.
pub const PATH_SEPARATOR: char = '/';

/// Category path for catalog entries that have no menu location.
pub const UNKNOWN_PATH_STRING: &str = "<Unknown>";
