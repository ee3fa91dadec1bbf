// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file and return the raw, unvalidated document.
///
/// `.toml` files are parsed as TOML; anything else is treated as JSON.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    parse_str(&contents, is_toml(path))
}

/// Parse configuration text in the given format.
pub fn parse_str(contents: &str, toml_format: bool) -> Result<RawConfigFile> {
    let config = if toml_format {
        toml::from_str(contents)?
    } else {
        serde_json::from_str(contents)?
    };
    Ok(config)
}

/// Load a configuration file and validate every process entry.
///
/// The returned config remembers the directory it was loaded from so that
/// the status file location can be resolved relative to it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let raw_config = load_from_path(path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config.with_base_dir(config_dir(path)))
}

fn is_toml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("toml"))
}

/// Directory of the config file; a bare file name resolves to ".".
fn config_dir(config_path: &Path) -> &Path {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
