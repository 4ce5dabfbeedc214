// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Like [`load_and_validate`], but a missing file yields the built-in
/// defaults. A file that exists and fails to parse is still an error.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    if path.exists() {
        info!(path = %path.display(), "loading config file");
        load_and_validate(path)
    } else {
        warn!(path = %path.display(), "config file not found; using built-in defaults");
        ConfigFile::try_from(RawConfigFile::default())
    }
}

/// Default config path: `Evalrunner.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Evalrunner.toml")
}
