// src/config/mod.rs

//! Configuration loading and validation for evalrunner.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate it and parse duration strings (`validate.rs`, `duration.rs`).
//! - Merge file, CLI and environment into `Settings` (`settings.rs`).

pub mod duration;
pub mod loader;
pub mod model;
pub mod settings;
pub mod validate;

pub use duration::parse_duration;
pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_default};
pub use model::{
    ConfigFile, DEFAULT_GITHUB_API_BASE, DEFAULT_KILL_PATTERNS, GithubSection, HostSection,
    RawConfigFile, RawRunSection, RunSection,
};
pub use settings::{Environment, Overrides, Settings};
