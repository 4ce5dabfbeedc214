// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! Run-level failures (timeouts, pattern kills, trigger failures) are not
//! errors at this level: they are captured into each run's `RunOutcome` by
//! the executor. `EvalError` covers what aborts a whole command.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvalError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Malformed scenario header: {0}")]
    ScenarioHeader(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, EvalError>;
