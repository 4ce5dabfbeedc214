// src/scenario/mod.rs

//! Scenario model, CSV loading and matrix generation.
//!
//! - [`model`] holds the immutable run descriptions.
//! - [`parser`] reads scenario CSV files.
//! - [`generate`] enumerates a configuration matrix into a scenario file.

pub mod generate;
pub mod model;
pub mod parser;

pub use generate::{MatrixSpec, generate_scenario, write_scenario_csv};
pub use model::{BuildTarget, RunnerMode, Scenario, ScenarioRun, StartMode, UnknownRunnerMode};
pub use parser::{SCENARIO_COLUMNS, parse_scenario_csv, parse_scenario_str, resolve_scenario_path};
