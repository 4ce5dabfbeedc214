// src/scenario/generate.rs

//! Scenario matrix generation.
//!
//! Enumerates iterations x targets x runner modes in that nesting order, so a
//! partially completed sweep still covers every target once before repeating.

use std::path::Path;

use anyhow::Context;

use crate::errors::{EvalError, Result};
use crate::scenario::model::{BuildTarget, RunnerMode, Scenario, ScenarioRun};
use crate::scenario::parser::SCENARIO_COLUMNS;

#[derive(Debug, Clone)]
pub struct MatrixSpec {
    pub targets: Vec<String>,
    pub modes: Vec<RunnerMode>,
    pub iterations: u32,
    pub big_job: bool,
    pub use_real_runner: bool,
    pub use_branches: bool,
}

impl Default for MatrixSpec {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            modes: RunnerMode::ALL.to_vec(),
            iterations: 3,
            big_job: false,
            use_real_runner: false,
            use_branches: false,
        }
    }
}

/// Expand a matrix into an ordered scenario.
///
/// Runs outside the enclave cannot get a real attestation document, so they
/// always use the fake one.
pub fn generate_scenario(spec: &MatrixSpec) -> Result<Scenario> {
    if spec.targets.is_empty() {
        return Err(EvalError::ConfigError(
            "scenario generation needs at least one target".to_string(),
        ));
    }
    if spec.modes.is_empty() {
        return Err(EvalError::ConfigError(
            "scenario generation needs at least one runner mode".to_string(),
        ));
    }
    // Targets end up in run names, which must stay plain file names.
    let invalid = |t: &str| t.trim().is_empty() || t.contains(['@', '/', '\\']) || t.contains("..");
    if let Some(bad) = spec.targets.iter().find(|t| invalid(t)) {
        return Err(EvalError::ConfigError(format!(
            "invalid target '{bad}': expected a bare subproject directory"
        )));
    }

    let mut runs = Vec::new();
    for iteration in 1..=spec.iterations {
        for target in &spec.targets {
            for &mode in &spec.modes {
                let branch = spec.use_branches.then(|| target.clone());
                runs.push(ScenarioRun {
                    name: format!("{target}_{mode}_{iteration}"),
                    mode,
                    fake_attestation: !mode.in_enclave(),
                    big_job: spec.big_job,
                    use_real_runner: spec.use_real_runner,
                    target: BuildTarget::new(target.clone(), branch),
                });
            }
        }
    }

    Ok(Scenario { runs })
}

/// Write a scenario in the format read by [`crate::scenario::parse_scenario_csv`].
pub fn write_scenario_csv(scenario: &Scenario, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_path(path)
        .with_context(|| format!("creating scenario file {:?}", path))?;

    writer.write_record(SCENARIO_COLUMNS)?;
    for run in scenario.iter() {
        let target = run.target.to_string();
        writer.write_record([
            run.name.as_str(),
            run.mode.as_str(),
            bool_str(run.fake_attestation),
            bool_str(run.big_job),
            bool_str(run.use_real_runner),
            target.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn bool_str(b: bool) -> &'static str {
    if b { "true" } else { "false" }
}
