// src/scenario/parser.rs

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::errors::{EvalError, Result};
use crate::scenario::model::{BuildTarget, RunnerMode, Scenario, ScenarioRun};

/// Column names every scenario file must provide.
pub const SCENARIO_COLUMNS: [&str; 6] = [
    "name",
    "runner_start_mode",
    "fake_attestation",
    "big_job",
    "use_real_runner",
    "target",
];

/// File name looked up when a directory is given instead of a CSV file.
pub const SCENARIO_FILE_NAME: &str = "scenario.csv";

/// One CSV record before semantic checks.
#[derive(Debug, Deserialize)]
struct RawScenarioRow {
    name: String,
    runner_start_mode: String,
    fake_attestation: String,
    big_job: String,
    use_real_runner: String,
    target: String,
}

/// A scenario path may point at the CSV itself or at its directory.
pub fn resolve_scenario_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.is_dir() {
        path.join(SCENARIO_FILE_NAME)
    } else {
        path.to_path_buf()
    }
}

/// Read and parse a scenario CSV file.
pub fn parse_scenario_csv(path: impl AsRef<Path>) -> Result<Scenario> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let scenario = parse_scenario_str(&contents)?;
    debug!(path = %path.display(), runs = scenario.len(), "parsed scenario file");
    Ok(scenario)
}

/// Parse scenario CSV text.
///
/// Lines starting with `#` are dropped before the CSV reader sees them, so
/// comments may appear anywhere, including above the header.
pub fn parse_scenario_str(contents: &str) -> Result<Scenario> {
    let filtered: String = contents
        .lines()
        .filter(|line| !line.starts_with('#'))
        .map(|line| format!("{line}\n"))
        .collect();

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(filtered.as_bytes());

    validate_header(reader.headers()?)?;

    let mut runs = Vec::new();
    let mut seen = HashSet::new();

    for (idx, record) in reader.deserialize::<RawScenarioRow>().enumerate() {
        let row_no = idx + 1;
        let raw = record.map_err(|e| EvalError::ParseError(format!("scenario row {row_no}: {e}")))?;
        let run = row_to_run(raw).map_err(|e| EvalError::ParseError(format!("scenario row {row_no}: {e}")))?;

        if !seen.insert(run.name.clone()) {
            return Err(EvalError::ParseError(format!(
                "scenario row {row_no}: duplicate run name '{}'",
                run.name
            )));
        }
        runs.push(run);
    }

    Ok(Scenario { runs })
}

fn validate_header(headers: &csv::StringRecord) -> Result<()> {
    let present: HashSet<&str> = headers.iter().collect();
    let missing: Vec<&str> = SCENARIO_COLUMNS
        .iter()
        .copied()
        .filter(|col| !present.contains(col))
        .collect();

    if !missing.is_empty() {
        return Err(EvalError::ScenarioHeader(format!(
            "missing column(s) {:?}; expected header '{}'",
            missing,
            SCENARIO_COLUMNS.join(",")
        )));
    }
    Ok(())
}

fn row_to_run(raw: RawScenarioRow) -> std::result::Result<ScenarioRun, String> {
    if raw.name.is_empty() {
        return Err("empty run name".to_string());
    }
    // Names become log file names inside the output directory.
    if raw.name == "." || raw.name.contains("..") || raw.name.contains(['/', '\\']) {
        return Err(format!("run name {:?} is not a plain file name", raw.name));
    }

    let mode: RunnerMode = raw.runner_start_mode.parse().map_err(|e| format!("{e}"))?;
    let target: BuildTarget = raw.target.parse()?;

    Ok(ScenarioRun {
        name: raw.name,
        mode,
        fake_attestation: parse_flag(&raw.fake_attestation),
        big_job: parse_flag(&raw.big_job),
        use_real_runner: parse_flag(&raw.use_real_runner),
        target,
    })
}

/// Anything other than a case-insensitive `true` is false.
fn parse_flag(s: &str) -> bool {
    s.trim().eq_ignore_ascii_case("true")
}
