// src/analysis/dataset.rs

//! Flat table built from one or more sweep output directories.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, info, warn};

use crate::analysis::durations::{DurationRecord, Metric, derive_durations};
use crate::errors::{EvalError, Result};
use crate::scenario::ScenarioRun;
use crate::scenario::parser::{SCENARIO_FILE_NAME, parse_scenario_csv};
use crate::store::stdout_log_path;

/// Leading columns of every dataset row, before the offset columns.
pub const LEADING_COLUMNS: [&str; 9] = [
    "name",
    "runner_start_mode",
    "fake_attestation",
    "big_job",
    "use_real_runner",
    "target",
    "branch",
    "path",
    "runner_start_mode_label",
];

/// One run joined with its derived durations.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetRow {
    pub run: ScenarioRun,
    /// Output directory the run's logs were read from.
    pub path: PathBuf,
    pub record: DurationRecord,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub rows: Vec<DatasetRow>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Union of all offset columns in the batch, sorted.
    pub fn offset_columns(&self) -> Vec<String> {
        self.rows
            .iter()
            .flat_map(|row| row.record.offsets.keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn header(&self) -> Vec<String> {
        LEADING_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(self.offset_columns())
            .chain(Metric::ALL.iter().map(|m| m.column().to_string()))
            .collect()
    }

    /// Write the table as CSV; absent values become empty cells.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("creating dataset {:?}", path))?;

        let offsets = self.offset_columns();
        writer.write_record(self.header())?;

        for row in &self.rows {
            let run = &row.run;
            let mut record = vec![
                run.name.clone(),
                run.mode.as_str().to_string(),
                run.fake_attestation.to_string(),
                run.big_job.to_string(),
                run.use_real_runner.to_string(),
                run.target.subproject.clone(),
                run.target.branch.clone().unwrap_or_default(),
                row.path.display().to_string(),
                run.mode.label().to_string(),
            ];
            record.extend(offsets.iter().map(|col| cell(row.record.offset(col))));
            record.extend(Metric::ALL.iter().map(|m| cell(row.record.get(*m))));
            writer.write_record(&record)?;
        }

        writer.flush()?;
        info!(rows = self.rows.len(), path = %path.display(), "dataset written");
        Ok(())
    }
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Rows of one output directory.
///
/// The directory's `scenario.csv` is required; runs whose `.log` is missing
/// are skipped.
pub fn load_output_dir(dir: &Path) -> Result<Vec<DatasetRow>> {
    let scenario_path = dir.join(SCENARIO_FILE_NAME);
    if !scenario_path.is_file() {
        return Err(EvalError::ConfigError(format!(
            "output directory {:?} has no {SCENARIO_FILE_NAME}",
            dir
        )));
    }
    let scenario = parse_scenario_csv(&scenario_path)?;

    let mut rows = Vec::with_capacity(scenario.len());
    for run in scenario.runs {
        let log_path = stdout_log_path(dir, &run.name);
        let stdout = match fs::read(&log_path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                warn!(run = %run.name, path = %log_path.display(), error = %e, "skipping run without log");
                continue;
            }
        };

        let record = derive_durations(&run.name, &stdout);
        if !record.has_reference() {
            debug!(run = %run.name, "no WEBHOOK marker; offsets left empty");
        }
        rows.push(DatasetRow {
            run,
            path: dir.to_path_buf(),
            record,
        });
    }

    Ok(rows)
}

/// Merge several output directories into one dataset, in the given order.
pub fn build_dataset<P: AsRef<Path>>(dirs: &[P]) -> Result<Dataset> {
    let mut dataset = Dataset::default();
    for dir in dirs {
        let rows = load_output_dir(dir.as_ref())?;
        debug!(dir = %dir.as_ref().display(), rows = rows.len(), "loaded output directory");
        dataset.rows.extend(rows);
    }
    Ok(dataset)
}
