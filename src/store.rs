// src/store.rs

//! Output directory of one sweep.
//!
//! Layout:
//! - `scenario.csv`: copy of the scenario that was executed
//! - `<run>.log` / `<run>.err`: captured stdout / stderr of each run
//! - `outcomes.csv`: one `name,status,error` row per run, appended as runs
//!   finish so an interrupted sweep keeps what it already did

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, TimeZone};
use tracing::debug;

use crate::errors::Result;
use crate::exec::RunOutcome;
use crate::scenario::parser::SCENARIO_FILE_NAME;

pub const OUTCOMES_FILE_NAME: &str = "outcomes.csv";

/// Default output directory name, e.g. `output_2025-08-27_15-37-19`.
pub fn default_output_dir_name<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("output_{}", now.format("%Y-%m-%d_%H-%M-%S"))
}

pub fn stdout_log_path(dir: &Path, run_name: &str) -> PathBuf {
    dir.join(format!("{run_name}.log"))
}

pub fn stderr_log_path(dir: &Path, run_name: &str) -> PathBuf {
    dir.join(format!("{run_name}.err"))
}

/// Writer for a sweep's output directory.
pub struct RunStore {
    dir: PathBuf,
    outcomes: csv::Writer<File>,
}

impl std::fmt::Debug for RunStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunStore")
            .field("dir", &self.dir)
            .finish_non_exhaustive()
    }
}

impl RunStore {
    /// Create (or reuse) `dir` and start a fresh outcome ledger in it.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).with_context(|| format!("creating output dir {:?}", dir))?;

        let ledger = dir.join(OUTCOMES_FILE_NAME);
        let mut outcomes = csv::Writer::from_path(&ledger)
            .with_context(|| format!("creating outcome ledger {:?}", ledger))?;
        outcomes.write_record(["name", "status", "error"])?;
        outcomes.flush()?;

        Ok(Self { dir, outcomes })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Keep the scenario next to its logs; `analyze` reads it from there.
    pub fn copy_scenario(&self, scenario_path: &Path) -> Result<PathBuf> {
        let dest = self.dir.join(SCENARIO_FILE_NAME);
        fs::copy(scenario_path, &dest)
            .with_context(|| format!("copying scenario {:?} to {:?}", scenario_path, dest))?;
        Ok(dest)
    }

    /// Write both captured streams and the classification of one run.
    pub fn persist(&mut self, run_name: &str, outcome: &RunOutcome) -> Result<()> {
        let stdout_path = stdout_log_path(&self.dir, run_name);
        fs::write(&stdout_path, &outcome.stdout)
            .with_context(|| format!("writing {:?}", stdout_path))?;

        let stderr_path = stderr_log_path(&self.dir, run_name);
        fs::write(&stderr_path, &outcome.stderr)
            .with_context(|| format!("writing {:?}", stderr_path))?;

        let reason = outcome
            .error
            .as_ref()
            .map(|e| e.to_string())
            .unwrap_or_default();
        self.outcomes
            .write_record([run_name, outcome.status(), reason.as_str()])?;
        self.outcomes.flush()?;

        debug!(run = %run_name, dir = %self.dir.display(), "persisted run output");
        Ok(())
    }
}
