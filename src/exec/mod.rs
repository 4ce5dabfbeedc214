// src/exec/mod.rs

//! Process execution layer.
//!
//! This module runs the host server for one scenario run, using
//! `tokio::process::Command`, and classifies how the run ended.
//!
//! - [`command`] builds the host-server command line.
//! - [`streams`] forwards stdout/stderr lines from per-pipe reader tasks.
//! - [`kill`] holds the kill-pattern matcher.
//! - [`runner`] owns the watch loop (timeout, pattern kill, drain) and the
//!   `HostExecutor` that fires the remote trigger first when needed.
//! - [`outcome`] defines `RunOutcome` and the failure taxonomy.
//! - [`backend`] provides the `ExecutorBackend` trait the sweep driver talks
//!   to, so tests can replace real processes with a fake.

pub mod backend;
pub mod command;
pub mod kill;
pub mod outcome;
pub mod runner;
pub mod streams;

use std::path::PathBuf;
use std::time::Duration;

use crate::scenario::ScenarioRun;
use crate::trigger::GithubCredentials;

pub use backend::{ExecutorBackend, RealExecutorBackend};
pub use command::{HostCommand, host_args};
pub use kill::KillPatterns;
pub use outcome::{RunFailure, RunOutcome};
pub use runner::{HostExecutor, WatchPolicy, run_process};

/// Executor-wide settings shared by every run of a sweep.
#[derive(Debug, Clone)]
pub struct ExecSettings {
    /// Host-server executable (already resolved against the working dir).
    pub binary: PathBuf,
    pub sudo: bool,
    pub echo_output: bool,
    pub poll_interval: Duration,
    pub grace_period: Duration,
    pub real_runner_extra_grace: Duration,
    pub drain_timeout: Duration,
}

/// Everything needed to execute one run, built right before it starts.
#[derive(Debug, Clone)]
pub struct RunConfiguration {
    pub run: ScenarioRun,
    /// Always greater than zero.
    pub timeout: Duration,
    pub working_dir: PathBuf,
    pub github: Option<GithubCredentials>,
    pub kill_patterns: KillPatterns,
}

/// Per-run settings that are the same for every run of a sweep.
#[derive(Debug, Clone)]
pub struct RunTemplate {
    pub timeout: Duration,
    pub working_dir: PathBuf,
    pub github: Option<GithubCredentials>,
    pub kill_patterns: KillPatterns,
}

impl RunTemplate {
    pub fn configure(&self, run: &ScenarioRun) -> RunConfiguration {
        RunConfiguration {
            run: run.clone(),
            timeout: self.timeout,
            working_dir: self.working_dir.clone(),
            github: self.github.clone(),
            kill_patterns: self.kill_patterns.clone(),
        }
    }
}
