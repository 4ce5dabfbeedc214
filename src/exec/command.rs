// src/exec/command.rs

//! Host-server command line construction.

use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;

use crate::exec::{ExecSettings, RunConfiguration};
use crate::scenario::ScenarioRun;

/// Fully resolved process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
}

impl HostCommand {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args,
            working_dir: working_dir.into(),
        }
    }

    /// Command for one run: `[sudo] <binary> <host args...>`.
    pub fn for_run(settings: &ExecSettings, cfg: &RunConfiguration) -> Self {
        let mut args = host_args(&cfg.run);
        let program = if settings.sudo {
            args.insert(0, settings.binary.to_string_lossy().into_owned());
            PathBuf::from("sudo")
        } else {
            settings.binary.clone()
        };
        Self::new(program, args, cfg.working_dir.clone())
    }

    /// Tokio command with both output streams piped.
    ///
    /// The child is killed if the handle is dropped, so an aborted run never
    /// leaves a host server behind.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

impl fmt::Display for HostCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Host-server arguments derived from a scenario run.
pub fn host_args(run: &ScenarioRun) -> Vec<String> {
    let mut args = vec![
        run.mode.start_mode().as_str().to_string(),
        format!("--runner-start-mode={}", run.mode.runner_mode()),
        "--simulate-log-publishing".to_string(),
        "--simulate-webhook-event".to_string(),
    ];

    // The real runner picks up its job from GitHub instead.
    if !run.use_real_runner {
        args.push(format!("--simulate-client-use-fake-runner={}", run.target));
    }

    if run.fake_attestation {
        args.push("--simulate-client-use-fake-attestation".to_string());
    }

    if run.big_job {
        args.push("--big-job".to_string());
    }

    args
}
