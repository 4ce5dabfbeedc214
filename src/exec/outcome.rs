// src/exec/outcome.rs

use thiserror::Error;

use crate::trigger::TriggerError;

/// Why a run did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunFailure {
    /// The run needs the real runner but no GitHub credentials were configured.
    #[error("GitHub configuration not provided for real runner")]
    MissingCredentials,

    #[error("failed to trigger GitHub workflow: {0}")]
    Trigger(#[from] TriggerError),

    #[error("failed to execute host server: {0}")]
    Launch(String),

    #[error("host server timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("host server killed by pattern '{pattern}'")]
    KilledByPattern { pattern: String },

    #[error("host server failed with return code {0}")]
    ProcessExited(i32),
}

impl RunFailure {
    /// Short machine-readable classification, as persisted in `outcomes.csv`.
    pub fn kind(&self) -> &'static str {
        match self {
            RunFailure::MissingCredentials | RunFailure::Trigger(_) => "precondition-failed",
            RunFailure::Launch(_) => "launch-error",
            RunFailure::Timeout { .. } => "timeout",
            RunFailure::KilledByPattern { .. } => "killed-by-pattern",
            RunFailure::ProcessExited(_) => "process-failed",
        }
    }

    /// True when no local process was started.
    pub fn is_precondition(&self) -> bool {
        matches!(self, RunFailure::MissingCredentials | RunFailure::Trigger(_))
    }
}

/// Result of a single run: classification plus everything captured.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunOutcome {
    /// `None` means the host server exited with code 0.
    pub error: Option<RunFailure>,
    pub stdout: String,
    pub stderr: String,
}

impl RunOutcome {
    pub fn success(&self) -> bool {
        self.error.is_none()
    }

    pub fn status(&self) -> &'static str {
        self.error.as_ref().map_or("success", RunFailure::kind)
    }

    /// Outcome for a run that failed before any process was started.
    pub fn not_started(failure: RunFailure) -> Self {
        let stderr = failure.to_string();
        Self {
            error: Some(failure),
            stdout: String::new(),
            stderr,
        }
    }
}
