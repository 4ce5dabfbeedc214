// src/scenario/model.rs

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// How the host server starts the build runner.
///
/// Each variant maps to a `(start-mode, runner-mode)` pair on the host-server
/// command line, see [`RunnerMode::start_mode`] and [`RunnerMode::runner_mode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RunnerMode {
    LocalDirect,
    LocalSandbox,
    EnclaveDirect,
    EnclaveSandbox,
    EnclaveSandboxPlus,
}

/// First positional argument of the host server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartMode {
    Local,
    Nitro,
}

impl StartMode {
    pub fn as_str(self) -> &'static str {
        match self {
            StartMode::Local => "local",
            StartMode::Nitro => "nitro",
        }
    }
}

impl fmt::Display for StartMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown runner mode '{0}' (expected one of local_direct, local_sandbox, enclave_direct, enclave_sandbox, enclave_sandbox_plus)")]
pub struct UnknownRunnerMode(pub String);

impl RunnerMode {
    pub const ALL: [RunnerMode; 5] = [
        RunnerMode::LocalDirect,
        RunnerMode::LocalSandbox,
        RunnerMode::EnclaveDirect,
        RunnerMode::EnclaveSandbox,
        RunnerMode::EnclaveSandboxPlus,
    ];

    pub fn start_mode(self) -> StartMode {
        match self {
            RunnerMode::LocalDirect | RunnerMode::LocalSandbox => StartMode::Local,
            RunnerMode::EnclaveDirect
            | RunnerMode::EnclaveSandbox
            | RunnerMode::EnclaveSandboxPlus => StartMode::Nitro,
        }
    }

    /// Value of `--runner-start-mode=`.
    pub fn runner_mode(self) -> &'static str {
        match self {
            RunnerMode::LocalDirect | RunnerMode::EnclaveDirect => "direct",
            RunnerMode::LocalSandbox | RunnerMode::EnclaveSandbox => "sandbox",
            RunnerMode::EnclaveSandboxPlus => "sandbox_plus",
        }
    }

    /// Name as written in scenario files.
    pub fn as_str(self) -> &'static str {
        match self {
            RunnerMode::LocalDirect => "local_direct",
            RunnerMode::LocalSandbox => "local_sandbox",
            RunnerMode::EnclaveDirect => "enclave_direct",
            RunnerMode::EnclaveSandbox => "enclave_sandbox",
            RunnerMode::EnclaveSandboxPlus => "enclave_sandbox_plus",
        }
    }

    /// Short label used in the analysis dataset.
    pub fn label(self) -> &'static str {
        match self {
            RunnerMode::LocalDirect => "H",
            RunnerMode::LocalSandbox => "HS",
            RunnerMode::EnclaveDirect => "E",
            RunnerMode::EnclaveSandbox => "ES",
            RunnerMode::EnclaveSandboxPlus => "ES+",
        }
    }

    /// Enclave modes have access to the NSM and thus real attestation.
    pub fn in_enclave(self) -> bool {
        self.start_mode() == StartMode::Nitro
    }
}

impl fmt::Display for RunnerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunnerMode {
    type Err = UnknownRunnerMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        RunnerMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == normalized)
            .ok_or_else(|| UnknownRunnerMode(s.to_string()))
    }
}

/// Subproject to build, optionally on a specific branch.
///
/// Written as `"dir"` or `"dir@branch"` in scenario files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTarget {
    pub subproject: String,
    pub branch: Option<String>,
}

impl BuildTarget {
    pub fn new(subproject: impl Into<String>, branch: Option<String>) -> Self {
        Self {
            subproject: subproject.into(),
            branch,
        }
    }

    /// Branch to dispatch remote workflows on.
    pub fn branch_or_default(&self) -> &str {
        self.branch.as_deref().unwrap_or("main")
    }
}

impl FromStr for BuildTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (subproject, branch) = match s.split_once('@') {
            Some((dir, branch)) => (dir, Some(branch.to_string())),
            None => (s, None),
        };

        if subproject.is_empty() {
            return Err(format!("target '{s}' has an empty subproject directory"));
        }
        if branch.as_deref() == Some("") {
            return Err(format!("target '{s}' has an empty branch after '@'"));
        }

        Ok(BuildTarget::new(subproject, branch))
    }
}

impl fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.branch {
            Some(branch) => write!(f, "{}@{}", self.subproject, branch),
            None => f.write_str(&self.subproject),
        }
    }
}

/// One row of a scenario: a single host-server execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioRun {
    pub name: String,
    pub mode: RunnerMode,
    pub fake_attestation: bool,
    pub big_job: bool,
    pub use_real_runner: bool,
    pub target: BuildTarget,
}

/// Ordered runs; the order is the execution order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Scenario {
    pub runs: Vec<ScenarioRun>,
}

impl Scenario {
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScenarioRun> {
        self.runs.iter()
    }
}
