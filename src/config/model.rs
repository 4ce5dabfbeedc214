// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::exec::KillPatterns;

/// Lines that mean the host server has nothing left to do for this run.
pub const DEFAULT_KILL_PATTERNS: [&str; 3] = [
    "Enclave client finished",
    "Finished interacting with the enclave client",
    "Host proxy failed to start",
];

pub const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";

/// Configuration as read from an `Evalrunner.toml` file.
///
/// ```toml
/// [host]
/// binary = "target/debug/host-server"
/// sudo = true
///
/// [run]
/// timeout_seconds = 120
/// settle_delay = "5s"
/// kill_patterns = ["Enclave client finished"]
///
/// [github]
/// repository = "owner/repo"
/// ```
///
/// All sections are optional and have the defaults used for the published
/// evaluation.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub host: HostSection,

    #[serde(default)]
    pub run: RawRunSection,

    #[serde(default)]
    pub github: GithubSection,
}

/// `[host]` section: how the host server is started.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostSection {
    /// Host-server executable, resolved against the working directory when
    /// relative.
    #[serde(default = "default_binary")]
    pub binary: PathBuf,

    /// Prefix the command with `sudo`; the host server needs root to manage
    /// enclaves and sandboxes.
    #[serde(default = "default_true")]
    pub sudo: bool,

    /// Echo host output lines and progress dots on stdout.
    #[serde(default = "default_true")]
    pub echo_output: bool,

    /// Directory the host server runs in. CLI `--working-dir` wins.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

impl Default for HostSection {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            sudo: true,
            echo_output: true,
            working_dir: None,
        }
    }
}

/// `[run]` section with durations still in their string form.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawRunSection {
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Pause after each run so enclaves and runners can tear down.
    #[serde(default = "default_settle_delay")]
    pub settle_delay: String,

    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,

    /// Wait between a kill-pattern match and the kill.
    #[serde(default = "default_grace_period")]
    pub grace_period: String,

    /// Added to `grace_period` for runs using the real GitHub runner.
    #[serde(default = "default_real_runner_extra_grace")]
    pub real_runner_extra_grace: String,

    /// Upper bound on collecting output after the process is gone.
    #[serde(default = "default_drain_timeout")]
    pub drain_timeout: String,

    /// Regexes searched in every output line; first hit ends the run.
    #[serde(default = "default_kill_patterns")]
    pub kill_patterns: Vec<String>,
}

impl Default for RawRunSection {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            settle_delay: default_settle_delay(),
            poll_interval: default_poll_interval(),
            grace_period: default_grace_period(),
            real_runner_extra_grace: default_real_runner_extra_grace(),
            drain_timeout: default_drain_timeout(),
            kill_patterns: default_kill_patterns(),
        }
    }
}

/// `[github]` section. The token is never stored in the file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GithubSection {
    /// `owner/repo` hosting the runner workflows.
    #[serde(default)]
    pub repository: Option<String>,

    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for GithubSection {
    fn default() -> Self {
        Self {
            repository: None,
            api_base: default_api_base(),
        }
    }
}

/// Validated configuration; build it with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub host: HostSection,
    pub run: RunSection,
    pub github: GithubSection,
}

/// `[run]` after validation.
#[derive(Debug, Clone)]
pub struct RunSection {
    pub timeout: Duration,
    pub settle_delay: Duration,
    pub poll_interval: Duration,
    pub grace_period: Duration,
    pub real_runner_extra_grace: Duration,
    pub drain_timeout: Duration,
    pub kill_patterns: KillPatterns,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(host: HostSection, run: RunSection, github: GithubSection) -> Self {
        Self { host, run, github }
    }
}

fn default_binary() -> PathBuf {
    PathBuf::from("target/debug/host-server")
}

fn default_true() -> bool {
    true
}

fn default_timeout_seconds() -> u64 {
    120
}

fn default_settle_delay() -> String {
    "5s".to_string()
}

fn default_poll_interval() -> String {
    "100ms".to_string()
}

fn default_grace_period() -> String {
    "2s".to_string()
}

fn default_real_runner_extra_grace() -> String {
    "8s".to_string()
}

fn default_drain_timeout() -> String {
    "5s".to_string()
}

fn default_kill_patterns() -> Vec<String> {
    DEFAULT_KILL_PATTERNS.iter().map(|s| s.to_string()).collect()
}

fn default_api_base() -> String {
    DEFAULT_GITHUB_API_BASE.to_string()
}
