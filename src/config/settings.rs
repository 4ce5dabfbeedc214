// src/config/settings.rs

//! Fully resolved settings for one `evalrunner run` invocation.
//!
//! Built once at startup from the config file, CLI overrides and the process
//! environment, then handed down. Nothing below this layer looks at env vars.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::model::ConfigFile;
use crate::errors::{EvalError, Result};
use crate::exec::{ExecSettings, RunTemplate};
use crate::trigger::GithubCredentials;

/// Values taken from the process environment at startup.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    /// `GITHUB_REPOSITORY`, `owner/repo`.
    pub github_repository: Option<String>,
    /// `GITHUB_PAT_TOKEN`.
    pub github_token: Option<String>,
    /// `EVALRUNNER_LOG`.
    pub log_level: Option<String>,
}

impl Environment {
    pub fn from_process_env() -> Self {
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        Self {
            github_repository: non_empty("GITHUB_REPOSITORY"),
            github_token: non_empty("GITHUB_PAT_TOKEN"),
            log_level: non_empty("EVALRUNNER_LOG"),
        }
    }
}

/// CLI values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub timeout_seconds: Option<u64>,
    pub working_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub template: RunTemplate,
    pub settle_delay: Duration,
    pub exec: ExecSettings,
    pub github_api_base: String,
}

impl Settings {
    pub fn resolve(cfg: ConfigFile, overrides: &Overrides, env: &Environment) -> Result<Self> {
        let timeout = match overrides.timeout_seconds {
            Some(0) => {
                return Err(EvalError::ConfigError(
                    "--timeout must be >= 1 second (got 0)".to_string(),
                ));
            }
            Some(secs) => Duration::from_secs(secs),
            None => cfg.run.timeout,
        };

        let working_dir = overrides
            .working_dir
            .clone()
            .or_else(|| cfg.host.working_dir.clone())
            .unwrap_or_else(|| PathBuf::from("."));
        if !working_dir.is_dir() {
            return Err(EvalError::ConfigError(format!(
                "working directory {:?} does not exist or is not a directory",
                working_dir
            )));
        }

        let binary = if cfg.host.binary.is_absolute() {
            cfg.host.binary.clone()
        } else {
            working_dir.join(&cfg.host.binary)
        };

        let repository = env
            .github_repository
            .clone()
            .or_else(|| cfg.github.repository.clone());
        let github = match (repository, env.github_token.clone()) {
            (Some(repository), Some(token)) => {
                info!(%repository, "loaded GitHub configuration");
                Some(GithubCredentials { repository, token })
            }
            _ => {
                warn!("GitHub configuration not found; runs using the real runner will fail");
                None
            }
        };

        Ok(Self {
            template: RunTemplate {
                timeout,
                working_dir,
                github,
                kill_patterns: cfg.run.kill_patterns,
            },
            settle_delay: cfg.run.settle_delay,
            exec: ExecSettings {
                binary,
                sudo: cfg.host.sudo,
                echo_output: cfg.host.echo_output,
                poll_interval: cfg.run.poll_interval,
                grace_period: cfg.run.grace_period,
                real_runner_extra_grace: cfg.run.real_runner_extra_grace,
                drain_timeout: cfg.run.drain_timeout,
            },
            github_api_base: cfg.github.api_base,
        })
    }
}
