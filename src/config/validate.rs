// src/config/validate.rs

use std::time::Duration;

use crate::config::duration::parse_duration;
use crate::config::model::{ConfigFile, RawConfigFile, RawRunSection, RunSection};
use crate::errors::{EvalError, Result};
use crate::exec::KillPatterns;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::EvalError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_host(&raw)?;
        let run = validate_run(&raw.run)?;
        validate_github(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.host, run, raw.github))
    }
}

fn validate_host(cfg: &RawConfigFile) -> Result<()> {
    if cfg.host.binary.as_os_str().is_empty() {
        return Err(EvalError::ConfigError(
            "[host].binary must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_run(run: &RawRunSection) -> Result<RunSection> {
    if run.timeout_seconds == 0 {
        return Err(EvalError::ConfigError(
            "[run].timeout_seconds must be >= 1 (got 0)".to_string(),
        ));
    }

    let poll_interval = duration_field("poll_interval", &run.poll_interval)?;
    if poll_interval.is_zero() {
        return Err(EvalError::ConfigError(
            "[run].poll_interval must be greater than zero".to_string(),
        ));
    }

    let kill_patterns = KillPatterns::new(&run.kill_patterns).map_err(|e| {
        EvalError::ConfigError(format!("[run].kill_patterns contains an invalid regex: {e}"))
    })?;

    Ok(RunSection {
        timeout: Duration::from_secs(run.timeout_seconds),
        settle_delay: duration_field("settle_delay", &run.settle_delay)?,
        poll_interval,
        grace_period: duration_field("grace_period", &run.grace_period)?,
        real_runner_extra_grace: duration_field(
            "real_runner_extra_grace",
            &run.real_runner_extra_grace,
        )?,
        drain_timeout: duration_field("drain_timeout", &run.drain_timeout)?,
        kill_patterns,
    })
}

fn validate_github(cfg: &RawConfigFile) -> Result<()> {
    if cfg.github.api_base.trim().is_empty() {
        return Err(EvalError::ConfigError(
            "[github].api_base must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn duration_field(field: &str, value: &str) -> Result<Duration> {
    parse_duration(value)
        .map_err(|e| EvalError::ConfigError(format!("[run].{field}: {e}")))
}
