// tests/config_loading.rs

mod common;
use crate::common::demo_path;

use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use evalrunner::config::{
    ConfigFile, DEFAULT_KILL_PATTERNS, Environment, Overrides, RawConfigFile, Settings,
    load_and_validate, load_or_default,
};
use evalrunner::errors::EvalError;

type TestResult = Result<(), Box<dyn Error>>;

fn parse(toml_src: &str) -> Result<ConfigFile, EvalError> {
    let raw: RawConfigFile = toml::from_str(toml_src)?;
    ConfigFile::try_from(raw)
}

#[test]
fn defaults_match_the_published_evaluation() -> TestResult {
    let cfg = ConfigFile::try_from(RawConfigFile::default())?;

    assert_eq!(cfg.host.binary, PathBuf::from("target/debug/host-server"));
    assert!(cfg.host.sudo);
    assert!(cfg.host.echo_output);
    assert_eq!(cfg.run.timeout, Duration::from_secs(120));
    assert_eq!(cfg.run.settle_delay, Duration::from_secs(5));
    assert_eq!(cfg.run.poll_interval, Duration::from_millis(100));
    assert_eq!(cfg.run.grace_period, Duration::from_secs(2));
    assert_eq!(cfg.run.real_runner_extra_grace, Duration::from_secs(8));
    assert_eq!(
        cfg.run.kill_patterns.as_strs().collect::<Vec<_>>(),
        DEFAULT_KILL_PATTERNS.to_vec()
    );
    assert_eq!(cfg.github.repository, None);
    assert_eq!(cfg.github.api_base, "https://api.github.com");
    Ok(())
}

#[test]
fn demo_config_loads() -> TestResult {
    let cfg = load_and_validate(demo_path("Evalrunner.toml"))?;
    assert_eq!(cfg.run.timeout, Duration::from_secs(120));
    assert_eq!(cfg.run.kill_patterns.len(), 3);
    assert_eq!(cfg.github.repository.as_deref(), Some("owner/repo"));
    Ok(())
}

#[test]
fn partial_config_keeps_other_defaults() -> TestResult {
    let cfg = parse(
        r#"
        [run]
        timeout_seconds = 30
        grace_period = "500ms"
        kill_patterns = ["^done$"]
        "#,
    )?;
    assert_eq!(cfg.run.timeout, Duration::from_secs(30));
    assert_eq!(cfg.run.grace_period, Duration::from_millis(500));
    assert_eq!(cfg.run.settle_delay, Duration::from_secs(5));
    assert!(cfg.run.kill_patterns.matches("done"));
    assert!(!cfg.run.kill_patterns.matches("not done yet"));
    assert!(cfg.host.sudo);
    Ok(())
}

#[test]
fn zero_timeout_is_rejected() {
    let err = parse("[run]\ntimeout_seconds = 0\n").unwrap_err();
    assert!(matches!(err, EvalError::ConfigError(_)), "{err}");
}

#[test]
fn invalid_kill_pattern_is_rejected() {
    let err = parse("[run]\nkill_patterns = [\"(unclosed\"]\n").unwrap_err();
    match err {
        EvalError::ConfigError(msg) => assert!(msg.contains("kill_patterns"), "{msg}"),
        other => panic!("expected config error, got {other:?}"),
    }
}

#[test]
fn invalid_duration_is_rejected() {
    let err = parse("[run]\nsettle_delay = \"5 parsecs\"\n").unwrap_err();
    match err {
        EvalError::ConfigError(msg) => assert!(msg.contains("settle_delay"), "{msg}"),
        other => panic!("expected config error, got {other:?}"),
    }

    let err = parse("[run]\npoll_interval = \"0ms\"\n").unwrap_err();
    assert!(matches!(err, EvalError::ConfigError(_)));
}

#[test]
fn unknown_keys_are_rejected() {
    let err = parse("[host]\nbinnary = \"x\"\n").unwrap_err();
    assert!(matches!(err, EvalError::TomlError(_)), "{err}");
}

#[test]
fn missing_file_falls_back_to_defaults() -> TestResult {
    let dir = tempfile::tempdir()?;
    let cfg = load_or_default(dir.path().join("Evalrunner.toml"))?;
    assert_eq!(cfg.run.timeout, Duration::from_secs(120));
    Ok(())
}

#[test]
fn broken_file_is_still_an_error() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("Evalrunner.toml");
    fs::write(&path, "[run\n")?;
    assert!(load_or_default(&path).is_err());
    Ok(())
}

#[test]
fn settings_resolve_overrides_and_environment() -> TestResult {
    let dir = tempfile::tempdir()?;
    let cfg = parse("[github]\nrepository = \"file/repo\"\n")?;

    let overrides = Overrides {
        timeout_seconds: Some(30),
        working_dir: Some(dir.path().to_path_buf()),
    };
    let env = Environment {
        github_repository: Some("env/repo".to_string()),
        github_token: Some("secret".to_string()),
        log_level: None,
    };

    let settings = Settings::resolve(cfg, &overrides, &env)?;
    assert_eq!(settings.template.timeout, Duration::from_secs(30));
    assert_eq!(settings.template.working_dir, dir.path());
    assert_eq!(
        settings.exec.binary,
        dir.path().join("target/debug/host-server")
    );

    let github = settings.template.github.expect("credentials resolved");
    assert_eq!(github.repository, "env/repo");
    assert_eq!(github.token, "secret");
    assert!(!format!("{github:?}").contains("secret"));
    Ok(())
}

#[test]
fn credentials_need_both_repository_and_token() -> TestResult {
    let dir = tempfile::tempdir()?;
    let overrides = Overrides {
        timeout_seconds: None,
        working_dir: Some(dir.path().to_path_buf()),
    };

    let cfg = parse("[github]\nrepository = \"file/repo\"\n")?;
    let settings = Settings::resolve(cfg, &overrides, &Environment::default())?;
    assert!(settings.template.github.is_none());
    assert_eq!(settings.template.timeout, Duration::from_secs(120));
    Ok(())
}

#[test]
fn invalid_overrides_are_rejected() -> TestResult {
    let dir = tempfile::tempdir()?;
    let env = Environment::default();

    let zero = Overrides {
        timeout_seconds: Some(0),
        working_dir: Some(dir.path().to_path_buf()),
    };
    assert!(matches!(
        Settings::resolve(parse("")?, &zero, &env),
        Err(EvalError::ConfigError(_))
    ));

    let missing_dir = Overrides {
        timeout_seconds: None,
        working_dir: Some(dir.path().join("nope")),
    };
    assert!(matches!(
        Settings::resolve(parse("")?, &missing_dir, &env),
        Err(EvalError::ConfigError(_))
    ));
    Ok(())
}
