// tests/process_runner.rs
#![cfg(unix)]

mod common;
use crate::common::{init_tracing, with_timeout};

use std::path::PathBuf;
use std::time::{Duration, Instant};

use evalrunner::exec::{HostCommand, KillPatterns, RunFailure, WatchPolicy, host_args, run_process};
use evalrunner_test_utils::builders::{RunTemplateBuilder, ScenarioRunBuilder, fast_exec_settings};
use evalrunner::scenario::RunnerMode;

fn sh(script: &str) -> HostCommand {
    HostCommand::new(
        "sh",
        vec!["-c".to_string(), script.to_string()],
        std::env::temp_dir(),
    )
}

fn policy(timeout: Duration, patterns: &[&str]) -> WatchPolicy {
    WatchPolicy {
        timeout,
        kill_patterns: KillPatterns::new(patterns.iter().copied()).unwrap(),
        grace_period: Duration::from_millis(300),
        poll_interval: Duration::from_millis(50),
        drain_timeout: Duration::from_secs(2),
        echo_output: false,
    }
}

#[tokio::test]
async fn clean_exit_is_success() {
    init_tracing();

    let outcome = with_timeout(run_process(
        &sh("echo hello; echo oops 1>&2"),
        &policy(Duration::from_secs(5), &[]),
    ))
    .await;

    assert_eq!(outcome.error, None);
    assert_eq!(outcome.status(), "success");
    assert_eq!(outcome.stdout, "hello\n");
    assert_eq!(outcome.stderr, "oops\n");
}

#[tokio::test]
async fn non_zero_exit_is_process_failed() {
    init_tracing();

    let outcome = with_timeout(run_process(
        &sh("echo out; echo err 1>&2; exit 3"),
        &policy(Duration::from_secs(5), &[]),
    ))
    .await;

    assert_eq!(outcome.error, Some(RunFailure::ProcessExited(3)));
    assert_eq!(outcome.status(), "process-failed");
    assert_eq!(outcome.stdout, "out\n");
    assert_eq!(outcome.stderr, "err\n");
}

#[tokio::test]
async fn long_run_times_out_and_keeps_output() {
    init_tracing();

    let started = Instant::now();
    let outcome = with_timeout(run_process(
        &sh("echo before; exec sleep 30"),
        &policy(Duration::from_secs(1), &[]),
    ))
    .await;

    assert_eq!(outcome.error, Some(RunFailure::Timeout { seconds: 1 }));
    assert_eq!(outcome.stdout, "before\n");
    assert!(started.elapsed() < Duration::from_secs(5), "{:?}", started.elapsed());
}

#[tokio::test]
async fn kill_pattern_ends_run_within_grace_period() {
    init_tracing();

    let started = Instant::now();
    let outcome = with_timeout(run_process(
        &sh("echo starting; echo 'Enclave client finished'; echo after; exec sleep 30"),
        &policy(Duration::from_secs(20), &["Enclave client finished"]),
    ))
    .await;

    assert_eq!(
        outcome.error,
        Some(RunFailure::KilledByPattern {
            pattern: "Enclave client finished".to_string()
        })
    );
    assert_eq!(outcome.status(), "killed-by-pattern");
    assert!(outcome.stdout.contains("starting\n"));
    assert!(outcome.stdout.contains("Enclave client finished\n"));
    // Lines written during the grace period are kept.
    assert!(outcome.stdout.contains("after\n"));
    assert!(started.elapsed() < Duration::from_secs(5), "{:?}", started.elapsed());
}

#[tokio::test]
async fn kill_pattern_on_stderr_counts_too() {
    init_tracing();

    let outcome = with_timeout(run_process(
        &sh("echo 'Host proxy failed to start' 1>&2; exec sleep 30"),
        &policy(Duration::from_secs(20), &["Host proxy failed"]),
    ))
    .await;

    assert!(
        matches!(outcome.error, Some(RunFailure::KilledByPattern { .. })),
        "{:?}",
        outcome.error
    );
    assert_eq!(outcome.stderr, "Host proxy failed to start\n");
}

#[tokio::test]
async fn kill_pattern_wins_over_exit_code_when_process_exits_first() {
    init_tracing();

    // The process can be gone before its last line is read; the outcome
    // must not depend on which side of the exit the line lands.
    for attempt in 0..25 {
        let outcome = with_timeout(run_process(
            &sh("echo 'Enclave client finished'; exit 3"),
            &policy(Duration::from_secs(5), &["Enclave client finished"]),
        ))
        .await;

        assert_eq!(
            outcome.error,
            Some(RunFailure::KilledByPattern {
                pattern: "Enclave client finished".to_string()
            }),
            "attempt {attempt}"
        );
        assert_eq!(outcome.status(), "killed-by-pattern");
        assert_eq!(outcome.stdout, "Enclave client finished\n");
    }
}

#[tokio::test]
async fn missing_binary_is_a_launch_error() {
    init_tracing();

    let cmd = HostCommand::new(
        "/nonexistent/evalrunner/host-server",
        vec!["local".to_string()],
        std::env::temp_dir(),
    );
    let outcome = with_timeout(run_process(&cmd, &policy(Duration::from_secs(5), &[]))).await;

    assert!(matches!(outcome.error, Some(RunFailure::Launch(_))));
    assert_eq!(outcome.status(), "launch-error");
    assert!(outcome.stdout.is_empty());
    assert!(!outcome.stderr.is_empty());
}

#[test]
fn host_args_for_simulated_local_run() {
    let run = ScenarioRunBuilder::new("r")
        .mode(RunnerMode::LocalDirect)
        .fake_attestation(true)
        .big_job(true)
        .target("project_c_simple@branch")
        .build();

    assert_eq!(
        host_args(&run),
        [
            "local",
            "--runner-start-mode=direct",
            "--simulate-log-publishing",
            "--simulate-webhook-event",
            "--simulate-client-use-fake-runner=project_c_simple@branch",
            "--simulate-client-use-fake-attestation",
            "--big-job",
        ]
    );
}

#[test]
fn host_args_for_real_runner_in_enclave() {
    let run = ScenarioRunBuilder::new("r")
        .mode(RunnerMode::EnclaveSandboxPlus)
        .fake_attestation(false)
        .real_runner(true)
        .target("project_c_simple")
        .build();

    assert_eq!(
        host_args(&run),
        [
            "nitro",
            "--runner-start-mode=sandbox_plus",
            "--simulate-log-publishing",
            "--simulate-webhook-event",
        ]
    );
}

#[test]
fn sudo_prefixes_the_binary() {
    let run = ScenarioRunBuilder::new("r").build();
    let cfg = RunTemplateBuilder::new().working_dir("/work").configure(&run);

    let mut settings = fast_exec_settings("/work/target/debug/host-server");
    settings.sudo = true;
    let cmd = HostCommand::for_run(&settings, &cfg);
    assert_eq!(cmd.program, PathBuf::from("sudo"));
    assert_eq!(cmd.args[0], "/work/target/debug/host-server");
    assert_eq!(cmd.args[1], "local");
    assert_eq!(cmd.working_dir, PathBuf::from("/work"));

    settings.sudo = false;
    let cmd = HostCommand::for_run(&settings, &cfg);
    assert_eq!(cmd.program, PathBuf::from("/work/target/debug/host-server"));
    assert_eq!(cmd.args[0], "local");
    assert_eq!(
        cmd.to_string(),
        "/work/target/debug/host-server local --runner-start-mode=direct --simulate-log-publishing --simulate-webhook-event --simulate-client-use-fake-runner=test --simulate-client-use-fake-attestation"
    );
}

#[test]
fn real_runner_gets_extra_grace() {
    let settings = fast_exec_settings("host-server");

    let simulated = RunTemplateBuilder::new().configure(&ScenarioRunBuilder::new("a").build());
    assert_eq!(
        WatchPolicy::for_run(&settings, &simulated).grace_period,
        settings.grace_period
    );

    let real = RunTemplateBuilder::new()
        .configure(&ScenarioRunBuilder::new("b").real_runner(true).build());
    assert_eq!(
        WatchPolicy::for_run(&settings, &real).grace_period,
        settings.grace_period + settings.real_runner_extra_grace
    );
}
