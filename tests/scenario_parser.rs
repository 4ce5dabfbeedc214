// tests/scenario_parser.rs

mod common;
use crate::common::{demo_path, init_tracing};

use std::error::Error;

use evalrunner::errors::EvalError;
use evalrunner::scenario::{
    BuildTarget, RunnerMode, StartMode, parse_scenario_csv, parse_scenario_str,
    resolve_scenario_path,
};

type TestResult = Result<(), Box<dyn Error>>;

const HEADER: &str = "name,runner_start_mode,fake_attestation,big_job,use_real_runner,target";

#[test]
fn runner_modes_map_to_start_and_runner_mode() {
    let expected = [
        (RunnerMode::LocalDirect, StartMode::Local, "direct", "H"),
        (RunnerMode::LocalSandbox, StartMode::Local, "sandbox", "HS"),
        (RunnerMode::EnclaveDirect, StartMode::Nitro, "direct", "E"),
        (RunnerMode::EnclaveSandbox, StartMode::Nitro, "sandbox", "ES"),
        (RunnerMode::EnclaveSandboxPlus, StartMode::Nitro, "sandbox_plus", "ES+"),
    ];

    for (mode, start, runner, label) in expected {
        assert_eq!(mode.start_mode(), start, "{mode}");
        assert_eq!(mode.runner_mode(), runner, "{mode}");
        assert_eq!(mode.label(), label, "{mode}");
    }

    for mode in RunnerMode::ALL {
        assert!(!mode.start_mode().as_str().is_empty());
        assert!(!mode.runner_mode().is_empty());
        assert_eq!(mode.as_str().parse::<RunnerMode>().unwrap(), mode);
        assert_eq!(mode.in_enclave(), mode.start_mode() == StartMode::Nitro);
    }
}

#[test]
fn unknown_runner_mode_is_rejected() {
    let err = "local_turbo".parse::<RunnerMode>().unwrap_err();
    assert!(err.to_string().contains("local_turbo"));
}

#[test]
fn parses_demo_scenario() -> TestResult {
    init_tracing();

    let scenario = parse_scenario_csv(demo_path("scenario_test/scenario.csv"))?;
    assert_eq!(scenario.len(), 4);

    let names: Vec<&str> = scenario.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        names,
        ["local_direct_01", "local_sandbox_01", "enclave_direct_01", "enclave_sandbox_01"]
    );

    let run1 = &scenario.runs[0];
    assert_eq!(run1.mode, RunnerMode::LocalDirect);
    assert!(run1.fake_attestation);
    assert!(run1.big_job);
    assert!(!run1.use_real_runner);
    assert_eq!(run1.target, BuildTarget::new("project_c_simple", None));

    // Flags compare case-insensitively.
    let run2 = &scenario.runs[1];
    assert_eq!(run2.mode, RunnerMode::LocalSandbox);
    assert!(run2.fake_attestation);
    assert!(run2.big_job);
    assert_eq!(
        run2.target,
        BuildTarget::new("project_c_simple", Some("branch".to_string()))
    );

    let run3 = &scenario.runs[2];
    assert_eq!(run3.mode, RunnerMode::EnclaveDirect);
    assert!(!run3.use_real_runner);

    let run4 = &scenario.runs[3];
    assert_eq!(run4.mode, RunnerMode::EnclaveSandbox);
    assert_eq!(run4.target.branch.as_deref(), Some("brunch"));

    Ok(())
}

#[test]
fn parsing_twice_yields_identical_runs() -> TestResult {
    let path = demo_path("scenario_test/scenario.csv");
    let first = parse_scenario_csv(&path)?;
    let second = parse_scenario_csv(&path)?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn directory_resolves_to_scenario_csv() {
    let dir = demo_path("scenario_test");
    assert_eq!(resolve_scenario_path(&dir), dir.join("scenario.csv"));

    let file = dir.join("scenario.csv");
    assert_eq!(resolve_scenario_path(&file), file);
}

#[test]
fn target_round_trip() {
    let with_branch: BuildTarget = "dir@branch".parse().unwrap();
    assert_eq!(with_branch.subproject, "dir");
    assert_eq!(with_branch.branch.as_deref(), Some("branch"));
    assert_eq!(with_branch.to_string(), "dir@branch");
    assert_eq!(with_branch.branch_or_default(), "branch");

    let bare: BuildTarget = "dir".parse().unwrap();
    assert_eq!(bare.subproject, "dir");
    assert_eq!(bare.branch, None);
    assert_eq!(bare.to_string(), "dir");
    assert_eq!(bare.branch_or_default(), "main");
}

#[test]
fn malformed_targets_are_rejected() {
    assert!("@branch".parse::<BuildTarget>().is_err());
    assert!("dir@".parse::<BuildTarget>().is_err());
    assert!("".parse::<BuildTarget>().is_err());
}

#[test]
fn comments_are_not_counted() -> TestResult {
    let csv = format!(
        "# leading comment\n{HEADER}\n# between\na,local_direct,true,false,false,proj\n#b,local_direct,true,false,false,proj\n"
    );
    let scenario = parse_scenario_str(&csv)?;
    assert_eq!(scenario.len(), 1);
    assert_eq!(scenario.runs[0].name, "a");
    Ok(())
}

#[test]
fn missing_column_is_a_header_error() {
    let csv = "name,runner_start_mode,fake_attestation,big_job,target\na,local_direct,true,false,proj\n";
    match parse_scenario_str(csv) {
        Err(EvalError::ScenarioHeader(msg)) => assert!(msg.contains("use_real_runner"), "{msg}"),
        other => panic!("expected header error, got {other:?}"),
    }
}

#[test]
fn bad_mode_rejects_the_whole_file() {
    let csv = format!(
        "{HEADER}\na,local_direct,true,false,false,proj\nb,warp_drive,true,false,false,proj\n"
    );
    match parse_scenario_str(&csv) {
        Err(EvalError::ParseError(msg)) => {
            assert!(msg.contains("row 2"), "{msg}");
            assert!(msg.contains("warp_drive"), "{msg}");
        }
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn duplicate_run_names_are_rejected() {
    let csv = format!(
        "{HEADER}\na,local_direct,true,false,false,proj\na,local_sandbox,true,false,false,proj\n"
    );
    match parse_scenario_str(&csv) {
        Err(EvalError::ParseError(msg)) => assert!(msg.contains("duplicate"), "{msg}"),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn run_names_must_be_plain_file_names() {
    for name in ["../escape", "a/b", "a\\b", ".", "x..y"] {
        let csv = format!("{HEADER}\n{name},local_direct,true,false,false,proj\n");
        match parse_scenario_str(&csv) {
            Err(EvalError::ParseError(msg)) => {
                assert!(msg.contains("row 1"), "{msg}");
                assert!(msg.contains("plain file name"), "{msg}");
            }
            other => panic!("expected parse error for {name:?}, got {other:?}"),
        }
    }
}

#[test]
fn anything_but_true_is_false() -> TestResult {
    let csv = format!("{HEADER}\na,enclave_direct,yes,1,TrUe,proj\n");
    let scenario = parse_scenario_str(&csv)?;
    let run = &scenario.runs[0];
    assert!(!run.fake_attestation);
    assert!(!run.big_job);
    assert!(run.use_real_runner);
    Ok(())
}
