// tests/scenario_generate.rs

use std::error::Error;

use evalrunner::errors::EvalError;
use evalrunner::scenario::{
    MatrixSpec, RunnerMode, generate_scenario, parse_scenario_csv, write_scenario_csv,
};

type TestResult = Result<(), Box<dyn Error>>;

fn spec(targets: &[&str]) -> MatrixSpec {
    MatrixSpec {
        targets: targets.iter().map(|t| t.to_string()).collect(),
        ..MatrixSpec::default()
    }
}

#[test]
fn row_count_is_iterations_times_targets_times_modes() -> TestResult {
    let scenario = generate_scenario(&spec(&["project_c_simple", "project_rust"]))?;
    assert_eq!(scenario.len(), 3 * 2 * RunnerMode::ALL.len());
    Ok(())
}

#[test]
fn order_is_iteration_then_target_then_mode() -> TestResult {
    let matrix = MatrixSpec {
        modes: vec![RunnerMode::LocalDirect, RunnerMode::EnclaveSandbox],
        iterations: 2,
        ..spec(&["a", "b"])
    };
    let scenario = generate_scenario(&matrix)?;

    let names: Vec<&str> = scenario.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        names,
        [
            "a_local_direct_1",
            "a_enclave_sandbox_1",
            "b_local_direct_1",
            "b_enclave_sandbox_1",
            "a_local_direct_2",
            "a_enclave_sandbox_2",
            "b_local_direct_2",
            "b_enclave_sandbox_2",
        ]
    );
    Ok(())
}

#[test]
fn fake_attestation_only_outside_the_enclave() -> TestResult {
    let scenario = generate_scenario(&MatrixSpec {
        iterations: 1,
        ..spec(&["a"])
    })?;
    for run in scenario.iter() {
        assert_eq!(run.fake_attestation, !run.mode.in_enclave(), "{}", run.name);
    }
    Ok(())
}

#[test]
fn branches_and_flags_are_applied() -> TestResult {
    let scenario = generate_scenario(&MatrixSpec {
        iterations: 1,
        big_job: true,
        use_real_runner: true,
        use_branches: true,
        ..spec(&["proj"])
    })?;
    for run in scenario.iter() {
        assert!(run.big_job);
        assert!(run.use_real_runner);
        assert_eq!(run.target.to_string(), "proj@proj");
    }
    Ok(())
}

#[test]
fn empty_inputs_are_rejected() {
    assert!(matches!(
        generate_scenario(&spec(&[])),
        Err(EvalError::ConfigError(_))
    ));
    assert!(matches!(
        generate_scenario(&MatrixSpec {
            modes: vec![],
            ..spec(&["a"])
        }),
        Err(EvalError::ConfigError(_))
    ));
    assert!(matches!(
        generate_scenario(&spec(&["a@b"])),
        Err(EvalError::ConfigError(_))
    ));
}

#[test]
fn path_like_targets_are_rejected() {
    for target in ["nested/project", "..", "up\\dir"] {
        assert!(
            matches!(generate_scenario(&spec(&[target])), Err(EvalError::ConfigError(_))),
            "{target}"
        );
    }
}

#[test]
fn written_file_parses_back() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("scenario.csv");

    let scenario = generate_scenario(&MatrixSpec {
        use_branches: true,
        ..spec(&["x", "y"])
    })?;
    write_scenario_csv(&scenario, &path)?;

    assert_eq!(parse_scenario_csv(&path)?, scenario);
    Ok(())
}
