// src/lib.rs

pub mod analysis;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod scenario;
pub mod store;
pub mod trigger;

use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use tracing::{debug, info, warn};

use crate::analysis::build_dataset;
use crate::cli::{AnalyzeArgs, CliArgs, Command, GenerateArgs, RunArgs};
use crate::config::{Environment, Overrides, Settings, load_or_default};
use crate::engine::Sweep;
use crate::errors::{EvalError, Result};
use crate::exec::{ExecutorBackend, HostExecutor};
use crate::scenario::{
    MatrixSpec, RunnerMode, Scenario, generate_scenario, parse_scenario_csv,
    resolve_scenario_path, write_scenario_csv,
};
use crate::store::{RunStore, default_output_dir_name};
use crate::trigger::GithubDispatcher;

/// High-level entry point used by `main.rs`.
///
/// `env` is read once by `main`; nothing below this point touches the
/// process environment.
pub async fn run(args: CliArgs, env: Environment) -> Result<()> {
    match args.command {
        Command::Run(run_args) => run_scenario(run_args, &env).await,
        Command::Analyze(analyze_args) => analyze(analyze_args),
        Command::Generate(generate_args) => generate(generate_args),
    }
}

/// `evalrunner run`: execute every run of a scenario sequentially.
///
/// This wires together:
/// - config loading and CLI/env overrides
/// - scenario parsing (fully, before anything executes)
/// - the output directory
/// - the host executor and GitHub dispatcher
/// - Ctrl-C handling
async fn run_scenario(args: RunArgs, env: &Environment) -> Result<()> {
    let scenario_path = resolve_scenario_path(&args.scenario);
    let scenario = parse_scenario_csv(&scenario_path)?;
    info!(path = %scenario_path.display(), runs = scenario.len(), "loaded scenario");

    let cfg = load_or_default(&args.config)?;
    let overrides = Overrides {
        timeout_seconds: args.timeout,
        working_dir: args.working_dir.clone(),
    };
    let settings = Settings::resolve(cfg, &overrides, env)?;

    let dispatcher = GithubDispatcher::new(settings.github_api_base.clone())?;
    let executor = HostExecutor::new(settings.exec.clone(), dispatcher);

    if args.dry_run {
        print_settings(&settings);
        let sweep = Sweep::new(executor, settings.template, settings.settle_delay);
        print_dry_run(&scenario, &sweep.plan(&scenario));
        return Ok(());
    }

    if settings.exec.sudo {
        ensure_sudo().await?;
    }

    let output_dir = output_dir_for(&scenario_path, args.output_dir.as_deref());
    let mut store = RunStore::create(&output_dir)?;
    store.copy_scenario(&scenario_path)?;
    info!(dir = %output_dir.display(), "writing run output");

    let sweep = Sweep::new(executor, settings.template, settings.settle_delay);
    run_until_interrupted(sweep, &scenario, &mut store).await
}

async fn run_until_interrupted<E: ExecutorBackend>(
    sweep: Sweep<E>,
    scenario: &Scenario,
    store: &mut RunStore,
) -> Result<()> {
    let dir = store.dir().to_path_buf();

    // Dropping the sweep future kills the running host server.
    tokio::select! {
        summary = sweep.run(scenario, store) => {
            let summary = summary?;
            if !summary.failed.is_empty() {
                warn!(failed = ?summary.failed, "some runs did not succeed; see outcomes.csv");
            }
            println!(
                "{} of {} runs succeeded; output in {}",
                summary.succeeded(),
                summary.total,
                dir.display()
            );
            Ok(())
        }
        res = tokio::signal::ctrl_c() => {
            res.context("listening for Ctrl+C")?;
            warn!(dir = %dir.display(), "interrupted; completed runs are kept");
            Err(EvalError::Other(anyhow!("sweep interrupted")))
        }
    }
}

/// Output directory inside the scenario's directory.
fn output_dir_for(scenario_path: &Path, name: Option<&str>) -> PathBuf {
    let base = match scenario_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let name = name
        .map(str::to_string)
        .unwrap_or_else(|| default_output_dir_name(&chrono::Local::now()));
    base.join(name)
}

/// The host server needs root; check once before the first run instead of
/// letting every run fail on a password prompt.
async fn ensure_sudo() -> Result<()> {
    let output = tokio::process::Command::new("sudo")
        .arg("whoami")
        .stdin(std::process::Stdio::null())
        .output()
        .await
        .context("running `sudo whoami`")?;

    let user = String::from_utf8_lossy(&output.stdout);
    if !output.status.success() || user.trim() != "root" {
        return Err(EvalError::ConfigError(format!(
            "sudo is required but `sudo whoami` returned {:?} (status {})",
            user.trim(),
            output.status
        )));
    }
    debug!("sudo preflight passed");
    Ok(())
}

/// `evalrunner analyze`: merge output directories into one dataset.
fn analyze(args: AnalyzeArgs) -> Result<()> {
    let dataset = build_dataset(&args.output_dirs)?;
    if dataset.is_empty() {
        warn!("no run logs found; writing an empty dataset");
    }
    dataset.write_csv(&args.out)?;
    println!("wrote {} rows to {}", dataset.len(), args.out.display());
    Ok(())
}

/// `evalrunner generate`: write a scenario matrix.
fn generate(args: GenerateArgs) -> Result<()> {
    let modes = if args.modes.is_empty() {
        RunnerMode::ALL.to_vec()
    } else {
        args.modes
    };
    let spec = MatrixSpec {
        targets: args.targets,
        modes,
        iterations: args.iterations,
        big_job: args.big_job,
        use_real_runner: args.real_runner,
        use_branches: args.use_branches,
    };

    let scenario = generate_scenario(&spec)?;
    write_scenario_csv(&scenario, &args.out)?;
    println!("wrote {} runs to {}", scenario.len(), args.out.display());
    Ok(())
}

fn print_settings(settings: &Settings) {
    println!("evalrunner dry-run");
    println!("  host.binary = {}", settings.exec.binary.display());
    println!("  host.sudo = {}", settings.exec.sudo);
    println!("  run.working_dir = {}", settings.template.working_dir.display());
    println!("  run.timeout = {:?}", settings.template.timeout);
    println!("  run.settle_delay = {:?}", settings.settle_delay);
    println!("  run.grace_period = {:?}", settings.exec.grace_period);
    println!(
        "  run.kill_patterns = {:?}",
        settings.template.kill_patterns.as_strs().collect::<Vec<_>>()
    );
    match &settings.template.github {
        Some(github) => println!("  github.repository = {}", github.repository),
        None => println!("  github = (not configured)"),
    }
    println!();
}

/// Print each run's command line without executing anything.
fn print_dry_run(scenario: &Scenario, plan: &[(String, Option<exec::HostCommand>)]) {
    println!("runs ({}):", scenario.len());
    for (run, (name, command)) in scenario.iter().zip(plan) {
        println!("  - {name}");
        println!("      mode: {} ({})", run.mode, run.mode.label());
        println!("      target: {}", run.target);
        if run.use_real_runner {
            println!("      remote workflow: {}@{}", run.target.subproject, run.target.branch_or_default());
        }
        if let Some(cmd) = command {
            println!("      cmd: {cmd}");
        }
    }

    debug!("dry-run complete (no execution)");
}
