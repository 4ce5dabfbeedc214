// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::scenario::RunnerMode;

/// Command-line arguments for `evalrunner`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "evalrunner",
    version,
    about = "Run host-server benchmark scenarios and derive build durations from their logs.",
    long_about = None
)]
pub struct CliArgs {
    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `EVALRUNNER_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Execute every run of a scenario file, one at a time.
    Run(RunArgs),
    /// Derive durations from the logs of one or more output directories.
    Analyze(AnalyzeArgs),
    /// Write a scenario file enumerating targets x runner modes x iterations.
    Generate(GenerateArgs),
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Scenario CSV file, or a directory containing `scenario.csv`.
    #[arg(value_name = "SCENARIO")]
    pub scenario: PathBuf,

    /// Path to the config file (TOML). Missing file means built-in defaults.
    #[arg(long, value_name = "PATH", default_value = "Evalrunner.toml")]
    pub config: PathBuf,

    /// Timeout for the host server in seconds (overrides the config).
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Working directory containing the host-server binary.
    #[arg(long, value_name = "DIR")]
    pub working_dir: Option<PathBuf>,

    /// Output directory name, relative to the scenario directory.
    ///
    /// Defaults to `output_<timestamp>`.
    #[arg(long, value_name = "NAME")]
    pub output_dir: Option<String>,

    /// Parse + validate, print each run's command line, but don't execute.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Args)]
pub struct AnalyzeArgs {
    /// Output directories produced by `evalrunner run`.
    #[arg(value_name = "OUTPUT_DIR", required = true)]
    pub output_dirs: Vec<PathBuf>,

    /// Where to write the merged dataset.
    #[arg(long, value_name = "PATH", default_value = "latest.csv")]
    pub out: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub struct GenerateArgs {
    /// Build targets (subproject directories). Repeat or comma-separate.
    #[arg(long = "target", value_name = "DIR", required = true, value_delimiter = ',')]
    pub targets: Vec<String>,

    /// Runner modes to include. Defaults to all of them.
    #[arg(long = "mode", value_name = "MODE", value_delimiter = ',')]
    pub modes: Vec<RunnerMode>,

    /// How many times each (target, mode) pair is repeated.
    #[arg(long, default_value_t = 3)]
    pub iterations: u32,

    /// Mark every run as a big job.
    #[arg(long)]
    pub big_job: bool,

    /// Use the real GitHub runner instead of the simulated one.
    #[arg(long)]
    pub real_runner: bool,

    /// Check out each target on a branch named like the target.
    #[arg(long)]
    pub use_branches: bool,

    /// Where to write the scenario file.
    #[arg(long, value_name = "PATH", default_value = "scenario.csv")]
    pub out: PathBuf,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
