#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use evalrunner::config::DEFAULT_KILL_PATTERNS;
use evalrunner::exec::{ExecSettings, KillPatterns, RunConfiguration, RunTemplate};
use evalrunner::scenario::{BuildTarget, RunnerMode, Scenario, ScenarioRun};
use evalrunner::trigger::GithubCredentials;

/// Builder for `ScenarioRun` to simplify test setup.
pub struct ScenarioRunBuilder {
    run: ScenarioRun,
}

impl ScenarioRunBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            run: ScenarioRun {
                name: name.to_string(),
                mode: RunnerMode::LocalDirect,
                fake_attestation: true,
                big_job: false,
                use_real_runner: false,
                target: BuildTarget::new("test", None),
            },
        }
    }

    pub fn mode(mut self, mode: RunnerMode) -> Self {
        self.run.mode = mode;
        self
    }

    pub fn fake_attestation(mut self, val: bool) -> Self {
        self.run.fake_attestation = val;
        self
    }

    pub fn big_job(mut self, val: bool) -> Self {
        self.run.big_job = val;
        self
    }

    pub fn real_runner(mut self, val: bool) -> Self {
        self.run.use_real_runner = val;
        self
    }

    pub fn target(mut self, target: &str) -> Self {
        self.run.target = target.parse().expect("invalid target in test");
        self
    }

    pub fn build(self) -> ScenarioRun {
        self.run
    }
}

/// Scenario of simulated local runs with the given names.
pub fn scenario_of(names: &[&str]) -> Scenario {
    Scenario {
        runs: names.iter().map(|n| ScenarioRunBuilder::new(n).build()).collect(),
    }
}

/// Builder for `RunTemplate`; defaults to a 5 s timeout in the current dir.
pub struct RunTemplateBuilder {
    template: RunTemplate,
}

impl RunTemplateBuilder {
    pub fn new() -> Self {
        Self {
            template: RunTemplate {
                timeout: Duration::from_secs(5),
                working_dir: PathBuf::from("."),
                github: None,
                kill_patterns: KillPatterns::new(DEFAULT_KILL_PATTERNS)
                    .expect("default kill patterns compile"),
            },
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.template.timeout = timeout;
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.template.working_dir = dir.into();
        self
    }

    pub fn github(mut self, repository: &str, token: &str) -> Self {
        self.template.github = Some(GithubCredentials {
            repository: repository.to_string(),
            token: token.to_string(),
        });
        self
    }

    pub fn kill_patterns(mut self, patterns: &[&str]) -> Self {
        self.template.kill_patterns =
            KillPatterns::new(patterns.iter().copied()).expect("invalid kill pattern in test");
        self
    }

    pub fn build(self) -> RunTemplate {
        self.template
    }

    /// Shortcut: configure `run` against the built template.
    pub fn configure(self, run: &ScenarioRun) -> RunConfiguration {
        self.template.configure(run)
    }
}

impl Default for RunTemplateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Executor settings with short grace/poll periods for process tests.
pub fn fast_exec_settings(binary: impl Into<PathBuf>) -> ExecSettings {
    ExecSettings {
        binary: binary.into(),
        sudo: false,
        echo_output: false,
        poll_interval: Duration::from_millis(50),
        grace_period: Duration::from_millis(300),
        real_runner_extra_grace: Duration::from_millis(200),
        drain_timeout: Duration::from_secs(2),
    }
}
