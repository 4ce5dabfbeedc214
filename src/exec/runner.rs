// src/exec/runner.rs

//! Single host-server run: launch, live capture, timeout, pattern kill.

use std::io::Write;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;
use tokio::time::{Instant, MissedTickBehavior, sleep_until};
use tracing::{debug, error, info, warn};

use crate::exec::command::HostCommand;
use crate::exec::kill::KillPatterns;
use crate::exec::outcome::{RunFailure, RunOutcome};
use crate::exec::streams::{Stream, StreamMux, spawn_line_reader};
use crate::exec::{ExecSettings, RunConfiguration};
use crate::trigger::{DispatchRequest, WorkflowDispatcher};

/// Limits and matching rules applied while a process runs.
#[derive(Debug, Clone)]
pub struct WatchPolicy {
    pub timeout: Duration,
    pub kill_patterns: KillPatterns,
    /// Wait between a kill-pattern match and the kill.
    pub grace_period: Duration,
    pub poll_interval: Duration,
    pub drain_timeout: Duration,
    /// Echo lines and print one progress dot per poll cycle on stdout.
    pub echo_output: bool,
}

impl WatchPolicy {
    pub fn for_run(settings: &ExecSettings, cfg: &RunConfiguration) -> Self {
        // The GitHub runner needs time to report its job before the host goes.
        let grace_period = if cfg.run.use_real_runner {
            settings.grace_period + settings.real_runner_extra_grace
        } else {
            settings.grace_period
        };

        Self {
            timeout: cfg.timeout,
            kill_patterns: cfg.kill_patterns.clone(),
            grace_period,
            poll_interval: settings.poll_interval,
            drain_timeout: settings.drain_timeout,
            echo_output: settings.echo_output,
        }
    }
}

/// Executes runs against the host server, dispatching the remote workflow
/// first when a run uses the real runner.
#[derive(Debug)]
pub struct HostExecutor<D> {
    settings: ExecSettings,
    dispatcher: D,
}

impl<D: WorkflowDispatcher> HostExecutor<D> {
    pub fn new(settings: ExecSettings, dispatcher: D) -> Self {
        Self {
            settings,
            dispatcher,
        }
    }

    pub fn settings(&self) -> &ExecSettings {
        &self.settings
    }

    /// Execute one run. Never retries; always returns exactly one outcome.
    pub async fn execute_run(&self, cfg: &RunConfiguration) -> RunOutcome {
        if cfg.run.use_real_runner {
            if let Err(failure) = self.trigger_remote(cfg).await {
                error!(run = %cfg.run.name, error = %failure, "precondition failed; host server not started");
                return RunOutcome::not_started(failure);
            }
        }

        // Under sudo a missing binary would only show up as sudo's exit code.
        if self.settings.sudo && !self.settings.binary.is_file() {
            let reason = format!("host server binary {:?} not found", self.settings.binary);
            error!(run = %cfg.run.name, %reason, "failed to launch host server");
            return RunOutcome {
                error: Some(RunFailure::Launch(reason.clone())),
                stdout: String::new(),
                stderr: reason,
            };
        }

        let command = HostCommand::for_run(&self.settings, cfg);
        info!(
            run = %cfg.run.name,
            cmd = %command,
            timeout_secs = cfg.timeout.as_secs(),
            "starting host server"
        );

        let policy = WatchPolicy::for_run(&self.settings, cfg);
        run_process(&command, &policy).await
    }

    async fn trigger_remote(&self, cfg: &RunConfiguration) -> Result<(), RunFailure> {
        let github = cfg.github.as_ref().ok_or(RunFailure::MissingCredentials)?;

        // Workflow files are named after the subproject they build.
        let request = DispatchRequest {
            repository: github.repository.clone(),
            workflow_id: cfg.run.target.subproject.clone(),
            branch: cfg.run.target.branch_or_default().to_string(),
            token: Some(github.token.clone()),
        };

        self.dispatcher.dispatch(&request).await?;
        info!(
            run = %cfg.run.name,
            repository = %request.repository,
            workflow = %request.workflow_id,
            "triggered workflow for real runner"
        );
        Ok(())
    }
}

/// What ended the watch loop.
enum Ending {
    Exited(std::io::Result<ExitStatus>),
    TimedOut,
    Matched(String),
}

/// Accumulated output of one process.
struct Capture {
    stdout: String,
    stderr: String,
    echo: bool,
}

impl Capture {
    fn new(echo: bool) -> Self {
        Self {
            stdout: String::new(),
            stderr: String::new(),
            echo,
        }
    }

    fn push(&mut self, stream: Stream, line: &str) {
        if self.echo {
            println!("[host-server:{stream}] {line}");
        }
        let buf = match stream {
            Stream::Stdout => &mut self.stdout,
            Stream::Stderr => &mut self.stderr,
        };
        buf.push_str(line);
        buf.push('\n');
    }

    fn progress(&self) {
        if self.echo {
            let mut out = std::io::stdout();
            let _ = write!(out, ".");
            let _ = out.flush();
        }
    }

    fn finish(self, error: Option<RunFailure>) -> RunOutcome {
        RunOutcome {
            error,
            stdout: self.stdout,
            stderr: self.stderr,
        }
    }
}

/// Run `command` to completion under `policy`.
///
/// A single loop waits on the two line channels, the child's exit, the
/// timeout deadline and the poll tick. Every forced stop is a kill followed
/// by a bounded drain, so output written before the stop is kept.
pub async fn run_process(command: &HostCommand, policy: &WatchPolicy) -> RunOutcome {
    let mut child = match command.to_command().spawn() {
        Ok(child) => child,
        Err(e) => {
            error!(cmd = %command, error = %e, "failed to launch host server");
            return RunOutcome {
                error: Some(RunFailure::Launch(e.to_string())),
                stdout: String::new(),
                stderr: e.to_string(),
            };
        }
    };

    let mut mux = StreamMux::new(
        spawn_line_reader(child.stdout.take(), Stream::Stdout),
        spawn_line_reader(child.stderr.take(), Stream::Stderr),
    );
    let mut capture = Capture::new(policy.echo_output);

    let started = Instant::now();
    let deadline = started + policy.timeout;
    let mut ticker = tokio::time::interval(policy.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let ending = loop {
        // Checked up front so a chatty process cannot starve the deadline.
        if Instant::now() >= deadline {
            break Ending::TimedOut;
        }

        tokio::select! {
            biased;

            next = mux.next(), if !mux.is_closed() => {
                if let Some((stream, line)) = next {
                    capture.push(stream, &line);
                    if let Some(pattern) = policy.kill_patterns.first_match(&line) {
                        info!(%pattern, %line, "killing host server because a kill pattern matched");
                        break Ending::Matched(pattern.to_string());
                    }
                }
            }
            status = child.wait() => break Ending::Exited(status),
            _ = sleep_until(deadline) => break Ending::TimedOut,
            _ = ticker.tick() => capture.progress(),
        }
    };

    let patterns = &policy.kill_patterns;
    let error = match ending {
        Ending::Exited(Ok(status)) => {
            let late = drain(&mut mux, &mut capture, patterns, policy.drain_timeout).await;
            let code = status.code().unwrap_or(-1);
            info!(
                exit_code = code,
                success = status.success(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "host server exited"
            );
            // The reader can hand over the last lines after `wait` returns.
            match late {
                Some(pattern) => {
                    info!(%pattern, "kill pattern matched in output read after exit");
                    Some(RunFailure::KilledByPattern { pattern })
                }
                None => (!status.success()).then_some(RunFailure::ProcessExited(code)),
            }
        }
        Ending::Exited(Err(e)) => {
            error!(error = %e, "failed waiting for host server");
            terminate(&mut child).await;
            match drain(&mut mux, &mut capture, patterns, policy.drain_timeout).await {
                Some(pattern) => Some(RunFailure::KilledByPattern { pattern }),
                None => Some(RunFailure::ProcessExited(-1)),
            }
        }
        Ending::TimedOut => {
            warn!(timeout_secs = policy.timeout.as_secs(), "host server timed out; killing");
            terminate(&mut child).await;
            drain(&mut mux, &mut capture, patterns, policy.drain_timeout).await;
            Some(RunFailure::Timeout {
                seconds: policy.timeout.as_secs(),
            })
        }
        Ending::Matched(pattern) => {
            debug!(grace_ms = policy.grace_period.as_millis() as u64, "waiting before kill");
            follow_for(&mut mux, &mut capture, &mut child, policy.grace_period).await;
            terminate(&mut child).await;
            drain(&mut mux, &mut capture, patterns, policy.drain_timeout).await;
            Some(RunFailure::KilledByPattern { pattern })
        }
    };

    if policy.echo_output {
        println!();
    }
    capture.finish(error)
}

/// Keep capturing for `period`, or until the child exits on its own.
async fn follow_for(mux: &mut StreamMux, capture: &mut Capture, child: &mut Child, period: Duration) {
    let until = Instant::now() + period;
    loop {
        tokio::select! {
            next = mux.next(), if !mux.is_closed() => {
                if let Some((stream, line)) = next {
                    capture.push(stream, &line);
                }
            }
            _ = child.wait() => return,
            _ = sleep_until(until) => return,
        }
    }
}

/// Forcefully kill the child, if it is still running.
async fn terminate(child: &mut Child) {
    if let Ok(Some(_)) = child.try_wait() {
        return;
    }
    if let Err(e) = child.kill().await {
        warn!(error = %e, "failed to kill host server");
    }
}

/// Collect what is left in the pipes, bounded by `limit`.
///
/// Returns the first kill pattern matched by a collected line. A grandchild
/// that inherited the pipes can keep them open after the child is gone; the
/// bound keeps such a run from hanging the sweep.
async fn drain(
    mux: &mut StreamMux,
    capture: &mut Capture,
    patterns: &KillPatterns,
    limit: Duration,
) -> Option<String> {
    let mut matched = None;
    let collect = async {
        while let Some((stream, line)) = mux.next().await {
            capture.push(stream, &line);
            if matched.is_none() {
                matched = patterns.first_match(&line).map(str::to_string);
            }
        }
    };

    if tokio::time::timeout(limit, collect).await.is_err() {
        warn!(limit_ms = limit.as_millis() as u64, "output drain timed out; pipes still open");
    }
    matched
}
