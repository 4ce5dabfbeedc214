// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The sweep driver talks to an `ExecutorBackend` instead of spawning
//! processes itself. Production uses [`RealExecutorBackend`], a
//! [`HostExecutor`] wired to the GitHub dispatcher; tests can provide a fake
//! that returns scripted outcomes without starting anything.

use std::future::Future;
use std::pin::Pin;

use crate::exec::outcome::RunOutcome;
use crate::exec::runner::HostExecutor;
use crate::exec::{HostCommand, RunConfiguration};
use crate::trigger::{GithubDispatcher, WorkflowDispatcher};

/// Trait abstracting how a single run is executed.
pub trait ExecutorBackend: Send {
    /// Execute the run and return its one outcome.
    fn execute(
        &mut self,
        cfg: RunConfiguration,
    ) -> Pin<Box<dyn Future<Output = RunOutcome> + Send + '_>>;

    /// The command line that would be executed, for `--dry-run`.
    ///
    /// Backends that don't start processes return `None`.
    fn describe(&self, cfg: &RunConfiguration) -> Option<HostCommand> {
        let _ = cfg;
        None
    }
}

/// Real executor backend used in production.
pub type RealExecutorBackend = HostExecutor<GithubDispatcher>;

impl<D: WorkflowDispatcher> ExecutorBackend for HostExecutor<D> {
    fn execute(
        &mut self,
        cfg: RunConfiguration,
    ) -> Pin<Box<dyn Future<Output = RunOutcome> + Send + '_>> {
        Box::pin(async move { self.execute_run(&cfg).await })
    }

    fn describe(&self, cfg: &RunConfiguration) -> Option<HostCommand> {
        Some(HostCommand::for_run(self.settings(), cfg))
    }
}
