// src/engine/driver.rs

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use tracing::{info, warn};

use crate::errors::Result;
use crate::exec::{ExecutorBackend, HostCommand, RunTemplate};
use crate::scenario::Scenario;
use crate::store::RunStore;

/// Drives a scenario sequentially and delegates each run to an
/// `ExecutorBackend`.
///
/// Runs never overlap: the next run is configured only after the previous
/// outcome was written to the store and the settle delay passed.
pub struct Sweep<E: ExecutorBackend> {
    executor: E,
    template: RunTemplate,
    settle_delay: Duration,
}

impl<E: ExecutorBackend> fmt::Debug for Sweep<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sweep")
            .field("template", &self.template)
            .field("settle_delay", &self.settle_delay)
            .finish_non_exhaustive()
    }
}

/// Counts per outcome status after a sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub total: usize,
    pub by_status: BTreeMap<&'static str, usize>,
    /// Names of runs that did not succeed, in execution order.
    pub failed: Vec<String>,
}

impl SweepSummary {
    pub fn succeeded(&self) -> usize {
        self.by_status.get("success").copied().unwrap_or(0)
    }
}

impl<E: ExecutorBackend> Sweep<E> {
    pub fn new(executor: E, template: RunTemplate, settle_delay: Duration) -> Self {
        Self {
            executor,
            template,
            settle_delay,
        }
    }

    /// Command lines the sweep would execute, in order.
    pub fn plan(&self, scenario: &Scenario) -> Vec<(String, Option<HostCommand>)> {
        scenario
            .iter()
            .map(|run| {
                let cfg = self.template.configure(run);
                (run.name.clone(), self.executor.describe(&cfg))
            })
            .collect()
    }

    /// Execute every run. Run failures are recorded, not returned; only a
    /// failure to persist output aborts the sweep.
    pub async fn run(mut self, scenario: &Scenario, store: &mut RunStore) -> Result<SweepSummary> {
        let total = scenario.len();
        let mut summary = SweepSummary {
            total,
            ..SweepSummary::default()
        };

        info!(runs = total, output = %store.dir().display(), "sweep started");

        for (idx, run) in scenario.iter().enumerate() {
            info!(run = %run.name, position = idx + 1, total, mode = %run.mode, target = %run.target, "run starting");

            let cfg = self.template.configure(run);
            let outcome = self.executor.execute(cfg).await;

            match &outcome.error {
                None => info!(run = %run.name, "run succeeded"),
                Some(failure) => {
                    warn!(run = %run.name, status = failure.kind(), error = %failure, "run failed");
                    summary.failed.push(run.name.clone());
                }
            }
            *summary.by_status.entry(outcome.status()).or_default() += 1;

            store.persist(&run.name, &outcome)?;

            // Give enclaves and runners time to go back to idle.
            if idx + 1 < total && !self.settle_delay.is_zero() {
                tokio::time::sleep(self.settle_delay).await;
            }
        }

        info!(
            total,
            succeeded = summary.succeeded(),
            failed = summary.failed.len(),
            "sweep finished"
        );
        Ok(summary)
    }
}
