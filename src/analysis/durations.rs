// src/analysis/durations.rs

//! Derived build/boot durations of one run.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::analysis::timestamps::collect_timestamps;

/// Marker logged when the (simulated) webhook reached the host; all offsets
/// are relative to it.
pub const REFERENCE_KEY: &str = "WEBHOOK";

pub const BUILD_START: &str = "BUILD_START";
pub const BUILD_END: &str = "BUILD_END";
pub const POST_CONFIGURE: &str = "POST_CONFIGURE";
pub const POST_MAKE: &str = "POST_MAKE";
pub const POST_MAKE_CHECK: &str = "POST_MAKE_CHECK";
pub const PRE_CHECKOUT: &str = "PRE_CHECKOUT";
pub const POST_CHECKOUT: &str = "POST_CHECKOUT";
pub const ENCLAVE_STARTED: &str = "ENCLAVE_STARTED";
pub const ENCLAVE_CONNECTED: &str = "ENCLAVE_CONNECTED";
pub const CONFIG_DONE: &str = "CONFIG_DONE";

/// Offset column of the derived artifact-ready instant.
pub const ARTIFACT_READY_COLUMN: &str = "timestamp_artifact_ready";

/// The fixed set of derived metrics, in column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Metric {
    BuildDuration,
    ConfigureDuration,
    MakeDuration,
    MakeCheckDuration,
    E2eDuration,
    CheckoutDuration,
    MemoryAllocationDuration,
    EnclaveBootDuration,
    RunnerConfigDuration,
    RunnerReadinessDuration,
}

impl Metric {
    pub const ALL: [Metric; 10] = [
        Metric::BuildDuration,
        Metric::ConfigureDuration,
        Metric::MakeDuration,
        Metric::MakeCheckDuration,
        Metric::E2eDuration,
        Metric::CheckoutDuration,
        Metric::MemoryAllocationDuration,
        Metric::EnclaveBootDuration,
        Metric::RunnerConfigDuration,
        Metric::RunnerReadinessDuration,
    ];

    pub fn column(self) -> &'static str {
        match self {
            Metric::BuildDuration => "build_duration",
            Metric::ConfigureDuration => "configure_duration",
            Metric::MakeDuration => "make_duration",
            Metric::MakeCheckDuration => "make_check_duration",
            Metric::E2eDuration => "e2e_duration",
            Metric::CheckoutDuration => "checkout_duration",
            Metric::MemoryAllocationDuration => "memory_allocation_duration",
            Metric::EnclaveBootDuration => "enclave_boot_duration",
            Metric::RunnerConfigDuration => "runner_config_duration",
            Metric::RunnerReadinessDuration => "runner_readiness_duration",
        }
    }

    /// Metrics that cannot exist without the WEBHOOK marker.
    pub fn needs_reference(self) -> bool {
        matches!(
            self,
            Metric::E2eDuration
                | Metric::MemoryAllocationDuration
                | Metric::RunnerReadinessDuration
        )
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Durations (seconds) and marker offsets derived from one run's stdout.
///
/// Every metric of [`Metric::ALL`] has an entry; `None` means one of its
/// inputs was not logged.
#[derive(Debug, Clone, PartialEq)]
pub struct DurationRecord {
    pub run_name: String,
    /// `timestamp_<key>` -> seconds since WEBHOOK. Empty without WEBHOOK.
    pub offsets: BTreeMap<String, f64>,
    pub metrics: BTreeMap<Metric, Option<f64>>,
}

impl DurationRecord {
    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.metrics.get(&metric).copied().flatten()
    }

    pub fn offset(&self, column: &str) -> Option<f64> {
        self.offsets.get(column).copied()
    }

    pub fn has_reference(&self) -> bool {
        self.offsets.contains_key(&offset_column(REFERENCE_KEY))
    }
}

/// Column name of a marker's offset: `timestamp_` + lowercase key.
pub fn offset_column(key: &str) -> String {
    format!("timestamp_{}", key.to_lowercase())
}

/// Pure transform from captured stdout to a [`DurationRecord`].
pub fn derive_durations(run_name: &str, stdout: &str) -> DurationRecord {
    let marks = collect_timestamps(stdout);
    let at = |key: &str| marks.get(key).copied();

    let webhook = at(REFERENCE_KEY);
    let artifact_ready = at(POST_MAKE).or_else(|| at(BUILD_END));

    let mut offsets = BTreeMap::new();
    if let Some(reference) = webhook {
        for (key, instant) in &marks {
            offsets.insert(offset_column(key), seconds_between(*instant, reference));
        }
        if let Some(ready) = artifact_ready {
            offsets.insert(ARTIFACT_READY_COLUMN.to_string(), seconds_between(ready, reference));
        }
    }

    let span = |end: Option<DateTime<Utc>>, start: Option<DateTime<Utc>>| {
        Some(seconds_between(end?, start?))
    };

    let memory_allocation = span(at(ENCLAVE_STARTED), webhook);
    let enclave_boot = span(at(ENCLAVE_CONNECTED), at(ENCLAVE_STARTED));
    let runner_config = span(at(CONFIG_DONE), at(ENCLAVE_CONNECTED));
    let runner_readiness = match (memory_allocation, enclave_boot, runner_config) {
        (Some(a), Some(b), Some(c)) => Some(a + b + c),
        _ => None,
    };

    let metrics = BTreeMap::from([
        (Metric::BuildDuration, span(artifact_ready, at(BUILD_START))),
        (Metric::ConfigureDuration, span(at(POST_CONFIGURE), at(BUILD_START))),
        (Metric::MakeDuration, span(at(POST_MAKE), at(POST_CONFIGURE))),
        (Metric::MakeCheckDuration, span(at(POST_MAKE_CHECK), at(POST_MAKE))),
        (Metric::E2eDuration, span(artifact_ready, webhook)),
        (Metric::CheckoutDuration, span(at(POST_CHECKOUT), at(PRE_CHECKOUT))),
        (Metric::MemoryAllocationDuration, memory_allocation),
        (Metric::EnclaveBootDuration, enclave_boot),
        (Metric::RunnerConfigDuration, runner_config),
        (Metric::RunnerReadinessDuration, runner_readiness),
    ]);

    DurationRecord {
        run_name: run_name.to_string(),
        offsets,
        metrics,
    }
}

fn seconds_between(later: DateTime<Utc>, earlier: DateTime<Utc>) -> f64 {
    let delta = later - earlier;
    match delta.num_microseconds() {
        Some(us) => us as f64 / 1_000_000.0,
        None => delta.num_milliseconds() as f64 / 1_000.0,
    }
}
