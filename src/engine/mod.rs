// src/engine/mod.rs

//! Sweep engine: runs a scenario one run at a time through an
//! `ExecutorBackend` and persists every outcome before the next run starts.

pub mod driver;

pub use driver::{Sweep, SweepSummary};
