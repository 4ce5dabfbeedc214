// src/analysis/mod.rs

//! Offline analysis of persisted run output: timestamp markers, derived
//! durations and the flat dataset.

pub mod dataset;
pub mod durations;
pub mod timestamps;

pub use dataset::{Dataset, DatasetRow, build_dataset, load_output_dir};
pub use durations::{DurationRecord, Metric, derive_durations};
pub use timestamps::{TimestampedEvent, collect_timestamps, parse_instant, parse_line};
