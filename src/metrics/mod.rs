// src/metrics/mod.rs

//! Metric persistence for the textfile collector.
//!
//! - [`exposition`] parses and rewrites the text exposition format.
//! - [`lock`] serializes writers across processes.
//! - [`store`] provides the [`MetricSink`] trait and the file-backed
//!   [`FileMetricStore`].

pub mod exposition;
pub mod lock;
pub mod store;

pub use exposition::{Exposition, Label, Sample, SeriesKey, UpsertAction};
pub use lock::{LockError, LockPolicy};
pub use store::{FileMetricStore, MetricSink, MetricsTarget};

/// Dimension names written by the supervisor.
pub mod dimension {
    pub const DURATION: &str = "duration";
    pub const FAILED: &str = "failed";
    pub const RUN: &str = "run";
    pub const DELAYED: &str = "delayed";
    pub const LAST: &str = "last";
}
