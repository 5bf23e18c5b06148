use std::sync::{Arc, Mutex};
use std::time::Instant;

use cronmanager::errors::{CronError, Result};
use cronmanager::metrics::MetricSink;

/// One recorded `upsert` call.
#[derive(Debug, Clone, PartialEq)]
pub struct Upsert {
    pub job: String,
    pub dimension: String,
    pub value: f64,
    pub at: Instant,
}

/// A sink that records every call instead of touching the filesystem.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    calls: Arc<Mutex<Vec<Upsert>>>,
    fail_dimension: Option<String>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every write for `dimension` (after recording it).
    pub fn failing_on(dimension: &str) -> Self {
        Self {
            calls: Arc::default(),
            fail_dimension: Some(dimension.to_string()),
        }
    }

    pub fn calls(&self) -> Vec<Upsert> {
        self.calls.lock().unwrap().clone()
    }

    /// Values written for one dimension, in order.
    pub fn values_for(&self, dimension: &str) -> Vec<f64> {
        self.calls()
            .into_iter()
            .filter(|c| c.dimension == dimension)
            .map(|c| c.value)
            .collect()
    }

    /// `(dimension, value)` pairs in call order.
    pub fn sequence(&self) -> Vec<(String, f64)> {
        self.calls()
            .into_iter()
            .map(|c| (c.dimension, c.value))
            .collect()
    }

    pub fn last_value(&self, dimension: &str) -> Option<f64> {
        self.values_for(dimension).last().copied()
    }
}

impl MetricSink for RecordingSink {
    fn upsert(&self, job: &str, dimension: &str, value: f64) -> Result<()> {
        self.calls.lock().unwrap().push(Upsert {
            job: job.to_string(),
            dimension: dimension.to_string(),
            value,
            at: Instant::now(),
        });

        if self.fail_dimension.as_deref() == Some(dimension) {
            return Err(CronError::Other(anyhow::anyhow!(
                "injected failure for dimension '{dimension}'"
            )));
        }
        Ok(())
    }
}
