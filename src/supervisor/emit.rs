// src/supervisor/emit.rs

use std::sync::Arc;

use crate::errors::Result;
use crate::metrics::MetricSink;

/// Run a (blocking) metric upsert off the async worker threads.
pub async fn emit(sink: &Arc<dyn MetricSink>, job: &str, dimension: &'static str, value: f64) -> Result<()> {
    let sink = Arc::clone(sink);
    let job = job.to_string();
    tokio::task::spawn_blocking(move || sink.upsert(&job, dimension, value))
        .await
        .map_err(anyhow::Error::from)?
}

/// Current wall-clock time as unix seconds.
pub fn unix_now() -> f64 {
    chrono::Utc::now().timestamp() as f64
}
