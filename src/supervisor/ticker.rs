// src/supervisor/ticker.rs

//! Background activity bound to a single run: the duration ticker and the
//! deadline timer.
//!
//! Both are stopped through [`BackgroundTask::stop`], which also waits for
//! the task to finish. Once `stop` returns no further metric writes from
//! that task can happen, so terminal metrics are never overwritten by a
//! late tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::metrics::dimension;
use crate::metrics::MetricSink;
use crate::supervisor::emit::{emit, unix_now};
use crate::supervisor::run_state::JobRun;

/// Handle to a cancellable background task.
#[derive(Debug)]
pub struct BackgroundTask {
    label: &'static str,
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl BackgroundTask {
    /// Signal the task to stop and wait until it has.
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            if stop.send(()).is_err() {
                debug!(task = self.label, "background task already finished");
            }
        }
        if let Err(e) = (&mut self.handle).await {
            warn!(task = self.label, error = %e, "background task ended abnormally");
        }
    }
}

/// Every `interval`, write `duration` (and optionally `last`) for the run.
///
/// The first write happens one interval after the call.
pub fn spawn_ticker(
    run: Arc<JobRun>,
    sink: Arc<dyn MetricSink>,
    interval: Duration,
    report_last_seen: bool,
) -> BackgroundTask {
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

    let handle = tokio::spawn(async move {
        let mut ticks = interval_at(Instant::now() + interval, interval);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                _ = &mut stop_rx => break,

                _ = ticks.tick() => {
                    let elapsed = run.elapsed_secs();
                    if let Err(e) = emit(&sink, run.name(), dimension::DURATION, elapsed).await {
                        error!(job = %run.name(), error = %e, "failed to write duration");
                    }
                    if report_last_seen {
                        if let Err(e) = emit(&sink, run.name(), dimension::LAST, unix_now()).await {
                            error!(job = %run.name(), error = %e, "failed to write last-seen timestamp");
                        }
                    }
                }
            }
        }

        debug!(job = %run.name(), "ticker stopped");
    });

    BackgroundTask {
        label: "ticker",
        stop: Some(stop_tx),
        handle,
    }
}

/// After `threshold`, latch the run as delayed and write `delayed=1` once.
pub fn spawn_deadline(run: Arc<JobRun>, sink: Arc<dyn MetricSink>, threshold: Duration) -> BackgroundTask {
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let handle = tokio::spawn(async move {
        tokio::select! {
            biased;

            _ = stop_rx => {
                debug!(job = %run.name(), "deadline disarmed");
            }

            _ = sleep(threshold) => {
                if run.latch_delayed() {
                    info!(job = %run.name(), threshold = ?threshold, "job exceeded its threshold");
                    if let Err(e) = emit(&sink, run.name(), dimension::DELAYED, 1.0).await {
                        error!(job = %run.name(), error = %e, "failed to write delayed flag");
                    }
                }
            }
        }
    });

    BackgroundTask {
        label: "deadline",
        stop: Some(stop_tx),
        handle,
    }
}
