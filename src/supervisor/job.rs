// src/supervisor/job.rs

use std::process::ExitStatus;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::errors::{CronError, Result};
use crate::metrics::dimension;
use crate::metrics::MetricSink;
use crate::supervisor::child::spawn_child;
use crate::supervisor::emit::{emit, unix_now};
use crate::supervisor::run_state::JobRun;
use crate::supervisor::ticker::{spawn_deadline, spawn_ticker};
use crate::supervisor::{JobOutcome, JobSpec, RunReport};

/// Drives one job to completion and reports its state through a
/// [`MetricSink`].
pub struct JobSupervisor {
    sink: Arc<dyn MetricSink>,
}

impl std::fmt::Debug for JobSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobSupervisor").finish_non_exhaustive()
    }
}

impl JobSupervisor {
    pub fn new(sink: Arc<dyn MetricSink>) -> Self {
        Self { sink }
    }

    /// Run the job described by `spec`.
    ///
    /// - A launch failure returns [`CronError::Launch`] before any metric
    ///   is written.
    /// - A non-zero exit is a normal outcome (`failed=1`), not an error.
    /// - A failing `wait` returns [`CronError::Wait`]; background tasks are
    ///   stopped first but no terminal metrics are written.
    pub async fn run(&self, spec: &JobSpec) -> Result<RunReport> {
        let mut child = spawn_child(&spec.name, &spec.command, spec.log_file.as_deref()).await?;

        let run = JobRun::start(spec.name.clone());

        if spec.report_run {
            emit(&self.sink, run.name(), dimension::RUN, 1.0).await?;
        }

        let ticker = spawn_ticker(
            Arc::clone(&run),
            Arc::clone(&self.sink),
            spec.tick_interval,
            spec.report_last_seen,
        );
        let deadline = spec
            .threshold
            .map(|threshold| spawn_deadline(Arc::clone(&run), Arc::clone(&self.sink), threshold));

        let waited = child.wait().await;

        // The deadline measures the process itself; idle padding below must
        // not trip it.
        if let Some(deadline) = deadline {
            deadline.stop().await;
        }

        let outcome = match waited {
            Ok(status) => classify_exit(status),
            Err(source) => {
                ticker.stop().await;
                return Err(CronError::Wait {
                    job: spec.name.clone(),
                    source,
                });
            }
        };

        let process_elapsed = run.elapsed();
        info!(
            job = %spec.name,
            ?outcome,
            elapsed = ?process_elapsed,
            delayed = run.is_delayed(),
            "job process exited"
        );

        if let Some(idle) = spec.idle {
            hold_until(idle, process_elapsed, &spec.name).await;
        }

        ticker.stop().await;

        self.report_terminal(spec, &run, outcome).await?;

        Ok(RunReport {
            job: spec.name.clone(),
            outcome,
            delayed: run.is_delayed(),
            elapsed: process_elapsed,
        })
    }

    /// Final writes once the process is gone.
    async fn report_terminal(&self, spec: &JobSpec, run: &JobRun, outcome: JobOutcome) -> Result<()> {
        let failed = match outcome {
            JobOutcome::Completed => 0.0,
            JobOutcome::Failed { .. } => 1.0,
        };

        emit(&self.sink, run.name(), dimension::FAILED, failed).await?;
        emit(&self.sink, run.name(), dimension::DURATION, 0.0).await?;

        if spec.report_run {
            emit(&self.sink, run.name(), dimension::RUN, 0.0).await?;
        }

        if spec.threshold.is_some() && !run.is_delayed() {
            emit(&self.sink, run.name(), dimension::DELAYED, 0.0).await?;
        }

        if spec.report_last_seen {
            emit(&self.sink, run.name(), dimension::LAST, unix_now()).await?;
        }

        debug!(job = %run.name(), "terminal metrics written");
        Ok(())
    }
}

/// Map a process exit status to a job outcome.
///
/// Exit code 0 is success; any other exit, including death by signal, is a
/// failure.
pub fn classify_exit(status: ExitStatus) -> JobOutcome {
    if status.success() {
        JobOutcome::Completed
    } else {
        if status.code().is_none() {
            warn!(?status, "job process terminated by signal");
        }
        JobOutcome::Failed {
            exit_code: status.code(),
        }
    }
}

async fn hold_until(idle: Duration, elapsed: Duration, job: &str) {
    if elapsed >= idle {
        return;
    }
    let remaining = idle - elapsed;
    info!(job = %job, remaining = ?remaining, "holding terminal report until idle delay has elapsed");
    tokio::time::sleep(remaining).await;
}
