// src/supervisor/mod.rs

//! Job supervision.
//!
//! - [`child`] starts the process and relays its stdout.
//! - [`run_state`] holds the per-run state shared with background tasks.
//! - [`ticker`] runs the duration ticker and the deadline timer.
//! - [`job`] ties these together in [`JobSupervisor::run`].

pub mod child;
pub mod emit;
pub mod job;
pub mod run_state;
pub mod ticker;

use std::path::PathBuf;
use std::time::Duration;

pub use child::CommandLine;
pub use job::{classify_exit, JobSupervisor};
pub use run_state::JobRun;

use crate::config::DEFAULT_TICK_INTERVAL_MS;

/// Everything needed to run and report one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub name: String,
    pub command: CommandLine,
    /// Receives the job's stdout when set.
    pub log_file: Option<PathBuf>,
    /// Write `delayed=1` if the process is still running after this long.
    pub threshold: Option<Duration>,
    /// Minimum time the job stays visible as running.
    pub idle: Option<Duration>,
    pub report_run: bool,
    pub report_last_seen: bool,
    pub tick_interval: Duration,
}

impl JobSpec {
    pub fn new(name: impl Into<String>, command: CommandLine) -> Self {
        Self {
            name: name.into(),
            command,
            log_file: None,
            threshold: None,
            idle: None,
            report_run: false,
            report_last_seen: false,
            tick_interval: Duration::from_millis(DEFAULT_TICK_INTERVAL_MS),
        }
    }
}

/// How the job process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Completed,
    /// `exit_code` is `None` when the process was killed by a signal.
    Failed { exit_code: Option<i32> },
}

/// Summary returned by [`JobSupervisor::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub job: String,
    pub outcome: JobOutcome,
    pub delayed: bool,
    /// Time from start until the process exited (idle padding excluded).
    pub elapsed: Duration,
}
