// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod logging;
pub mod metrics;
pub mod supervisor;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{resolve_settings, Settings, SettingsSources};
use crate::errors::{CronError, Result};
use crate::metrics::FileMetricStore;
use crate::supervisor::{CommandLine, JobSpec, JobSupervisor, RunReport};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - settings resolution (CLI, settings file, environment)
/// - the file-backed metric store
/// - the job supervisor
pub async fn run(args: CliArgs) -> Result<RunReport> {
    let sources = SettingsSources::gather(&args)?;
    let settings = resolve_settings(&args, &sources)?;
    debug!(?settings, "resolved settings");

    let spec = build_job_spec(&args, &settings)?;

    let store = FileMetricStore::new(
        settings.metric_name.clone(),
        settings.target.clone(),
        settings.lock,
    );
    info!(
        job = %spec.name,
        metrics = %store.target().path_for(&spec.name).display(),
        "supervising job"
    );

    let supervisor = JobSupervisor::new(Arc::new(store));
    let report = supervisor.run(&spec).await?;

    info!(
        job = %report.job,
        outcome = ?report.outcome,
        delayed = report.delayed,
        elapsed = ?report.elapsed,
        "job finished"
    );
    Ok(report)
}

/// Turn CLI arguments plus resolved settings into a [`JobSpec`].
pub fn build_job_spec(args: &CliArgs, settings: &Settings) -> Result<JobSpec> {
    let command = if args.shell {
        if args.command.trim().is_empty() {
            None
        } else {
            Some(CommandLine::shell(args.command.clone()))
        }
    } else {
        CommandLine::split(&args.command)
    }
    .ok_or_else(|| CronError::ConfigError("command must not be empty".to_string()))?;

    let mut spec = JobSpec::new(args.name.clone(), command);
    spec.log_file = args.log_file.clone();
    spec.threshold = args.threshold.map(Duration::from_secs);
    spec.idle = args.idle.map(Duration::from_secs);
    spec.report_run = settings.report_run;
    spec.report_last_seen = settings.report_last_seen;
    spec.tick_interval = settings.tick_interval;
    Ok(spec)
}
