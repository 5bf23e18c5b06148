// src/config/validate.rs

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use crate::config::model::Settings;
use crate::errors::{CronError, Result};
use crate::metrics::store::MetricsTarget;

static METRIC_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z_:][a-zA-Z0-9_:]*$").expect("metric name pattern is valid")
});

/// Run semantic validation against resolved settings.
///
/// This checks:
/// - the job name is non-empty (and a usable file stem in per-job mode)
/// - the metric name follows the exposition format grammar
/// - the tick interval is non-zero
pub fn validate_settings(settings: &Settings, job_name: &str) -> Result<()> {
    validate_job_name(job_name, &settings.target)?;
    validate_metric_name(&settings.metric_name)?;

    if settings.tick_interval == Duration::ZERO {
        return Err(CronError::ConfigError(
            "tick_interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}

pub fn validate_metric_name(name: &str) -> Result<()> {
    if !METRIC_NAME_RE.is_match(name) {
        return Err(CronError::ConfigError(format!(
            "invalid metric name '{name}': expected [a-zA-Z_:][a-zA-Z0-9_:]*"
        )));
    }
    Ok(())
}

fn validate_job_name(job_name: &str, target: &MetricsTarget) -> Result<()> {
    if job_name.trim().is_empty() {
        return Err(CronError::ConfigError("job name must not be empty".to_string()));
    }

    if matches!(target, MetricsTarget::PerJob { .. })
        && (job_name.contains('/')
            || job_name.contains('\\')
            || job_name == "."
            || job_name == "..")
    {
        return Err(CronError::ConfigError(format!(
            "job name '{job_name}' cannot be used as a metrics file name"
        )));
    }

    Ok(())
}
