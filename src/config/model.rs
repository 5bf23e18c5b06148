// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::metrics::lock::LockPolicy;
use crate::metrics::store::MetricsTarget;

/// Optional settings file as read from TOML.
///
/// ```toml
/// metric_name = "cronjob"
/// metrics_file = "/var/lib/node_exporter/textfile/crons.prom"
/// lock_timeout_secs = 30
/// strict_lock = false
/// report_run = true
/// report_last_seen = false
/// tick_interval_ms = 1000
/// ```
///
/// Every key is optional; CLI flags win over anything set here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawSettings {
    #[serde(default)]
    pub metric_name: Option<String>,

    /// Shared metrics file. Ignored when `metrics_dir` is set.
    #[serde(default)]
    pub metrics_file: Option<PathBuf>,

    /// Directory for one-file-per-job mode.
    #[serde(default)]
    pub metrics_dir: Option<PathBuf>,

    #[serde(default)]
    pub lock_timeout_secs: Option<u64>,

    #[serde(default)]
    pub strict_lock: Option<bool>,

    #[serde(default)]
    pub report_run: Option<bool>,

    #[serde(default)]
    pub report_last_seen: Option<bool>,

    /// Period of the duration ticker, in milliseconds.
    #[serde(default)]
    pub tick_interval_ms: Option<u64>,
}

/// Fully resolved settings used to build the metric store and the job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub metric_name: String,
    pub target: MetricsTarget,
    pub lock: LockPolicy,
    pub report_run: bool,
    pub report_last_seen: bool,
    pub tick_interval: Duration,
}
