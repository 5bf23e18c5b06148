// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::CliArgs;
use crate::config::model::{RawSettings, Settings};
use crate::config::validate::validate_settings;
use crate::config::{
    DEFAULT_METRICS_FILE, DEFAULT_METRIC_NAME, DEFAULT_TICK_INTERVAL_MS, SHARED_FILE_NAME,
};
use crate::errors::Result;
use crate::metrics::lock::LockPolicy;
use crate::metrics::store::MetricsTarget;

/// Load a settings file from a given path.
///
/// This only performs TOML deserialization; semantic checks happen in
/// [`resolve_settings`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawSettings> {
    let contents = fs::read_to_string(path.as_ref())?;
    let raw: RawSettings = toml::from_str(&contents)?;
    Ok(raw)
}

/// Everything that feeds into [`Settings`] besides the CLI itself.
#[derive(Debug, Clone, Default)]
pub struct SettingsSources {
    pub file: Option<RawSettings>,
    /// Raw value of `COLLECTOR_TEXTFILE_PATH`.
    pub textfile_dir: Option<String>,
}

impl SettingsSources {
    /// Read the optional settings file and the environment.
    pub fn gather(args: &CliArgs) -> Result<Self> {
        let file = match &args.config {
            Some(path) => Some(load_from_path(path)?),
            None => None,
        };
        Ok(Self {
            file,
            textfile_dir: std::env::var(super::TEXTFILE_DIR_ENV_VAR).ok(),
        })
    }
}

/// Merge CLI flags over the settings file, environment and defaults, then
/// validate the result against the job name.
pub fn resolve_settings(args: &CliArgs, sources: &SettingsSources) -> Result<Settings> {
    let file = sources.file.clone().unwrap_or_default();

    let target = resolve_target(args, &file, sources.textfile_dir.as_deref());

    let lock = LockPolicy {
        timeout: args
            .lock_timeout
            .or(file.lock_timeout_secs)
            .map(Duration::from_secs),
        strict: args.strict_lock || file.strict_lock.unwrap_or(false),
    };

    let settings = Settings {
        metric_name: file
            .metric_name
            .unwrap_or_else(|| DEFAULT_METRIC_NAME.to_string()),
        target,
        lock,
        report_run: args.report_run || file.report_run.unwrap_or(false),
        report_last_seen: args.report_last_seen || file.report_last_seen.unwrap_or(false),
        tick_interval: Duration::from_millis(
            file.tick_interval_ms.unwrap_or(DEFAULT_TICK_INTERVAL_MS),
        ),
    };

    validate_settings(&settings, &args.name)?;
    Ok(settings)
}

fn resolve_target(args: &CliArgs, file: &RawSettings, textfile_dir: Option<&str>) -> MetricsTarget {
    if let Some(dir) = &args.metrics_dir {
        return MetricsTarget::PerJob { dir: dir.clone() };
    }
    if let Some(path) = &args.metrics_file {
        return MetricsTarget::Shared { path: path.clone() };
    }
    if let Some(dir) = &file.metrics_dir {
        return MetricsTarget::PerJob { dir: dir.clone() };
    }
    if let Some(path) = &file.metrics_file {
        return MetricsTarget::Shared { path: path.clone() };
    }

    let path = match textfile_dir.map(str::trim) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir).join(SHARED_FILE_NAME),
        _ => PathBuf::from(DEFAULT_METRICS_FILE),
    };
    MetricsTarget::Shared { path }
}
