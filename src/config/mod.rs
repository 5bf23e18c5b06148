// src/config/mod.rs

//! Settings for a single `cronmanager` invocation.
//!
//! Values come from (highest priority first):
//! - CLI flags
//! - the optional TOML settings file (`--config` / `CRONMANAGER_CONFIG`)
//! - the environment (`COLLECTOR_TEXTFILE_PATH`)
//! - built-in defaults
//!
//! - [`model`] holds the raw TOML shape and the resolved [`Settings`].
//! - [`loader`] reads the TOML file and resolves everything into `Settings`.
//! - [`validate`] checks names and intervals before any job is started.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_from_path, resolve_settings, SettingsSources};
pub use model::{RawSettings, Settings};

/// Environment variable naming the textfile collector directory.
pub const TEXTFILE_DIR_ENV_VAR: &str = "COLLECTOR_TEXTFILE_PATH";

/// File name used inside `COLLECTOR_TEXTFILE_PATH` for the shared file.
pub const SHARED_FILE_NAME: &str = "crons.prom";

/// Shared metrics file used when nothing else is configured.
pub const DEFAULT_METRICS_FILE: &str = "/opt/prometheus/exporters/dist/textfile/crons.prom";

pub const DEFAULT_METRIC_NAME: &str = "cronjob";

pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;
