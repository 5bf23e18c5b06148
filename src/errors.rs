// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

use crate::metrics::lock::LockError;

#[derive(Error, Debug)]
pub enum CronError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Only surfaced when the store runs with a strict lock policy.
    #[error("Could not lock metrics file {path:?}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: LockError,
    },

    /// The metrics file could neither be read nor created.
    #[error("Couldn't read or write to the exporter file {path:?}: {source}")]
    MetricsFileUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Writing metrics file {path:?} failed: {source}")]
    MetricsWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Opening log file {path:?} failed: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to launch job '{job}': {source}")]
    Launch {
        job: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Waiting for job '{job}' failed: {source}")]
    Wait {
        job: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, CronError>;
