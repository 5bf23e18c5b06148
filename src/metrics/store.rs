// src/metrics/store.rs

//! The shared-file metric store.
//!
//! [`FileMetricStore::upsert`] performs one complete read-modify-write of a
//! metrics file while holding the file's advisory lock:
//!
//! 1. lock `<file>.lock`
//! 2. read the file (creating it when missing or unreadable)
//! 3. parse, replace-or-insert the series line
//! 4. truncate and rewrite the whole file
//! 5. release the lock (guard drop, on every path)

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::errors::{CronError, Result};
use crate::metrics::exposition::{Exposition, Label, Sample};
use crate::metrics::lock::{lock_exclusive, LockPolicy};

/// Anything that can record a job metric.
///
/// The supervisor only talks to this trait; production code uses
/// [`FileMetricStore`], tests can record the calls instead.
pub trait MetricSink: Send + Sync {
    fn upsert(&self, job: &str, dimension: &str, value: f64) -> Result<()>;
}

/// Where metrics are written and how their lines are labelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricsTarget {
    /// All jobs share one file; lines are `{name="<job>",dimension="<dim>"}`.
    Shared { path: PathBuf },
    /// One `<dir>/<job>.prom` per job; lines are `{issue="<dim>"}`.
    PerJob { dir: PathBuf },
}

impl MetricsTarget {
    pub fn path_for(&self, job: &str) -> PathBuf {
        match self {
            MetricsTarget::Shared { path } => path.clone(),
            MetricsTarget::PerJob { dir } => dir.join(format!("{job}.prom")),
        }
    }

    pub fn labels_for(&self, job: &str, dimension: &str) -> Vec<Label> {
        match self {
            MetricsTarget::Shared { .. } => vec![
                Label::new("name", job),
                Label::new("dimension", dimension),
            ],
            MetricsTarget::PerJob { .. } => vec![Label::new("issue", dimension)],
        }
    }
}

/// Metric store backed by Prometheus textfile-collector files.
#[derive(Debug, Clone)]
pub struct FileMetricStore {
    metric_name: String,
    target: MetricsTarget,
    lock: LockPolicy,
}

impl FileMetricStore {
    pub fn new(metric_name: impl Into<String>, target: MetricsTarget, lock: LockPolicy) -> Self {
        Self {
            metric_name: metric_name.into(),
            target,
            lock,
        }
    }

    pub fn target(&self) -> &MetricsTarget {
        &self.target
    }
}

impl MetricSink for FileMetricStore {
    fn upsert(&self, job: &str, dimension: &str, value: f64) -> Result<()> {
        let path = self.target.path_for(job);

        let _guard = match lock_exclusive(&path, &self.lock) {
            Ok(guard) => Some(guard),
            Err(source) if self.lock.strict => {
                return Err(CronError::Lock { path, source });
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "error locking metrics file; writing without the lock"
                );
                None
            }
        };

        let contents = read_or_create(&path)?;
        let mut doc = Exposition::parse(&contents);

        let sample = Sample::new(
            self.metric_name.clone(),
            self.target.labels_for(job, dimension),
            value,
        );
        let action = doc.upsert(&sample);

        write_metrics_file(&path, doc.render().as_bytes())?;

        debug!(
            job = %job,
            dimension = %dimension,
            value,
            path = %path.display(),
            %action,
            "metric written"
        );
        Ok(())
    }
}

/// Read the current file contents, creating an empty file if it cannot be
/// read.
fn read_or_create(path: &Path) -> Result<String> {
    match fs::read(path) {
        Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        Err(read_err) => {
            debug!(
                path = %path.display(),
                error = %read_err,
                "metrics file not readable; creating it"
            );
            let file =
                create_metrics_file(path).map_err(|source| CronError::MetricsFileUnavailable {
                    path: path.to_path_buf(),
                    source,
                })?;
            make_world_readable(&file, path);
            Ok(String::new())
        }
    }
}

fn write_metrics_file(path: &Path, contents: &[u8]) -> Result<()> {
    let write = || -> std::io::Result<()> {
        let mut file = create_metrics_file(path)?;
        file.write_all(contents)?;
        file.sync_all()
    };
    write().map_err(|source| CronError::MetricsWrite {
        path: path.to_path_buf(),
        source,
    })
}

/// The collector usually runs as another user; undo a restrictive umask.
fn make_world_readable(file: &File, path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) = file.set_permissions(fs::Permissions::from_mode(0o644)) {
            warn!(path = %path.display(), error = %e, "could not make metrics file world-readable");
        }
    }
    #[cfg(not(unix))]
    let _ = (file, path);
}

/// Open `path` truncated, creating it world-readable if needed.
fn create_metrics_file(path: &Path) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }
    options.open(path)
}
