// src/metrics/lock.rs

//! Cross-process advisory locking for metrics files.
//!
//! Every invocation that rewrites a metrics file first takes an exclusive
//! lock on a sibling `<file>.lock` (via `fs2`, i.e. `flock` / `LockFileEx`).
//! The metrics file itself is truncated and rewritten, so it is not used as
//! the lock target.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;
use thiserror::Error;
use tracing::debug;

/// Interval between attempts when waiting with a timeout.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum LockError {
    #[error("failed to open lock file: {0}")]
    CreateFailed(#[source] io::Error),

    #[error("failed to acquire lock: {0}")]
    AcquireFailed(#[source] io::Error),

    #[error("timed out after {0:?} waiting for lock")]
    TimedOut(Duration),
}

/// How long to wait for the lock, and what to do when it cannot be taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LockPolicy {
    /// `None` blocks until the lock is free.
    pub timeout: Option<Duration>,
    /// Fail the write instead of proceeding without exclusivity.
    pub strict: bool,
}

/// Holds the exclusive lock until dropped.
pub struct MetricsLockGuard {
    file: File,
    lock_path: PathBuf,
}

impl MetricsLockGuard {
    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }
}

impl Drop for MetricsLockGuard {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            debug!(lock = %self.lock_path.display(), error = %e, "explicit unlock failed; closing releases it");
        }
    }
}

impl std::fmt::Debug for MetricsLockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsLockGuard")
            .field("lock_path", &self.lock_path)
            .finish()
    }
}

/// Lock file path for a metrics file.
///
/// - `/data/crons.prom` → `/data/crons.prom.lock`
/// - `/data/crons` → `/data/crons.lock`
pub fn lock_path_for(metrics_path: &Path) -> PathBuf {
    let mut lock_path = metrics_path.to_path_buf();
    match lock_path.extension() {
        Some(ext) => {
            let new_ext = format!("{}.lock", ext.to_string_lossy());
            lock_path.set_extension(new_ext);
        }
        None => {
            lock_path.set_extension("lock");
        }
    }
    lock_path
}

/// Acquire the exclusive lock for `metrics_path` according to `policy`.
pub fn lock_exclusive(metrics_path: &Path, policy: &LockPolicy) -> Result<MetricsLockGuard, LockError> {
    let lock_path = lock_path_for(metrics_path);

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .map_err(LockError::CreateFailed)?;

    match policy.timeout {
        None => {
            debug!(lock = %lock_path.display(), "waiting for metrics lock");
            FileExt::lock_exclusive(&file).map_err(LockError::AcquireFailed)?;
        }
        Some(timeout) => wait_with_timeout(&file, timeout)?,
    }

    debug!(lock = %lock_path.display(), "acquired metrics lock");
    Ok(MetricsLockGuard { file, lock_path })
}

fn wait_with_timeout(file: &File, timeout: Duration) -> Result<(), LockError> {
    let deadline = Instant::now() + timeout;
    loop {
        match FileExt::try_lock_exclusive(file) {
            Ok(()) => return Ok(()),
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                let now = Instant::now();
                if now >= deadline {
                    return Err(LockError::TimedOut(timeout));
                }
                thread::sleep(POLL_INTERVAL.min(deadline - now));
            }
            Err(e) => return Err(LockError::AcquireFailed(e)),
        }
    }
}
