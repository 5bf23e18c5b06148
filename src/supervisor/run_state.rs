// src/supervisor/run_state.rs

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// State of one job invocation, shared between the main flow, the ticker
/// and the deadline timer.
#[derive(Debug)]
pub struct JobRun {
    name: String,
    state: Mutex<RunState>,
}

#[derive(Debug)]
struct RunState {
    started_at: Instant,
    delayed: bool,
}

impl JobRun {
    /// Create the run with `started_at = now`.
    pub fn start(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            state: Mutex::new(RunState {
                started_at: Instant::now(),
                delayed: false,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn elapsed(&self) -> Duration {
        self.lock().started_at.elapsed()
    }

    /// Elapsed time in whole seconds, rounded to nearest.
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed().as_secs_f64().round()
    }

    pub fn is_delayed(&self) -> bool {
        self.lock().delayed
    }

    /// Mark the run as delayed.
    ///
    /// Returns `true` only for the call that flipped the flag.
    pub fn latch_delayed(&self) -> bool {
        let mut state = self.lock();
        if state.delayed {
            return false;
        }
        state.delayed = true;
        true
    }

    fn lock(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
