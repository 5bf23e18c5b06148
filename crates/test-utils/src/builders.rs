#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

use cronmanager::supervisor::{CommandLine, JobSpec};

/// Builder for `JobSpec` to simplify test setup.
///
/// Defaults to a 100ms tick so timing tests stay short.
pub struct JobSpecBuilder {
    spec: JobSpec,
}

impl JobSpecBuilder {
    /// Job that runs `script` through `sh -c`.
    pub fn shell(name: &str, script: &str) -> Self {
        let mut spec = JobSpec::new(name, CommandLine::shell(script));
        spec.tick_interval = Duration::from_millis(100);
        Self { spec }
    }

    /// Job whose command line is split on whitespace.
    pub fn exec(name: &str, cmd: &str) -> Self {
        let command = CommandLine::split(cmd).expect("test command must not be empty");
        let mut spec = JobSpec::new(name, command);
        spec.tick_interval = Duration::from_millis(100);
        Self { spec }
    }

    pub fn tick(mut self, interval: Duration) -> Self {
        self.spec.tick_interval = interval;
        self
    }

    pub fn threshold(mut self, threshold: Duration) -> Self {
        self.spec.threshold = Some(threshold);
        self
    }

    pub fn idle(mut self, idle: Duration) -> Self {
        self.spec.idle = Some(idle);
        self
    }

    pub fn log_file(mut self, path: &Path) -> Self {
        self.spec.log_file = Some(path.to_path_buf());
        self
    }

    pub fn report_run(mut self, val: bool) -> Self {
        self.spec.report_run = val;
        self
    }

    pub fn report_last_seen(mut self, val: bool) -> Self {
        self.spec.report_last_seen = val;
        self
    }

    pub fn build(self) -> JobSpec {
        self.spec
    }
}
