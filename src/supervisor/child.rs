// src/supervisor/child.rs

//! Spawning the job process and relaying its stdout.

use std::io;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::{CronError, Result};

/// How long to wait for the stdout relay after the process has exited.
///
/// Background processes started by the job may keep the pipe open.
const RELAY_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// The job's command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandLine {
    /// Binary plus already-split arguments.
    Exec { program: String, args: Vec<String> },
    /// Passed verbatim to `sh -c`.
    Shell(String),
}

impl CommandLine {
    /// Split on whitespace: first token is the binary, the rest its args.
    ///
    /// Returns `None` for a blank command.
    pub fn split(cmd: &str) -> Option<Self> {
        let mut tokens = cmd.split_whitespace().map(str::to_string);
        let program = tokens.next()?;
        Some(CommandLine::Exec {
            program,
            args: tokens.collect(),
        })
    }

    pub fn shell(cmd: impl Into<String>) -> Self {
        CommandLine::Shell(cmd.into())
    }

    fn to_command(&self) -> Command {
        match self {
            CommandLine::Exec { program, args } => {
                let mut c = Command::new(program);
                c.args(args);
                c
            }
            CommandLine::Shell(script) => {
                let mut c = Command::new("sh");
                c.arg("-c").arg(script);
                c
            }
        }
    }
}

impl std::fmt::Display for CommandLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandLine::Exec { program, args } => {
                f.write_str(program)?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                Ok(())
            }
            CommandLine::Shell(script) => write!(f, "sh -c {script:?}"),
        }
    }
}

/// A started job process and the task consuming its stdout.
#[derive(Debug)]
pub struct RunningChild {
    job: String,
    child: Child,
    relay: Option<JoinHandle<io::Result<u64>>>,
}

impl RunningChild {
    /// Wait for the process to exit, then let the stdout relay finish.
    pub async fn wait(&mut self) -> io::Result<ExitStatus> {
        let status = self.child.wait().await?;
        self.finish_relay().await;
        Ok(status)
    }

    async fn finish_relay(&mut self) {
        let Some(mut relay) = self.relay.take() else {
            return;
        };

        match tokio::time::timeout(RELAY_DRAIN_TIMEOUT, &mut relay).await {
            Ok(Ok(Ok(bytes))) => {
                debug!(job = %self.job, bytes, "stdout relay finished");
            }
            Ok(Ok(Err(e))) => {
                warn!(job = %self.job, error = %e, "stdout relay failed");
            }
            Ok(Err(e)) => {
                warn!(job = %self.job, error = %e, "stdout relay task failed");
            }
            Err(_) => {
                warn!(
                    job = %self.job,
                    "stdout still open after the job exited; abandoning relay"
                );
                relay.abort();
            }
        }
    }
}

/// Start the job.
///
/// With `log_file`, stdout is streamed into that file as it is produced.
/// Otherwise stdout is drained and logged at debug level. Stderr is
/// inherited.
pub async fn spawn_child(job: &str, command: &CommandLine, log_file: Option<&Path>) -> Result<RunningChild> {
    let log = match log_file {
        Some(path) => Some(tokio::fs::File::create(path).await.map_err(|source| {
            CronError::LogFile {
                path: path.to_path_buf(),
                source,
            }
        })?),
        None => None,
    };

    let mut cmd = command.to_command();
    cmd.stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|source| CronError::Launch {
        job: job.to_string(),
        source,
    })?;

    info!(job = %job, pid = ?child.id(), cmd = %command, "job process started");

    let relay = child.stdout.take().map(|stdout| match log {
        Some(file) => tokio::spawn(relay_to_file(stdout, file)),
        None => tokio::spawn(drain_to_log(job.to_string(), stdout)),
    });

    Ok(RunningChild {
        job: job.to_string(),
        child,
        relay,
    })
}

async fn relay_to_file(mut stdout: ChildStdout, file: tokio::fs::File) -> io::Result<u64> {
    let mut writer = BufWriter::new(file);
    let bytes = tokio::io::copy(&mut stdout, &mut writer).await?;
    writer.flush().await?;
    Ok(bytes)
}

async fn drain_to_log(job: String, stdout: ChildStdout) -> io::Result<u64> {
    let mut reader = BufReader::new(stdout);
    let mut line = Vec::new();
    let mut total = 0u64;

    loop {
        line.clear();
        let n = reader.read_until(b'\n', &mut line).await?;
        if n == 0 {
            break;
        }
        total += n as u64;
        debug!(job = %job, "stdout: {}", String::from_utf8_lossy(&line).trim_end());
    }

    Ok(total)
}
