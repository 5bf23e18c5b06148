// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::builder::NonEmptyStringValueParser;
use clap::{Parser, ValueEnum};

/// Command-line arguments for `cronmanager`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "cronmanager",
    version,
    about = "Run a cron job and expose its state to the Prometheus textfile collector.",
    after_help = "Example: cronmanager -c \"/usr/bin/php /var/www/app/console broadcast:entities:updated -e project\" -n update_entities_cron -t 3600 -l /path/to/log"
)]
pub struct CliArgs {
    /// The cron job command.
    ///
    /// Split on whitespace into the binary and its arguments, unless
    /// `--shell` is given.
    #[arg(
        short = 'c',
        long = "command",
        value_name = "CMD",
        value_parser = NonEmptyStringValueParser::new()
    )]
    pub command: String,

    /// The job name to appear in the alarm.
    #[arg(
        short = 'n',
        long = "name",
        value_name = "JOB",
        value_parser = NonEmptyStringValueParser::new()
    )]
    pub name: String,

    /// File that receives the job's stdout.
    #[arg(short = 'l', long = "log", value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Mark the job as delayed once it has run for this many seconds.
    #[arg(short = 't', long = "threshold", value_name = "SECS")]
    pub threshold: Option<u64>,

    /// Keep the job visible as running for at least this many seconds.
    #[arg(short = 'i', long = "idle", value_name = "SECS")]
    pub idle: Option<u64>,

    /// Run the command through `sh -c` instead of splitting it.
    #[arg(long)]
    pub shell: bool,

    /// Shared metrics file (overrides `COLLECTOR_TEXTFILE_PATH`).
    #[arg(long, value_name = "PATH", conflicts_with = "metrics_dir")]
    pub metrics_file: Option<PathBuf>,

    /// Write one `<JOB>.prom` file per job inside this directory.
    #[arg(long, value_name = "DIR")]
    pub metrics_dir: Option<PathBuf>,

    /// Emit `run=1` when the job starts and `run=0` when it ends.
    #[arg(long)]
    pub report_run: bool,

    /// Emit a `last` timestamp on every tick and at completion.
    #[arg(long)]
    pub report_last_seen: bool,

    /// Give up waiting for the metrics lock after this many seconds.
    ///
    /// Waits forever when omitted.
    #[arg(long, value_name = "SECS")]
    pub lock_timeout: Option<u64>,

    /// Fail metric writes when the lock cannot be taken instead of
    /// writing without it.
    #[arg(long)]
    pub strict_lock: bool,

    /// Optional TOML settings file.
    #[arg(long, value_name = "PATH", env = "CRONMANAGER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CRONMANAGER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
