// tests/settings_resolution.rs

use std::error::Error;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tempfile::NamedTempFile;

use cronmanager::build_job_spec;
use cronmanager::cli::{CliArgs, LogLevel};
use cronmanager::config::{load_from_path, resolve_settings, RawSettings, SettingsSources};
use cronmanager::errors::CronError;
use cronmanager::logging::resolve_level;
use cronmanager::metrics::{LockPolicy, MetricsTarget};
use cronmanager::supervisor::CommandLine;

type TestResult = Result<(), Box<dyn Error>>;

fn args(extra: &[&str]) -> CliArgs {
    let mut argv = vec!["cronmanager", "-c", "/usr/bin/php console sync -e project", "-n", "sync_job"];
    argv.extend_from_slice(extra);
    CliArgs::try_parse_from(argv).expect("arguments should parse")
}

#[test]
fn missing_required_flags_are_rejected() {
    let err = CliArgs::try_parse_from(["cronmanager", "-c", "true"]).unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);

    let err = CliArgs::try_parse_from(["cronmanager", "-n", "job"]).unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);

    let err = CliArgs::try_parse_from(["cronmanager", "-c", "", "-n", "job"]).unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
}

#[test]
fn metrics_file_and_dir_conflict() {
    let err = CliArgs::try_parse_from([
        "cronmanager", "-c", "true", "-n", "job", "--metrics-file", "/a.prom", "--metrics-dir", "/b",
    ])
    .unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
}

#[test]
fn defaults_to_the_well_known_shared_file() -> TestResult {
    let settings = resolve_settings(&args(&[]), &SettingsSources::default())?;

    assert_eq!(
        settings.target,
        MetricsTarget::Shared {
            path: PathBuf::from("/opt/prometheus/exporters/dist/textfile/crons.prom")
        }
    );
    assert_eq!(settings.metric_name, "cronjob");
    assert_eq!(settings.lock, LockPolicy::default());
    assert_eq!(settings.tick_interval, Duration::from_secs(1));
    assert!(!settings.report_run);
    assert!(!settings.report_last_seen);
    Ok(())
}

#[test]
fn collector_env_var_selects_the_directory() -> TestResult {
    let sources = SettingsSources {
        file: None,
        textfile_dir: Some("/var/lib/node_exporter".to_string()),
    };
    let settings = resolve_settings(&args(&[]), &sources)?;
    assert_eq!(
        settings.target,
        MetricsTarget::Shared {
            path: PathBuf::from("/var/lib/node_exporter/crons.prom")
        }
    );

    let blank = SettingsSources {
        file: None,
        textfile_dir: Some("  ".to_string()),
    };
    let settings = resolve_settings(&args(&[]), &blank)?;
    assert_eq!(
        settings.target,
        MetricsTarget::Shared {
            path: PathBuf::from("/opt/prometheus/exporters/dist/textfile/crons.prom")
        }
    );
    Ok(())
}

#[test]
fn cli_wins_over_settings_file_and_environment() -> TestResult {
    let sources = SettingsSources {
        file: Some(RawSettings {
            metrics_file: Some(PathBuf::from("/from/file.prom")),
            lock_timeout_secs: Some(30),
            ..RawSettings::default()
        }),
        textfile_dir: Some("/from/env".to_string()),
    };

    let settings = resolve_settings(
        &args(&["--metrics-file", "/from/cli.prom", "--lock-timeout", "5", "--strict-lock"]),
        &sources,
    )?;

    assert_eq!(
        settings.target,
        MetricsTarget::Shared {
            path: PathBuf::from("/from/cli.prom")
        }
    );
    assert_eq!(
        settings.lock,
        LockPolicy {
            timeout: Some(Duration::from_secs(5)),
            strict: true,
        }
    );

    let settings = resolve_settings(&args(&[]), &sources)?;
    assert_eq!(
        settings.target,
        MetricsTarget::Shared {
            path: PathBuf::from("/from/file.prom")
        }
    );
    assert_eq!(settings.lock.timeout, Some(Duration::from_secs(30)));
    Ok(())
}

#[test]
fn metrics_dir_selects_per_job_files() -> TestResult {
    let settings = resolve_settings(&args(&["--metrics-dir", "/srv/textfile"]), &SettingsSources::default())?;

    assert_eq!(
        settings.target,
        MetricsTarget::PerJob {
            dir: PathBuf::from("/srv/textfile")
        }
    );
    assert_eq!(
        settings.target.path_for("sync_job"),
        PathBuf::from("/srv/textfile/sync_job.prom")
    );
    Ok(())
}

#[test]
fn per_job_mode_rejects_path_like_job_names() {
    let argv = ["cronmanager", "-c", "true", "-n", "../etc/passwd", "--metrics-dir", "/srv"];
    let cli = CliArgs::try_parse_from(argv).expect("arguments should parse");

    let result = resolve_settings(&cli, &SettingsSources::default());

    assert!(matches!(result, Err(CronError::ConfigError(msg)) if msg.contains("../etc/passwd")));
}

#[test]
fn invalid_metric_name_is_a_config_error() {
    let sources = SettingsSources {
        file: Some(RawSettings {
            metric_name: Some("cron-job".to_string()),
            ..RawSettings::default()
        }),
        textfile_dir: None,
    };

    let result = resolve_settings(&args(&[]), &sources);

    assert!(matches!(result, Err(CronError::ConfigError(msg)) if msg.contains("cron-job")));
}

#[test]
fn zero_tick_interval_is_rejected() {
    let sources = SettingsSources {
        file: Some(RawSettings {
            tick_interval_ms: Some(0),
            ..RawSettings::default()
        }),
        textfile_dir: None,
    };

    assert!(matches!(
        resolve_settings(&args(&[]), &sources),
        Err(CronError::ConfigError(_))
    ));
}

#[test]
fn settings_file_is_loaded_from_toml() -> TestResult {
    let mut file = NamedTempFile::new()?;
    write!(
        file,
        r#"
metric_name = "cron_job"
metrics_dir = "/srv/textfile"
strict_lock = true
report_run = true
report_last_seen = true
tick_interval_ms = 250
"#
    )?;

    let raw = load_from_path(file.path())?;
    let sources = SettingsSources {
        file: Some(raw),
        textfile_dir: None,
    };
    let settings = resolve_settings(&args(&[]), &sources)?;

    assert_eq!(settings.metric_name, "cron_job");
    assert_eq!(
        settings.target,
        MetricsTarget::PerJob {
            dir: PathBuf::from("/srv/textfile")
        }
    );
    assert!(settings.lock.strict);
    assert!(settings.report_run);
    assert!(settings.report_last_seen);
    assert_eq!(settings.tick_interval, Duration::from_millis(250));
    Ok(())
}

#[test]
fn unknown_settings_keys_are_rejected() -> TestResult {
    let mut file = NamedTempFile::new()?;
    write!(file, "metric_nmae = \"typo\"\n")?;

    let result = load_from_path(file.path());

    assert!(matches!(result, Err(CronError::TomlError(_))));
    Ok(())
}

#[test]
fn missing_settings_file_is_an_io_error() {
    let result = load_from_path("/definitely/not/here/cronmanager.toml");
    assert!(matches!(result, Err(CronError::IoError(_))));
}

#[test]
fn job_spec_follows_cli_and_settings() -> TestResult {
    let cli = args(&["-t", "3600", "-i", "60", "-l", "/tmp/sync.log", "--report-run"]);
    let settings = resolve_settings(&cli, &SettingsSources::default())?;

    let spec = build_job_spec(&cli, &settings)?;

    assert_eq!(spec.name, "sync_job");
    assert_eq!(
        spec.command,
        CommandLine::Exec {
            program: "/usr/bin/php".to_string(),
            args: vec!["console".into(), "sync".into(), "-e".into(), "project".into()],
        }
    );
    assert_eq!(spec.threshold, Some(Duration::from_secs(3600)));
    assert_eq!(spec.idle, Some(Duration::from_secs(60)));
    assert_eq!(spec.log_file, Some(PathBuf::from("/tmp/sync.log")));
    assert!(spec.report_run);
    assert!(!spec.report_last_seen);
    Ok(())
}

#[test]
fn shell_flag_keeps_the_command_verbatim() -> TestResult {
    let cli = args(&["--shell"]);
    let settings = resolve_settings(&cli, &SettingsSources::default())?;

    let spec = build_job_spec(&cli, &settings)?;

    assert_eq!(
        spec.command,
        CommandLine::shell("/usr/bin/php console sync -e project")
    );
    Ok(())
}

#[test]
fn whitespace_only_command_is_rejected() -> TestResult {
    let cli = CliArgs::try_parse_from(["cronmanager", "-c", "   ", "-n", "job"])?;
    let settings = resolve_settings(&cli, &SettingsSources::default())?;

    assert!(matches!(build_job_spec(&cli, &settings), Err(CronError::ConfigError(_))));
    Ok(())
}

#[test]
fn log_level_prefers_cli_then_env() {
    assert_eq!(resolve_level(Some(LogLevel::Debug), Some("error")), tracing::Level::DEBUG);
    assert_eq!(resolve_level(None, Some(" Warning ")), tracing::Level::WARN);
    assert_eq!(resolve_level(None, Some("bogus")), tracing::Level::INFO);
    assert_eq!(resolve_level(None, None), tracing::Level::INFO);
}
