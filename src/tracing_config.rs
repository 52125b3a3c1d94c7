//! Process-wide logging setup.
//!
//! `RUST_LOG` wins over the configured level. `CONFSYNC_LOG_FORMAT=json`
//! switches console output to JSON lines.

use std::{env, error::Error};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{ConfigPaths, LogLevel};

const FORMAT_VAR: &str = "CONFSYNC_LOG_FORMAT";

fn env_filter(default_level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level.as_str()))
}

fn json_format() -> bool {
    env::var(FORMAT_VAR).is_ok_and(|format| format == "json")
}

/// Initialize console logging for a long-running process.
///
/// # Errors
/// Returns error if a global subscriber is already installed
pub fn init(default_level: LogLevel) -> Result<(), Box<dyn Error>> {
    let registry = tracing_subscriber::registry().with(env_filter(default_level));

    if json_format() {
        registry
            .with(fmt::layer().json().with_target(true).with_level(true))
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_level(true)
                    .with_thread_ids(true)
                    .with_thread_names(true),
            )
            .try_init()?;
    }

    Ok(())
}

/// Initialize logging to stdout and to a daily rolling file in the log
/// directory.
///
/// Keep the returned guard alive for as long as logs should be flushed.
///
/// # Errors
/// Returns error if the log directory cannot be resolved, the file cannot be
/// created, or a global subscriber is already installed
pub fn init_with_file(default_level: LogLevel) -> Result<WorkerGuard, Box<dyn Error>> {
    const DAYS_TO_KEEP: usize = 7;

    let log_dir = ConfigPaths::log_dir()?;

    let file_appender = tracing_appender::rolling::Builder::new()
        .rotation(tracing_appender::rolling::Rotation::DAILY)
        .max_log_files(DAYS_TO_KEEP)
        .filename_prefix("confsync")
        .filename_suffix("log")
        .build(&log_dir)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let registry = tracing_subscriber::registry().with(env_filter(default_level));

    if json_format() {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_level(true)
                    .with_writer(std::io::stdout),
            )
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_level(true)
                    .with_writer(non_blocking)
                    .with_ansi(false),
            )
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_level(true)
                    .with_writer(std::io::stdout),
            )
            .with(
                fmt::layer()
                    .compact()
                    .with_target(true)
                    .with_level(true)
                    .with_writer(non_blocking)
                    .with_ansi(false),
            )
            .try_init()?;
    }

    Ok(guard)
}

/// Initialize quiet logging for one-shot CLI commands.
///
/// Only warnings and errors reach stderr unless `RUST_LOG` says otherwise,
/// so command output on stdout stays clean.
///
/// # Errors
/// Returns error if a global subscriber is already installed
pub fn init_cli_mode() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(env_filter(LogLevel::Warn))
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .try_init()?;

    Ok(())
}
