//! Process settings for confsync.
//!
//! Settings are read from `<config_dir>/confsync.toml`. Every field has a
//! default, so a missing file or a partial one is fine.

mod loading;
mod log_level;
mod paths;

pub use log_level::LogLevel;
pub use paths::ConfigPaths;

use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

/// Namespace prepended to every key before it reaches the remote store.
pub const DEFAULT_NAMESPACE: &str = "config_";

/// Deployment mode of the process.
///
/// Remote watches are only followed in production unless
/// [`Settings::use_remote_in_dev`] is set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentMode {
    /// Normal operation.
    #[default]
    Production,
    /// Local development.
    Development,
}

/// Top-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Remote key namespace.
    pub namespace: String,

    /// Directory of per-key override files. Defaults to `<config_dir>/config`.
    pub override_dir: Option<PathBuf>,

    /// Store endpoint file. Defaults to `<config_dir>/endpoints.json`.
    pub endpoints_file: Option<PathBuf>,

    /// Deployment mode.
    pub mode: DeploymentMode,

    /// Follow remote changes even in development mode.
    pub use_remote_in_dev: bool,

    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: LogLevel,

    /// Per-operation deadlines.
    pub timeouts: TimeoutSettings,

    /// Background watch behaviour.
    pub watch: WatchSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            override_dir: None,
            endpoints_file: None,
            mode: DeploymentMode::default(),
            use_remote_in_dev: false,
            log_level: LogLevel::default(),
            timeouts: TimeoutSettings::default(),
            watch: WatchSettings::default(),
        }
    }
}

/// Deadlines applied to remote operations, in milliseconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TimeoutSettings {
    /// Point reads, writes and deletes.
    pub point_ms: u64,
    /// Prefix scans.
    pub scan_ms: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            point_ms: 3_000,
            scan_ms: 10_000,
        }
    }
}

impl TimeoutSettings {
    /// Point operation deadline.
    pub fn point(&self) -> Duration {
        Duration::from_millis(self.point_ms)
    }

    /// Prefix scan deadline.
    pub fn scan(&self) -> Duration {
        Duration::from_millis(self.scan_ms)
    }
}

/// Background watch settings, in milliseconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WatchSettings {
    /// Override file recheck interval while it is missing.
    pub recheck_interval_ms: u64,
    /// Follow remote changes for live configs.
    pub remote: bool,
    /// Delay before re-opening a failed remote watch.
    pub remote_backoff_ms: u64,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            recheck_interval_ms: 5_000,
            remote: false,
            remote_backoff_ms: 5_000,
        }
    }
}

impl WatchSettings {
    /// Override file recheck interval.
    pub fn recheck_interval(&self) -> Duration {
        Duration::from_millis(self.recheck_interval_ms)
    }

    /// Remote watch retry delay.
    pub fn remote_backoff(&self) -> Duration {
        Duration::from_millis(self.remote_backoff_ms)
    }
}

#[cfg(test)]
mod tests;
