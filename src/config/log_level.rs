use std::fmt;

use serde::{Deserialize, Serialize};

/// Default verbosity, applied when `RUST_LOG` is unset.
///
/// Written in `confsync.toml` as `log_level = "debug"` and so on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Failed operations only
    Error,
    /// Also reports skipped overrides and dropped updates
    Warn,
    /// Also reports watcher and session lifecycle
    #[default]
    Info,
    /// Also reports every applied change
    Debug,
    /// Everything
    Trace,
}

impl LogLevel {
    /// Directive understood by `EnvFilter`.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
