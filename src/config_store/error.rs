use std::time::Duration;

use thiserror::Error;

use crate::remote::RemoteError;

/// Errors returned by [`ConfigStore`](super::ConfigStore) and the live config layer.
///
/// A missing key is not an error: reads report it as `None` or
/// `existed == false`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The key-value store could not be reached.
    #[error("cannot reach key-value store: {details}")]
    Connection {
        /// What went wrong while connecting
        details: String,
    },

    /// An operation did not finish before its deadline.
    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        /// Name of the operation that timed out
        operation: &'static str,
        /// Deadline that elapsed
        timeout: Duration,
    },

    /// A compare-and-set lost against a concurrent writer.
    #[error("version conflict on '{key}': expected version {expected_version}")]
    VersionConflict {
        /// Logical key that was written
        key: String,
        /// Version the caller expected
        expected_version: i64,
    },

    /// A registry lookup used a tag that was never added.
    #[error("no live config registered for tag {tag}")]
    NotFound {
        /// Unknown tag
        tag: u32,
    },

    /// A stored or override value is not valid JSON for the requested type.
    #[error("malformed value for '{key}': {details}")]
    Format {
        /// Logical key whose value failed to decode
        key: String,
        /// Decode error details
        details: String,
    },

    /// A value could not be encoded for writing.
    #[error("failed to encode value for '{key}': {details}")]
    Serialization {
        /// Logical key being written
        key: String,
        /// Encode error details
        details: String,
    },
}

impl ConfigError {
    pub(crate) fn format(key: &str, error: impl std::fmt::Display) -> Self {
        ConfigError::Format {
            key: key.to_string(),
            details: error.to_string(),
        }
    }
}

impl From<RemoteError> for ConfigError {
    fn from(error: RemoteError) -> Self {
        match error {
            RemoteError::Connection { details } => ConfigError::Connection { details },
            RemoteError::Timeout { operation, timeout } => ConfigError::Timeout { operation, timeout },
            RemoteError::Closed => ConfigError::Connection {
                details: "session closed".to_string(),
            },
        }
    }
}
