use std::{fmt, path::PathBuf, time::Duration};

/// Errors raised by the remote key-value store client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// No session could be established or the connection dropped.
    #[error("cannot reach key-value store: {details}")]
    Connection {
        /// What went wrong while connecting
        details: String,
    },

    /// The operation did not complete before its deadline.
    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        /// Name of the operation that timed out
        operation: &'static str,
        /// Deadline that elapsed
        timeout: Duration,
    },

    /// The session was closed while the operation was in flight.
    #[error("key-value session closed")]
    Closed,
}

impl RemoteError {
    /// Creates a connection error from any displayable cause.
    pub fn connection(details: impl fmt::Display) -> Self {
        RemoteError::Connection {
            details: details.to_string(),
        }
    }
}

/// Errors raised while loading the endpoint file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EndpointError {
    /// The endpoint file could not be read.
    #[error("failed to read endpoint file '{path}': {details}")]
    Read {
        /// Path of the endpoint file
        path: PathBuf,
        /// I/O error details
        details: String,
    },

    /// The endpoint file is not valid JSON.
    #[error("failed to parse endpoint file: {details}")]
    Parse {
        /// Parse error details
        details: String,
    },

    /// The endpoint file lists no nodes.
    #[error("endpoint file lists no nodes")]
    NoNodes,

    /// A node is missing its address or port.
    #[error("invalid node {ip}:{port}")]
    InvalidNode {
        /// Node address as written in the file
        ip: String,
        /// Node port as written in the file
        port: u16,
    },
}
