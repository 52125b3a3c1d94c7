use std::path::PathBuf;

/// Errors raised while reading or watching override files.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocalError {
    /// The override file exists but could not be read.
    #[error("I/O error on '{path}': {details}")]
    Io {
        /// Path of the override file
        path: PathBuf,
        /// I/O error details
        details: String,
    },

    /// The override file is not a valid item document.
    #[error("malformed override file '{path}': {details}")]
    Format {
        /// Path of the override file
        path: PathBuf,
        /// Parse error details
        details: String,
    },

    /// A filesystem subscription could not be set up.
    #[error("file watcher error for '{path}': {details}")]
    Subscribe {
        /// Path being watched
        path: PathBuf,
        /// File watcher error details
        details: String,
    },
}
