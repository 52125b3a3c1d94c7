use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tokio::fs;
use tracing::{error, instrument};

use super::LocalError;
use crate::item::Item;

/// Read-only access to per-key override files.
///
/// Each key maps to `<dir>/<key>.json`. Nothing in this crate ever writes
/// these files; they are maintained by operators.
#[derive(Debug, Clone)]
pub struct LocalOverrideStore {
    dir: PathBuf,
}

impl LocalOverrideStore {
    /// Creates a store rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the override files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the override file for `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Whether an override file exists for `key`.
    ///
    /// Errors other than "not found" count as existing, so the caller goes on
    /// to read the file and reports the real problem.
    pub async fn exists(&self, key: &str) -> bool {
        match fs::metadata(self.path_for(key)).await {
            Ok(_) => true,
            Err(e) => e.kind() != ErrorKind::NotFound,
        }
    }

    /// Reads the override item for `key`.
    ///
    /// Returns `Ok(None)` when the file is missing, empty, or holds an item
    /// with an empty key, empty value or zero version.
    ///
    /// # Errors
    /// Returns [`LocalError::Io`] if the file cannot be read and
    /// [`LocalError::Format`] if it is not valid JSON.
    #[instrument(skip(self))]
    pub async fn read(&self, key: &str) -> Result<Option<Item>, LocalError> {
        let path = self.path_for(key);

        let content = match fs::read(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to read override file");
                return Err(LocalError::Io {
                    path,
                    details: e.to_string(),
                });
            }
        };

        if content.is_empty() {
            return Ok(None);
        }

        let item: Item = serde_json::from_slice(&content).map_err(|e| {
            error!(path = %path.display(), error = %e, "Malformed override file");
            LocalError::Format {
                path: path.clone(),
                details: e.to_string(),
            }
        })?;

        if !item.is_valid() {
            error!(?item, "Ignoring invalid override item");
            return Ok(None);
        }

        Ok(Some(item))
    }
}
