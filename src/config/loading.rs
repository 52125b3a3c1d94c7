use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tracing::debug;

use super::{ConfigPaths, Settings};
use crate::core::{Result, SettingsError};

impl Settings {
    /// Parses settings from a TOML string.
    ///
    /// # Errors
    /// Returns an error if the TOML is malformed or has wrongly typed fields.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| SettingsError::toml_parse(e, None))
    }

    /// Loads settings from `path`. A missing file yields the defaults.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No settings file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(SettingsError::io(e, path)),
        };

        toml::from_str(&content).map_err(|e| SettingsError::toml_parse(e, Some(path)))
    }

    /// Loads settings from the default location.
    ///
    /// # Errors
    /// Returns an error if the config directory cannot be determined or the
    /// file cannot be parsed.
    pub fn load_default() -> Result<Self> {
        Self::load(&ConfigPaths::settings_file()?)
    }

    /// Resolved override directory.
    ///
    /// # Errors
    /// Returns an error if no directory is configured and the default cannot
    /// be determined.
    pub fn override_dir(&self) -> Result<PathBuf> {
        match &self.override_dir {
            Some(dir) => Ok(dir.clone()),
            None => ConfigPaths::override_dir(),
        }
    }

    /// Resolved endpoint file path.
    ///
    /// # Errors
    /// Returns an error if no file is configured and the default cannot be
    /// determined.
    pub fn endpoints_file(&self) -> Result<PathBuf> {
        match &self.endpoints_file {
            Some(path) => Ok(path.clone()),
            None => ConfigPaths::endpoints_file(),
        }
    }
}
