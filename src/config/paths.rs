use std::{env, path::PathBuf};

use crate::core::{Result, SettingsError};

/// Utility struct for managing configuration file paths
///
/// Provides methods to locate configuration directories and files following
/// the XDG Base Directory specification
pub struct ConfigPaths;

impl ConfigPaths {
    /// Returns the configuration directory path for the application
    ///
    /// Follows the XDG Base Directory specification:
    /// - First checks `XDG_CONFIG_HOME`
    /// - Falls back to `$HOME/.config`
    /// - Appends "confsync" to the base config directory
    ///
    /// # Errors
    /// Returns an error if neither `XDG_CONFIG_HOME` nor `HOME` environment variables are set
    pub fn config_dir() -> Result<PathBuf> {
        let config_home = env::var("XDG_CONFIG_HOME")
            .or_else(|_| env::var("HOME").map(|home| format!("{home}/.config")))
            .map_err(|_| SettingsError::MissingDirectory {
                what: "config directory",
                details: "neither XDG_CONFIG_HOME nor HOME is set".to_string(),
            })?;

        Ok(PathBuf::from(config_home).join("confsync"))
    }

    /// Returns the application data directory path
    ///
    /// # Errors
    /// Returns an error if the HOME environment variable is not set
    pub fn app_data_dir() -> Result<PathBuf> {
        env::var("HOME")
            .map(|home| PathBuf::from(home).join(".confsync"))
            .map_err(|_| SettingsError::MissingDirectory {
                what: "data directory",
                details: "HOME is not set".to_string(),
            })
    }

    /// Get the application log directory
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be determined
    pub fn log_dir() -> Result<PathBuf> {
        Ok(Self::app_data_dir()?.join("logs"))
    }

    /// Returns the path to the settings file
    ///
    /// # Errors
    /// Returns an error if the config directory cannot be determined
    pub fn settings_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("confsync.toml"))
    }

    /// Returns the default directory holding per-key override files
    ///
    /// # Errors
    /// Returns an error if the config directory cannot be determined
    pub fn override_dir() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config"))
    }

    /// Returns the default path of the store endpoint file
    ///
    /// # Errors
    /// Returns an error if the config directory cannot be determined
    pub fn endpoints_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("endpoints.json"))
    }
}
