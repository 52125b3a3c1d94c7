//! Unit tests for settings
//!
//! Tests defaults, TOML parsing and file loading.

#![allow(clippy::unwrap_used, clippy::panic)]

use std::{path::PathBuf, time::Duration};

use tempfile::TempDir;

use crate::config::{DEFAULT_NAMESPACE, DeploymentMode, LogLevel, Settings};
use crate::core::SettingsError;

#[test]
fn settings_default() {
    let settings = Settings::default();

    assert_eq!(settings.namespace, DEFAULT_NAMESPACE);
    assert_eq!(settings.mode, DeploymentMode::Production);
    assert!(!settings.use_remote_in_dev);
    assert_eq!(settings.timeouts.point(), Duration::from_secs(3));
    assert_eq!(settings.timeouts.scan(), Duration::from_secs(10));
    assert_eq!(settings.watch.recheck_interval(), Duration::from_secs(5));
    assert!(!settings.watch.remote);
}

#[test]
fn settings_empty_toml_is_default() {
    let settings = Settings::from_toml_str("").unwrap();

    assert_eq!(settings, Settings::default());
}

#[test]
fn settings_partial_toml() {
    let toml_str = r#"
        namespace = "staging_"
        mode = "development"
        use_remote_in_dev = true
        override_dir = "/tmp/overrides"
        log_level = "debug"

        [timeouts]
        point_ms = 500

        [watch]
        remote = true
    "#;

    let settings = Settings::from_toml_str(toml_str).unwrap();

    assert_eq!(settings.namespace, "staging_");
    assert_eq!(settings.mode, DeploymentMode::Development);
    assert!(settings.use_remote_in_dev);
    assert_eq!(settings.override_dir, Some(PathBuf::from("/tmp/overrides")));
    assert_eq!(settings.log_level, LogLevel::Debug);
    assert_eq!(settings.timeouts.point(), Duration::from_millis(500));
    assert_eq!(settings.timeouts.scan(), Duration::from_secs(10));
    assert!(settings.watch.remote);
    assert_eq!(settings.watch.remote_backoff(), Duration::from_secs(5));
}

#[test]
fn settings_invalid_mode_is_rejected() {
    let result = Settings::from_toml_str(r#"mode = "staging""#);

    assert!(matches!(result, Err(SettingsError::TomlParseError { .. })));
}

#[test]
fn settings_serialize_roundtrip() {
    let original = Settings {
        namespace: "x_".to_string(),
        override_dir: Some(PathBuf::from("/srv/overrides")),
        ..Settings::default()
    };

    let toml_str = toml::to_string(&original).unwrap();
    let parsed = Settings::from_toml_str(&toml_str).unwrap();

    assert_eq!(parsed, original);
}

#[test]
fn load_missing_file_gives_defaults() {
    let dir = TempDir::new().unwrap();

    let settings = Settings::load(&dir.path().join("confsync.toml")).unwrap();

    assert_eq!(settings, Settings::default());
}

#[test]
fn load_reports_file_location_on_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("confsync.toml");
    std::fs::write(&path, "namespace = [").unwrap();

    let err = Settings::load(&path).unwrap_err();

    match err {
        SettingsError::TomlParseError { location, .. } => {
            assert!(location.ends_with("confsync.toml"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn explicit_paths_win_over_defaults() {
    let settings = Settings {
        override_dir: Some(PathBuf::from("/a")),
        endpoints_file: Some(PathBuf::from("/b.json")),
        ..Settings::default()
    };

    assert_eq!(settings.override_dir().unwrap(), PathBuf::from("/a"));
    assert_eq!(settings.endpoints_file().unwrap(), PathBuf::from("/b.json"));
}

#[test]
fn log_level_renders_filter_directive() {
    assert_eq!(LogLevel::Warn.to_string(), "warn");
    assert_eq!(LogLevel::default().as_str(), "info");
}
