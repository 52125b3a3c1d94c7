//! confsync - live-reloading typed configuration over a versioned
//! key-value store.
//!
//! Values live in a remote key-value store under a namespace. A JSON file
//! in the override directory supersedes the remote value of its key while it
//! exists. [`LiveConfig`](live::LiveConfig) keeps a typed copy of one key up
//! to date and swaps it atomically on every change.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use confsync::{
//!     config::Settings, context::StoreContext, live::LiveConfig, remote::MemoryKv,
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::load_default()?;
//! let context = Arc::new(StoreContext::from_settings(&settings, Arc::new(MemoryKv::new()))?);
//!
//! let limits = LiveConfig::<serde_json::Value>::new("limits", context);
//! limits.init().await?;
//! println!("limits: {}", limits.get());
//! # Ok(())
//! # }
//! ```

/// Process settings and directory layout.
pub mod config;

/// Bootstrap error types and result aliases.
pub mod core;

/// Key-value configuration access with local override precedence.
pub mod config_store;

/// Shared context passed to stores and live configs.
pub mod context;

/// The versioned configuration item.
pub mod item;

/// Typed live-reloading configuration values.
pub mod live;

/// Local override files and their watcher.
pub mod local;

/// Remote key-value store client.
pub mod remote;

/// Command-line interface for inspecting configuration.
pub mod cli;

/// Logging setup.
pub mod tracing_config;

pub use config_store::{ConfigError, ConfigStore, ConfigValue};
pub use context::StoreContext;
pub use crate::core::{Result, SettingsError};
pub use item::{Item, ItemSource};
pub use live::{LiveConfig, LiveConfigRegistry};
