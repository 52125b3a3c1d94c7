//! Typed configuration values that follow their key.
//!
//! [`LiveConfig`] binds one key to a typed value; [`LiveConfigRegistry`]
//! manages a family of them addressed by numeric tag.

mod config;
mod registry;

#[cfg(test)]
mod tests;

pub use config::{ChangeCallback, LiveConfig};
pub use registry::LiveConfigRegistry;
