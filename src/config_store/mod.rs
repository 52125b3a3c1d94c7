//! Key-value configuration access with local override precedence.
//!
//! [`ConfigStore`] resolves a key against the override directory first and
//! the remote store second, and writes to the remote store only. [`direct`]
//! holds one-shot remote operations that skip the override directory.

pub mod direct;
mod error;
mod json;
mod store;


pub use error::ConfigError;
pub use json::{ConfigValue, to_json_omit_defaults};
pub use store::ConfigStore;
