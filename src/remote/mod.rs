//! Client side of the networked key-value store.
//!
//! The wire protocol lives behind [`KvConnector`] and [`KvSession`]. On top
//! of a session, [`RemoteStoreClient`] enforces a deadline on every operation
//! and fails fast when no endpoints are configured.

mod client;
mod endpoints;
mod error;
mod memory;
mod transport;

#[cfg(test)]
mod tests;

pub use client::RemoteStoreClient;
pub use endpoints::{ENDPOINT_RELOAD_INTERVAL, EndpointConfig, EndpointFile, EndpointNode, EndpointSource};
pub use error::{EndpointError, RemoteError};
pub use memory::{MemoryKv, MemoryStats};
pub use transport::{KvConnector, KvSession, WatchEvent, WatchStream};
