//! Transport seam for the key-value store.
//!
//! Implementations own the wire protocol. Deadlines are applied one level up
//! by [`RemoteStoreClient`](super::RemoteStoreClient), so transports may block
//! for as long as the underlying call takes.

use std::{pin::Pin, sync::Arc, time::Duration};

use async_trait::async_trait;
use futures::Stream;

use super::RemoteError;
use crate::item::Item;

/// A change observed on a watched key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// The key was written with this value.
    Put(String),
    /// The key was deleted.
    Delete,
}

/// Live subscription to a single key.
///
/// The stream ends when the connection drops or the session is closed.
pub type WatchStream = Pin<Box<dyn Stream<Item = Result<WatchEvent, RemoteError>> + Send>>;

/// Opens sessions against a set of endpoints.
#[async_trait]
pub trait KvConnector: Send + Sync {
    /// Connects to the store.
    ///
    /// # Errors
    /// Returns [`RemoteError::Connection`] if no endpoint can be reached.
    async fn connect(
        &self,
        endpoints: &[String],
        connect_timeout: Duration,
    ) -> Result<Arc<dyn KvSession>, RemoteError>;
}

/// An open session with the key-value store.
///
/// All keys passed here are fully qualified; namespacing is the caller's job.
#[async_trait]
pub trait KvSession: Send + Sync {
    /// Reads a key. `None` if it does not exist.
    async fn get(&self, key: &str) -> Result<Option<Item>, RemoteError>;

    /// Reads every key starting with `prefix`.
    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<Item>, RemoteError>;

    /// Writes a key unconditionally.
    async fn put(&self, key: &str, value: &str) -> Result<(), RemoteError>;

    /// Writes a key only if its current version equals `expected_version`.
    ///
    /// A missing key has version 0. Returns `false` when the versions differ.
    async fn put_if_version(
        &self,
        key: &str,
        value: &str,
        expected_version: i64,
    ) -> Result<bool, RemoteError>;

    /// Deletes a key. Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<(), RemoteError>;

    /// Subscribes to changes of a single key.
    async fn watch(&self, key: &str) -> Result<WatchStream, RemoteError>;

    /// Releases the session.
    async fn close(&self) -> Result<(), RemoteError>;
}
