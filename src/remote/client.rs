use std::{future::Future, sync::Arc, time::Duration};

use tracing::{debug, instrument};

use super::{EndpointConfig, KvConnector, KvSession, RemoteError, WatchStream};
use crate::item::Item;

/// Deadline-enforcing client over a [`KvSession`].
///
/// Every operation takes an explicit timeout and fails with
/// [`RemoteError::Timeout`] once it elapses. Cloning is cheap and shares the
/// underlying session.
#[derive(Clone)]
pub struct RemoteStoreClient {
    session: Arc<dyn KvSession>,
}

impl RemoteStoreClient {
    /// Opens a session against the configured endpoints.
    ///
    /// # Errors
    /// Returns [`RemoteError::Connection`] immediately if the endpoint list is
    /// empty, and whatever the connector reports otherwise. The connect
    /// timeout from `endpoints` bounds the attempt.
    #[instrument(skip_all)]
    pub async fn connect(
        connector: &dyn KvConnector,
        endpoints: &EndpointConfig,
    ) -> Result<Self, RemoteError> {
        let endpoint_list = endpoints.endpoint_list();
        if endpoint_list.is_empty() {
            return Err(RemoteError::connection("no endpoints configured"));
        }

        let connect_timeout = endpoints.connect_timeout();
        let session = deadline(
            "connect",
            connect_timeout,
            connector.connect(endpoint_list, connect_timeout),
        )
        .await?;

        debug!(endpoints = ?endpoint_list, "Connected to key-value store");
        Ok(Self { session })
    }

    /// Wraps an already open session.
    pub fn from_session(session: Arc<dyn KvSession>) -> Self {
        Self { session }
    }

    /// Reads a key and its version. Absent keys read as `("", 0)`.
    ///
    /// # Errors
    /// Returns [`RemoteError`] on connection failure or timeout.
    pub async fn get_with_version(
        &self,
        key: &str,
        timeout: Duration,
    ) -> Result<(String, i64), RemoteError> {
        let found = deadline("get", timeout, self.session.get(key)).await?;

        Ok(found
            .map(|item| (item.value, item.version))
            .unwrap_or_default())
    }

    /// Reads every key under `prefix`. Ordering is not part of the contract.
    ///
    /// # Errors
    /// Returns [`RemoteError`] on connection failure or timeout.
    pub async fn prefix_scan(&self, prefix: &str, timeout: Duration) -> Result<Vec<Item>, RemoteError> {
        deadline("prefix scan", timeout, self.session.scan_prefix(prefix)).await
    }

    /// Writes a key unconditionally.
    ///
    /// # Errors
    /// Returns [`RemoteError`] on connection failure or timeout.
    pub async fn put(&self, key: &str, value: &str, timeout: Duration) -> Result<(), RemoteError> {
        deadline("put", timeout, self.session.put(key, value)).await
    }

    /// Compare-and-set on the key's version.
    ///
    /// `Ok(false)` means the stored version did not match and nothing was
    /// written.
    ///
    /// # Errors
    /// Returns [`RemoteError`] on connection failure or timeout.
    pub async fn put_if_version(
        &self,
        key: &str,
        value: &str,
        expected_version: i64,
        timeout: Duration,
    ) -> Result<bool, RemoteError> {
        deadline(
            "compare-and-set",
            timeout,
            self.session.put_if_version(key, value, expected_version),
        )
        .await
    }

    /// Deletes a key.
    ///
    /// # Errors
    /// Returns [`RemoteError`] on connection failure or timeout.
    pub async fn delete(&self, key: &str, timeout: Duration) -> Result<(), RemoteError> {
        deadline("delete", timeout, self.session.delete(key)).await
    }

    /// Subscribes to a key. `timeout` bounds establishing the subscription
    /// only; the stream itself stays open until the connection drops.
    ///
    /// # Errors
    /// Returns [`RemoteError`] on connection failure or timeout.
    pub async fn watch(&self, key: &str, timeout: Duration) -> Result<WatchStream, RemoteError> {
        deadline("watch", timeout, self.session.watch(key)).await
    }

    /// Closes the session.
    ///
    /// # Errors
    /// Returns [`RemoteError`] if the transport fails to shut down cleanly.
    pub async fn close(&self, timeout: Duration) -> Result<(), RemoteError> {
        deadline("close", timeout, self.session.close()).await
    }
}

async fn deadline<T, F>(operation: &'static str, timeout: Duration, future: F) -> Result<T, RemoteError>
where
    F: Future<Output = Result<T, RemoteError>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(RemoteError::Timeout { operation, timeout }),
    }
}
