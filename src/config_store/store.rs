use std::{ops::ControlFlow, sync::Arc};

use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use super::{ConfigError, ConfigValue};
use crate::{
    context::StoreContext,
    item::{Item, ItemSource},
    remote::{RemoteError, RemoteStoreClient, WatchEvent, WatchStream},
};

/// Reads and writes configuration values.
///
/// Reads consult the local override directory first; a valid override file
/// wins and the remote store is not contacted. Writes always go to the remote
/// store under `<namespace><key>`; override files are never written.
///
/// The remote session is opened on first use and kept until [`close`](Self::close).
/// Operations take `&mut self`: create one store per logical caller, or a
/// short-lived one per call.
pub struct ConfigStore {
    context: Arc<StoreContext>,
    client: Option<RemoteStoreClient>,
}

impl ConfigStore {
    /// Creates a store without opening a session.
    pub fn new(context: Arc<StoreContext>) -> Self {
        Self {
            context,
            client: None,
        }
    }

    /// The shared context.
    pub fn context(&self) -> &Arc<StoreContext> {
        &self.context
    }

    /// Whether a remote session is currently open.
    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    /// Closes the remote session, if any. The next operation reopens it.
    ///
    /// # Errors
    /// Returns an error if the session fails to shut down cleanly; the
    /// session is released either way.
    pub async fn close(&mut self) -> Result<(), ConfigError> {
        if let Some(client) = self.client.take() {
            client.close(self.context.timeouts().point).await?;
            debug!("Closed key-value session");
        }
        Ok(())
    }

    /// Closes the session and logs instead of returning failures.
    pub async fn close_ignore_error(&mut self) {
        if let Err(e) = self.close().await {
            warn!(error = %e, "Failed to close key-value session");
        }
    }

    /// Reads a key. Absent keys come back with an empty value and version 0.
    ///
    /// # Errors
    /// Returns [`ConfigError::Connection`] or [`ConfigError::Timeout`] when
    /// the remote read fails.
    pub async fn get(&mut self, key: &str) -> Result<Item, ConfigError> {
        self.get_with_source(key).await.map(|(item, _)| item)
    }

    /// Reads a key and reports whether the local override or the remote
    /// store answered.
    ///
    /// Unreadable or malformed override files are logged and skipped.
    ///
    /// # Errors
    /// Returns [`ConfigError::Connection`] or [`ConfigError::Timeout`] when
    /// the remote read fails.
    #[instrument(skip(self))]
    pub async fn get_with_source(&mut self, key: &str) -> Result<(Item, ItemSource), ConfigError> {
        match self.context.overrides().read(key).await {
            Ok(Some(item)) => {
                debug!("Serving local override");
                return Ok((item, ItemSource::Local));
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Ignoring unusable override file"),
        }

        let client = self.client().await?;
        let remote_key = self.context.namespaced(key);
        let result = client
            .get_with_version(&remote_key, self.context.timeouts().point)
            .await;
        let (value, version) = self.check(result)?;

        Ok((Item::new(key, value, version), ItemSource::Remote))
    }

    /// Reads and decodes a JSON value. `None` when the key holds no value.
    ///
    /// # Errors
    /// Returns [`ConfigError::Format`] if the value is not valid JSON for `T`,
    /// and connection or timeout errors from the read.
    pub async fn get_json<T>(&mut self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: DeserializeOwned,
    {
        let item = self.get(key).await?;
        if item.value.is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&item.value)
            .map(Some)
            .map_err(|e| ConfigError::format(key, e))
    }

    /// Decodes a JSON value into `target`. Returns whether the key held a
    /// value; `target` is untouched when it did not.
    ///
    /// # Errors
    /// Same as [`get_json`](Self::get_json).
    pub async fn get_json_into<T>(&mut self, key: &str, target: &mut T) -> Result<bool, ConfigError>
    where
        T: DeserializeOwned,
    {
        match self.get_json(key).await? {
            Some(value) => {
                *target = value;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Reads a single top-level field of a JSON object value.
    ///
    /// `None` when the key holds no value or the object has no such field.
    ///
    /// # Errors
    /// Returns [`ConfigError::Format`] if the value is not a JSON object.
    pub async fn get_json_field(&mut self, key: &str, field: &str) -> Result<Option<Value>, ConfigError> {
        let item = self.get(key).await?;
        if item.value.is_empty() {
            return Ok(None);
        }

        let mut object: Map<String, Value> =
            serde_json::from_str(&item.value).map_err(|e| ConfigError::format(key, e))?;
        Ok(object.remove(field))
    }

    /// Writes a raw value.
    ///
    /// # Errors
    /// Returns connection or timeout errors.
    #[instrument(skip(self, value))]
    pub async fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let client = self.client().await?;
        let result = client
            .put(&self.context.namespaced(key), value, self.context.timeouts().point)
            .await;
        self.check(result)
    }

    /// Encodes `value` as JSON and writes it.
    ///
    /// # Errors
    /// Returns [`ConfigError::Serialization`] if encoding fails, and
    /// connection or timeout errors from the write.
    pub async fn set_json<T>(&mut self, key: &str, value: &T) -> Result<(), ConfigError>
    where
        T: ConfigValue,
    {
        let encoded = value.to_config_json().map_err(|e| ConfigError::Serialization {
            key: key.to_string(),
            details: e.to_string(),
        })?;
        self.set(key, &encoded).await
    }

    /// Writes `value` only if the stored version equals `expected_version`.
    ///
    /// Use version 0 to create a key that must not exist yet.
    ///
    /// # Errors
    /// Returns [`ConfigError::VersionConflict`] if the version did not match,
    /// and connection or timeout errors otherwise.
    #[instrument(skip(self, value))]
    pub async fn set_with_version(
        &mut self,
        key: &str,
        value: &str,
        expected_version: i64,
    ) -> Result<(), ConfigError> {
        let client = self.client().await?;
        let result = client
            .put_if_version(
                &self.context.namespaced(key),
                value,
                expected_version,
                self.context.timeouts().point,
            )
            .await;

        if self.check(result)? {
            Ok(())
        } else {
            Err(ConfigError::VersionConflict {
                key: key.to_string(),
                expected_version,
            })
        }
    }

    /// Deletes a key from the remote store.
    ///
    /// # Errors
    /// Returns connection or timeout errors.
    #[instrument(skip(self))]
    pub async fn delete(&mut self, key: &str) -> Result<(), ConfigError> {
        let client = self.client().await?;
        let result = client
            .delete(&self.context.namespaced(key), self.context.timeouts().point)
            .await;
        self.check(result)
    }

    /// Lists every remote key starting with `prefix`, with the namespace
    /// stripped. Local overrides are not consulted.
    ///
    /// # Errors
    /// Returns connection or timeout errors; no partial results are returned.
    #[instrument(skip(self))]
    pub async fn list_by_prefix(&mut self, prefix: &str) -> Result<Vec<Item>, ConfigError> {
        let client = self.client().await?;
        let result = client
            .prefix_scan(&self.context.namespaced(prefix), self.context.timeouts().scan)
            .await;
        let items = self.check(result)?;

        let namespace = self.context.namespace();
        Ok(items
            .into_iter()
            .map(|mut item| {
                if let Some(stripped) = item.key.strip_prefix(namespace) {
                    item.key = stripped.to_string();
                }
                item
            })
            .collect())
    }

    /// Opens a raw remote watch stream on a key.
    ///
    /// # Errors
    /// Returns connection or timeout errors while subscribing.
    pub async fn watch_stream(&mut self, key: &str) -> Result<WatchStream, ConfigError> {
        let client = self.client().await?;
        let result = client
            .watch(&self.context.namespaced(key), self.context.timeouts().point)
            .await;
        self.check(result)
    }

    /// Delivers remote changes of a key to `callback` until it returns
    /// [`ControlFlow::Break`] or the stream ends.
    ///
    /// # Errors
    /// Returns connection or timeout errors while subscribing, and any error
    /// the stream reports.
    #[instrument(skip(self, callback))]
    pub async fn watch<F>(&mut self, key: &str, mut callback: F) -> Result<(), ConfigError>
    where
        F: FnMut(WatchEvent) -> ControlFlow<()>,
    {
        let mut stream = self.watch_stream(key).await?;

        while let Some(event) = stream.next().await {
            let event = self.check(event)?;
            if callback(event).is_break() {
                debug!("Watch stopped by callback");
                return Ok(());
            }
        }

        debug!("Watch stream ended");
        Ok(())
    }

    async fn client(&mut self) -> Result<RemoteStoreClient, ConfigError> {
        if let Some(client) = &self.client {
            return Ok(client.clone());
        }

        let endpoints = self.context.endpoints().current().await;
        let client = RemoteStoreClient::connect(self.context.connector(), &endpoints).await?;
        self.client = Some(client.clone());
        Ok(client)
    }

    /// Converts a remote result, forgetting the session once it is gone so
    /// the next operation reconnects.
    fn check<T>(&mut self, result: Result<T, RemoteError>) -> Result<T, ConfigError> {
        result.map_err(|e| {
            if matches!(e, RemoteError::Closed | RemoteError::Connection { .. }) {
                self.client = None;
            }
            e.into()
        })
    }
}
