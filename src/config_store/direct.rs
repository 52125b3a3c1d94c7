//! One-shot remote operations.
//!
//! Each call opens its own session, runs a single operation and closes the
//! session again. Local overrides are not consulted. The deadline of every
//! operation is the `op_timeout_ms` of the endpoint configuration, not the
//! context's [`Timeouts`](crate::context::Timeouts).

use std::future::Future;

use tracing::{instrument, warn};

use super::ConfigError;
use crate::{
    context::StoreContext,
    item::Item,
    remote::{RemoteError, RemoteStoreClient},
};

/// Reads `<namespace><key>` straight from the remote store.
///
/// # Errors
/// Returns [`ConfigError::Connection`] or [`ConfigError::Timeout`].
pub async fn get(context: &StoreContext, key: &str) -> Result<Item, ConfigError> {
    get_with_prefix(context, context.namespace(), key).await
}

/// Reads `<prefix><key>`, for keys stored outside the configured namespace.
///
/// # Errors
/// Returns [`ConfigError::Connection`] or [`ConfigError::Timeout`].
#[instrument(skip(context))]
pub async fn get_with_prefix(
    context: &StoreContext,
    prefix: &str,
    key: &str,
) -> Result<Item, ConfigError> {
    let remote_key = format!("{prefix}{key}");
    let (value, version) = one_shot(context, |client, timeout| async move {
        client.get_with_version(&remote_key, timeout).await
    })
    .await?;

    Ok(Item::new(key, value, version))
}

/// Compare-and-set on `<namespace><key>`.
///
/// # Errors
/// Returns [`ConfigError::VersionConflict`] when the stored version differs
/// from `expected_version`, and connection or timeout errors otherwise.
pub async fn set_with_version(
    context: &StoreContext,
    key: &str,
    value: &str,
    expected_version: i64,
) -> Result<(), ConfigError> {
    set_with_version_prefixed(context, context.namespace(), key, value, expected_version).await
}

/// Compare-and-set on `<prefix><key>`.
///
/// # Errors
/// Same as [`set_with_version`].
#[instrument(skip(context, value))]
pub async fn set_with_version_prefixed(
    context: &StoreContext,
    prefix: &str,
    key: &str,
    value: &str,
    expected_version: i64,
) -> Result<(), ConfigError> {
    let remote_key = format!("{prefix}{key}");
    let applied = one_shot(context, |client, timeout| async move {
        client
            .put_if_version(&remote_key, value, expected_version, timeout)
            .await
    })
    .await?;

    if applied {
        Ok(())
    } else {
        Err(ConfigError::VersionConflict {
            key: key.to_string(),
            expected_version,
        })
    }
}

/// Deletes `<namespace><key>`.
///
/// # Errors
/// Returns connection or timeout errors.
#[instrument(skip(context))]
pub async fn delete(context: &StoreContext, key: &str) -> Result<(), ConfigError> {
    let remote_key = context.namespaced(key);
    one_shot(context, |client, timeout| async move {
        client.delete(&remote_key, timeout).await
    })
    .await
}

async fn one_shot<T, F, Fut>(context: &StoreContext, operation: F) -> Result<T, ConfigError>
where
    F: FnOnce(RemoteStoreClient, std::time::Duration) -> Fut,
    Fut: Future<Output = Result<T, RemoteError>>,
{
    let endpoints = context.endpoints().current().await;
    let timeout = endpoints.op_timeout();
    let client = RemoteStoreClient::connect(context.connector(), &endpoints).await?;

    let result = operation(client.clone(), timeout).await;
    if let Err(e) = client.close(timeout).await {
        warn!(error = %e, "Failed to close key-value session");
    }

    Ok(result?)
}
