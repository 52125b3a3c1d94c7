//! Unit tests for the remote module.
//! Uses the in-process store only; no network.

#![allow(clippy::unwrap_used)]

use std::{sync::Arc, time::Duration};

use futures::StreamExt;

use crate::remote::{
    EndpointConfig, EndpointError, EndpointNode, KvConnector, KvSession, MemoryKv,
    RemoteError, RemoteStoreClient, WatchEvent,
};

const TIMEOUT: Duration = Duration::from_secs(3);

fn local_endpoints() -> EndpointConfig {
    EndpointConfig::from_nodes(vec![EndpointNode {
        ip: "127.0.0.1".to_string(),
        port: 2379,
    }])
    .unwrap()
}

async fn connected(kv: &MemoryKv) -> RemoteStoreClient {
    RemoteStoreClient::connect(kv, &local_endpoints()).await.unwrap()
}

#[test]
fn endpoint_parse_applies_default_timeouts() {
    let config = EndpointConfig::parse(r#"{"node":[{"ip":"10.0.0.1","port":2379}]}"#).unwrap();

    assert_eq!(config.endpoint_list(), ["http://10.0.0.1:2379"]);
    assert_eq!(config.connect_timeout(), Duration::from_millis(800));
    assert_eq!(config.op_timeout(), Duration::from_millis(5000));
}

#[test]
fn endpoint_parse_keeps_explicit_timeouts() {
    let config = EndpointConfig::parse(
        r#"{"node":[{"ip":"a","port":1},{"ip":"b","port":2}],"connect_timeout_ms":100,"op_timeout_ms":250}"#,
    )
    .unwrap();

    assert_eq!(config.endpoint_list(), ["http://a:1", "http://b:2"]);
    assert_eq!(config.connect_timeout(), Duration::from_millis(100));
    assert_eq!(config.op_timeout(), Duration::from_millis(250));
}

#[test]
fn endpoint_parse_rejects_incomplete_config() {
    assert_eq!(EndpointConfig::parse(r#"{"node":[]}"#), Err(EndpointError::NoNodes));
    assert!(matches!(
        EndpointConfig::parse(r#"{"node":[{"ip":"","port":2379}]}"#),
        Err(EndpointError::InvalidNode { .. })
    ));
    assert!(matches!(
        EndpointConfig::parse(r#"{"node":[{"ip":"h","port":0}]}"#),
        Err(EndpointError::InvalidNode { .. })
    ));
    assert!(matches!(
        EndpointConfig::parse("not json"),
        Err(EndpointError::Parse { .. })
    ));
}

#[tokio::test]
async fn connect_fails_fast_without_endpoints() {
    let kv = MemoryKv::new();

    let result = RemoteStoreClient::connect(&kv, &EndpointConfig::default()).await;

    assert!(matches!(result, Err(RemoteError::Connection { .. })));
    assert_eq!(kv.stats().connects, 0);
}

#[tokio::test]
async fn connect_fails_when_store_is_offline() {
    let kv = MemoryKv::new();
    kv.set_offline(true);

    let result = RemoteStoreClient::connect(&kv, &local_endpoints()).await;

    assert!(matches!(result, Err(RemoteError::Connection { .. })));
}

#[tokio::test]
async fn absent_key_reads_as_empty_with_zero_version() {
    let kv = MemoryKv::new();
    let client = connected(&kv).await;

    let (value, version) = client.get_with_version("missing", TIMEOUT).await.unwrap();

    assert_eq!(value, "");
    assert_eq!(version, 0);
}

#[tokio::test]
async fn versions_start_at_one_and_grow_per_write() {
    let kv = MemoryKv::new();
    let client = connected(&kv).await;

    client.put("k", "a", TIMEOUT).await.unwrap();
    assert_eq!(client.get_with_version("k", TIMEOUT).await.unwrap(), ("a".to_string(), 1));

    client.put("k", "b", TIMEOUT).await.unwrap();
    assert_eq!(client.get_with_version("k", TIMEOUT).await.unwrap(), ("b".to_string(), 2));

    client.delete("k", TIMEOUT).await.unwrap();
    assert_eq!(client.get_with_version("k", TIMEOUT).await.unwrap(), (String::new(), 0));
}

#[tokio::test]
async fn compare_and_set_reports_stale_version() {
    let kv = MemoryKv::new();
    let client = connected(&kv).await;

    assert!(client.put_if_version("k", "first", 0, TIMEOUT).await.unwrap());
    assert!(!client.put_if_version("k", "second", 0, TIMEOUT).await.unwrap());
    assert!(client.put_if_version("k", "second", 1, TIMEOUT).await.unwrap());

    assert_eq!(kv.snapshot("k").unwrap().value, "second");
    assert_eq!(kv.snapshot("k").unwrap().version, 2);
}

#[tokio::test]
async fn prefix_scan_only_returns_matching_keys() {
    let kv = MemoryKv::new();
    let client = connected(&kv).await;

    client.put("app_a", "1", TIMEOUT).await.unwrap();
    client.put("app_b", "2", TIMEOUT).await.unwrap();
    client.put("apq", "3", TIMEOUT).await.unwrap();
    client.put("other", "4", TIMEOUT).await.unwrap();

    let keys: Vec<String> = client
        .prefix_scan("app_", TIMEOUT)
        .await
        .unwrap()
        .into_iter()
        .map(|item| item.key)
        .collect();

    assert_eq!(keys, ["app_a", "app_b"]);
}

#[tokio::test(start_paused = true)]
async fn slow_operations_time_out() {
    let kv = MemoryKv::new();
    let client = connected(&kv).await;
    kv.set_latency(Duration::from_secs(10));

    let result = client.get_with_version("k", Duration::from_secs(3)).await;

    assert_eq!(
        result,
        Err(RemoteError::Timeout {
            operation: "get",
            timeout: Duration::from_secs(3),
        })
    );
}

#[tokio::test]
async fn watch_delivers_puts_and_deletes_for_its_key() {
    let kv = MemoryKv::new();
    let client = connected(&kv).await;
    let mut stream = client.watch("k", TIMEOUT).await.unwrap();

    client.put("other", "x", TIMEOUT).await.unwrap();
    client.put("k", "v1", TIMEOUT).await.unwrap();
    client.delete("k", TIMEOUT).await.unwrap();

    assert_eq!(stream.next().await.unwrap().unwrap(), WatchEvent::Put("v1".to_string()));
    assert_eq!(stream.next().await.unwrap().unwrap(), WatchEvent::Delete);
}

#[tokio::test]
async fn going_offline_ends_watch_streams() {
    let kv = MemoryKv::new();
    let session: Arc<dyn KvSession> = kv.connect(&[], TIMEOUT).await.unwrap();
    let mut stream = session.watch("k").await.unwrap();

    kv.set_offline(true);

    assert!(stream.next().await.is_none());
    assert!(matches!(session.get("k").await, Err(RemoteError::Connection { .. })));
}
