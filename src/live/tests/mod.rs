//! Unit tests for live configs and the registry.
//! Remote values only; override-file behaviour is covered by the
//! integration tests.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tempfile::TempDir;

use crate::{
    config::DeploymentMode,
    config_store::{ConfigError, ConfigValue},
    context::{StoreContext, StoreContextBuilder},
    live::{LiveConfig, LiveConfigRegistry},
    remote::{EndpointConfig, EndpointNode, EndpointSource, MemoryKv},
};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
struct RateLimit {
    per_second: u32,
    burst: u32,
}

impl ConfigValue for RateLimit {}

fn builder(kv: &MemoryKv, dir: &TempDir) -> StoreContextBuilder {
    let endpoints = EndpointConfig::from_nodes(vec![EndpointNode {
        ip: "127.0.0.1".to_string(),
        port: 2379,
    }])
    .unwrap();

    StoreContext::builder(Arc::new(kv.clone()), dir.path())
        .endpoints(EndpointSource::fixed(endpoints))
}

fn context(kv: &MemoryKv, dir: &TempDir) -> Arc<StoreContext> {
    Arc::new(builder(kv, dir).build())
}

mod live_config {
    use super::*;

    #[tokio::test]
    async fn init_loads_remote_value() {
        let kv = MemoryKv::new();
        let dir = TempDir::new().unwrap();
        let ctx = context(&kv, &dir);
        crate::config_store::ConfigStore::new(ctx.clone())
            .set("limits", r#"{"per_second":10,"burst":20}"#)
            .await
            .unwrap();

        let config = LiveConfig::<RateLimit>::new("limits", ctx);
        config.init().await.unwrap();

        assert!(config.is_initialized());
        assert!(config.existed());
        assert_eq!(*config.get(), RateLimit { per_second: 10, burst: 20 });
    }

    #[tokio::test]
    async fn init_of_absent_key_keeps_default() {
        let kv = MemoryKv::new();
        let dir = TempDir::new().unwrap();
        let config = LiveConfig::<RateLimit>::new("limits", context(&kv, &dir));

        config.init().await.unwrap();

        assert!(!config.existed());
        assert_eq!(*config.get(), RateLimit::default());
    }

    #[tokio::test]
    async fn second_init_is_a_no_op() {
        let kv = MemoryKv::new();
        let dir = TempDir::new().unwrap();
        let config = LiveConfig::<RateLimit>::new("limits", context(&kv, &dir));

        config.init().await.unwrap();
        config.init().await.unwrap();

        assert_eq!(kv.stats().reads, 1);
        assert_eq!(kv.stats().connects, 1);
    }

    #[tokio::test]
    async fn failed_init_can_be_retried() {
        let kv = MemoryKv::new();
        let dir = TempDir::new().unwrap();
        let config = LiveConfig::<RateLimit>::new("limits", context(&kv, &dir));

        kv.set_offline(true);
        assert!(matches!(config.init().await, Err(ConfigError::Connection { .. })));
        assert!(!config.is_initialized());

        kv.set_offline(false);
        config.init().await.unwrap();
        assert!(config.is_initialized());
    }

    #[tokio::test]
    async fn malformed_remote_value_fails_init() {
        let kv = MemoryKv::new();
        let dir = TempDir::new().unwrap();
        let ctx = context(&kv, &dir);
        crate::config_store::ConfigStore::new(ctx.clone())
            .set("limits", "{oops")
            .await
            .unwrap();

        let config = LiveConfig::<RateLimit>::new("limits", ctx);

        assert!(matches!(config.init().await, Err(ConfigError::Format { .. })));
    }

    #[tokio::test]
    async fn development_mode_skips_the_store() {
        let kv = MemoryKv::new();
        let dir = TempDir::new().unwrap();
        let ctx = Arc::new(builder(&kv, &dir).mode(DeploymentMode::Development).build());
        let config = LiveConfig::<RateLimit>::new("limits", ctx);

        config.init().await.unwrap();

        assert!(config.is_initialized());
        assert_eq!(kv.stats().connects, 0);
        assert_eq!(*config.get(), RateLimit::default());
    }

    #[tokio::test]
    async fn development_mode_with_remote_reads_the_store() {
        let kv = MemoryKv::new();
        let dir = TempDir::new().unwrap();
        let ctx = Arc::new(
            builder(&kv, &dir)
                .mode(DeploymentMode::Development)
                .use_remote_in_dev(true)
                .build(),
        );
        let config = LiveConfig::<RateLimit>::new("limits", ctx);

        config.init().await.unwrap();

        assert_eq!(kv.stats().reads, 1);
    }

    #[tokio::test]
    async fn set_writes_through_and_replaces_value() {
        let kv = MemoryKv::new();
        let dir = TempDir::new().unwrap();
        let config = LiveConfig::<RateLimit>::new("limits", context(&kv, &dir));
        config.init().await.unwrap();
        let value = RateLimit { per_second: 5, burst: 7 };

        config.set(value.clone()).await.unwrap();

        assert_eq!(*config.get(), value);
        assert!(!config.existed());
        assert_eq!(
            kv.snapshot("config_limits").unwrap().value,
            r#"{"per_second":5,"burst":7}"#
        );
    }

    #[tokio::test]
    async fn failed_set_keeps_old_value() {
        let kv = MemoryKv::new();
        let dir = TempDir::new().unwrap();
        let config = LiveConfig::<RateLimit>::new("limits", context(&kv, &dir));
        config.init().await.unwrap();

        kv.set_offline(true);
        let result = config.set(RateLimit { per_second: 1, burst: 1 }).await;

        assert!(result.is_err());
        assert_eq!(*config.get(), RateLimit::default());
    }
}

mod registry {
    use super::*;

    #[tokio::test]
    async fn keys_are_prefix_and_tag() {
        let kv = MemoryKv::new();
        let dir = TempDir::new().unwrap();
        let registry = LiveConfigRegistry::<RateLimit>::new("limit", context(&kv, &dir));

        assert_eq!(registry.key_for(7), "limit_7");
    }

    #[tokio::test]
    async fn unknown_tags_are_not_found() {
        let kv = MemoryKv::new();
        let dir = TempDir::new().unwrap();
        let registry = LiveConfigRegistry::<RateLimit>::new("limit", context(&kv, &dir));

        assert!(matches!(registry.get(3).await, Err(ConfigError::NotFound { tag: 3 })));
        assert!(matches!(
            registry.set(3, RateLimit::default()).await,
            Err(ConfigError::NotFound { tag: 3 })
        ));
        assert!(!registry.existed(3).await);
        assert!(registry.tags().await.is_empty());
    }

    #[tokio::test]
    async fn failed_add_is_not_registered() {
        let kv = MemoryKv::new();
        let dir = TempDir::new().unwrap();
        let registry = LiveConfigRegistry::<RateLimit>::new("limit", context(&kv, &dir));

        kv.set_offline(true);
        assert!(registry.add_new(1).await.is_err());

        assert!(registry.entry(1).await.is_err());
    }

    #[tokio::test]
    async fn snapshot_holds_every_registered_value() {
        let kv = MemoryKv::new();
        let dir = TempDir::new().unwrap();
        let ctx = context(&kv, &dir);
        crate::config_store::ConfigStore::new(ctx.clone())
            .set("limit_2", r#"{"per_second":2,"burst":4}"#)
            .await
            .unwrap();
        let registry = LiveConfigRegistry::<RateLimit>::new("limit", ctx);

        registry.add_new(2).await.unwrap();
        registry.add_new(1).await.unwrap();
        let all = registry.get_all_as_map().await;

        assert_eq!(registry.tags().await, vec![1, 2]);
        assert_eq!(*all[&1], RateLimit::default());
        assert_eq!(*all[&2], RateLimit { per_second: 2, burst: 4 });
        assert!(registry.existed(2).await);
        assert!(!registry.existed(1).await);
    }
}
