use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;
use tracing::{debug, instrument};

use super::LiveConfig;
use crate::{
    config_store::{ConfigError, ConfigValue},
    context::StoreContext,
};

/// A family of [`LiveConfig`]s of one type, addressed by numeric tag.
///
/// The config for tag `n` is bound to key `"{prefix}_{n}"`. Entries are
/// created by [`add_new`](Self::add_new) and never removed; lookups never
/// create them.
pub struct LiveConfigRegistry<T: ConfigValue> {
    prefix: String,
    context: Arc<StoreContext>,
    entries: RwLock<HashMap<u32, Arc<LiveConfig<T>>>>,
}

impl<T: ConfigValue> LiveConfigRegistry<T> {
    /// Creates an empty registry.
    pub fn new(prefix: impl Into<String>, context: Arc<StoreContext>) -> Self {
        Self {
            prefix: prefix.into(),
            context,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Key bound to `tag`.
    pub fn key_for(&self, tag: u32) -> String {
        format!("{}_{tag}", self.prefix)
    }

    /// Registers and initializes the config for `tag`. Does nothing if the
    /// tag is already registered.
    ///
    /// The write lock is held across initialization, so concurrent calls for
    /// any tag are serialized and each tag is initialized once.
    ///
    /// # Errors
    /// Returns the initialization error; the tag stays unregistered.
    #[instrument(skip(self), fields(prefix = %self.prefix))]
    pub async fn add_new(&self, tag: u32) -> Result<(), ConfigError> {
        let mut entries = self.entries.write().await;
        if entries.contains_key(&tag) {
            return Ok(());
        }

        let config = LiveConfig::new(self.key_for(tag), self.context.clone());
        config.init().await?;
        entries.insert(tag, Arc::new(config));
        debug!("Registered live config");

        Ok(())
    }

    /// The config registered for `tag`.
    ///
    /// # Errors
    /// Returns [`ConfigError::NotFound`] for unknown tags.
    pub async fn entry(&self, tag: u32) -> Result<Arc<LiveConfig<T>>, ConfigError> {
        self.entries
            .read()
            .await
            .get(&tag)
            .cloned()
            .ok_or(ConfigError::NotFound { tag })
    }

    /// Current value for `tag`.
    ///
    /// # Errors
    /// Returns [`ConfigError::NotFound`] for unknown tags.
    pub async fn get(&self, tag: u32) -> Result<Arc<T>, ConfigError> {
        Ok(self.entry(tag).await?.get())
    }

    /// Writes the value for `tag` through to the store.
    ///
    /// # Errors
    /// Returns [`ConfigError::NotFound`] for unknown tags, or the write error.
    pub async fn set(&self, tag: u32, value: T) -> Result<(), ConfigError> {
        self.entry(tag).await?.set(value).await
    }

    /// Whether `tag` is registered and its key currently holds a value.
    pub async fn existed(&self, tag: u32) -> bool {
        self.entries
            .read()
            .await
            .get(&tag)
            .is_some_and(|config| config.existed())
    }

    /// Snapshot of every registered value.
    pub async fn get_all_as_map(&self) -> HashMap<u32, Arc<T>> {
        self.entries
            .read()
            .await
            .iter()
            .map(|(tag, config)| (*tag, config.get()))
            .collect()
    }

    /// Registered tags, in ascending order.
    pub async fn tags(&self) -> Vec<u32> {
        let mut tags: Vec<u32> = self.entries.read().await.keys().copied().collect();
        tags.sort_unstable();
        tags
    }
}
