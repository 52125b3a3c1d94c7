use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::{KvConnector, KvSession, RemoteError, WatchEvent, WatchStream};
use crate::item::Item;

/// Operation counters for a [`MemoryKv`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryStats {
    /// Sessions opened
    pub connects: usize,
    /// Point reads and prefix scans served
    pub reads: usize,
    /// Puts, compare-and-sets and deletes served
    pub writes: usize,
    /// Watch subscriptions opened
    pub watches: usize,
}

/// In-process versioned key-value store.
///
/// Behaves like the remote store as far as this crate can observe: versions
/// start at 1 and grow by one per write, a deleted key reads as version 0,
/// and watchers receive every put and delete of their key. Useful for tests
/// and local development. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryKv {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    entries: BTreeMap<String, Stored>,
    watchers: Vec<Watcher>,
    offline: bool,
    latency: Duration,
    stats: MemoryStats,
}

struct Stored {
    value: String,
    version: i64,
}

struct Watcher {
    key: String,
    events: mpsc::UnboundedSender<Result<WatchEvent, RemoteError>>,
}

impl MemoryState {
    fn check_online(&self) -> Result<(), RemoteError> {
        if self.offline {
            return Err(RemoteError::connection("store offline"));
        }
        Ok(())
    }

    fn version_of(&self, key: &str) -> i64 {
        self.entries.get(key).map_or(0, |stored| stored.version)
    }

    fn write(&mut self, key: &str, value: &str) {
        let version = self.version_of(key) + 1;
        self.entries.insert(
            key.to_string(),
            Stored {
                value: value.to_string(),
                version,
            },
        );
        self.notify(key, WatchEvent::Put(value.to_string()));
    }

    fn notify(&mut self, key: &str, event: WatchEvent) {
        self.watchers.retain(|watcher| {
            if watcher.key != key {
                return !watcher.events.is_closed();
            }
            watcher.events.send(Ok(event.clone())).is_ok()
        });
    }
}

impl MemoryKv {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn simulate_latency(&self) {
        let latency = self.lock().latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    /// Current operation counters.
    pub fn stats(&self) -> MemoryStats {
        self.lock().stats
    }

    /// Reads a key directly, bypassing counters and availability.
    pub fn snapshot(&self, key: &str) -> Option<Item> {
        self.lock()
            .entries
            .get(key)
            .map(|stored| Item::new(key, stored.value.clone(), stored.version))
    }

    /// Simulates losing (or regaining) the connection.
    ///
    /// Going offline fails every subsequent operation with
    /// [`RemoteError::Connection`] and ends all open watch streams.
    pub fn set_offline(&self, offline: bool) {
        let mut state = self.lock();
        state.offline = offline;
        if offline {
            state.watchers.clear();
        }
    }

    /// Delays every operation by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.lock().latency = latency;
    }
}

#[async_trait]
impl KvConnector for MemoryKv {
    async fn connect(
        &self,
        _endpoints: &[String],
        _connect_timeout: Duration,
    ) -> Result<Arc<dyn KvSession>, RemoteError> {
        let mut state = self.lock();
        state.check_online()?;
        state.stats.connects += 1;

        Ok(Arc::new(self.clone()))
    }
}

#[async_trait]
impl KvSession for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<Item>, RemoteError> {
        self.simulate_latency().await;
        let mut state = self.lock();
        state.check_online()?;
        state.stats.reads += 1;

        Ok(state
            .entries
            .get(key)
            .map(|stored| Item::new(key, stored.value.clone(), stored.version)))
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<Item>, RemoteError> {
        self.simulate_latency().await;
        let mut state = self.lock();
        state.check_online()?;
        state.stats.reads += 1;

        Ok(state
            .entries
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, stored)| Item::new(key.clone(), stored.value.clone(), stored.version))
            .collect())
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), RemoteError> {
        self.simulate_latency().await;
        let mut state = self.lock();
        state.check_online()?;
        state.stats.writes += 1;
        state.write(key, value);

        Ok(())
    }

    async fn put_if_version(
        &self,
        key: &str,
        value: &str,
        expected_version: i64,
    ) -> Result<bool, RemoteError> {
        self.simulate_latency().await;
        let mut state = self.lock();
        state.check_online()?;
        state.stats.writes += 1;

        if state.version_of(key) != expected_version {
            return Ok(false);
        }
        state.write(key, value);

        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<(), RemoteError> {
        self.simulate_latency().await;
        let mut state = self.lock();
        state.check_online()?;
        state.stats.writes += 1;

        if state.entries.remove(key).is_some() {
            state.notify(key, WatchEvent::Delete);
        }

        Ok(())
    }

    async fn watch(&self, key: &str) -> Result<WatchStream, RemoteError> {
        self.simulate_latency().await;
        let mut state = self.lock();
        state.check_online()?;
        state.stats.watches += 1;

        let (events, receiver) = mpsc::unbounded_channel();
        state.watchers.push(Watcher {
            key: key.to_string(),
            events,
        });

        Ok(Box::pin(UnboundedReceiverStream::new(receiver)))
    }

    async fn close(&self) -> Result<(), RemoteError> {
        Ok(())
    }
}
