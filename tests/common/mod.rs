//! Shared fixtures for integration tests.

#![allow(dead_code, clippy::unwrap_used, clippy::panic)]

use std::{
    collections::HashMap,
    fs,
    future::Future,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use confsync::{
    context::{StoreContext, StoreContextBuilder, WatchOptions},
    local::{FsEvent, FsSubscription, FsWatch, LocalError},
    remote::{EndpointConfig, EndpointNode, EndpointSource, MemoryKv},
};
use tempfile::TempDir;
use tokio::sync::mpsc;

pub const RECHECK: Duration = Duration::from_millis(20);
pub const WAIT: Duration = Duration::from_secs(5);

/// Scriptable [`FsWatch`]: events are emitted by the test, and open
/// subscriptions are counted.
#[derive(Clone, Default)]
pub struct FakeFsWatch {
    state: Arc<Mutex<FakeState>>,
}

#[derive(Default)]
struct FakeState {
    next_id: u64,
    open: HashMap<u64, (PathBuf, Option<mpsc::UnboundedSender<FsEvent>>)>,
    max_open: usize,
    total: usize,
    failures: usize,
}

impl FakeFsWatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sends `event` to every open subscription on `path`.
    pub fn emit(&self, path: &Path, event: FsEvent) -> usize {
        let state = self.state.lock().unwrap();
        state
            .open
            .values()
            .filter(|(watched, _)| watched == path)
            .filter_map(|(_, events)| events.as_ref())
            .filter(|events| events.send(event).is_ok())
            .count()
    }

    /// Ends every open event stream without closing the subscriptions.
    pub fn end_streams(&self) {
        let mut state = self.state.lock().unwrap();
        for (_, events) in state.open.values_mut() {
            events.take();
        }
    }

    /// Makes the next `count` subscribe calls fail.
    pub fn fail_next(&self, count: usize) {
        self.state.lock().unwrap().failures = count;
    }

    pub fn open(&self) -> usize {
        self.state.lock().unwrap().open.len()
    }

    pub fn max_open(&self) -> usize {
        self.state.lock().unwrap().max_open
    }

    pub fn total(&self) -> usize {
        self.state.lock().unwrap().total
    }
}

impl FsWatch for FakeFsWatch {
    fn subscribe(&self, path: &Path) -> Result<Box<dyn FsSubscription>, LocalError> {
        let mut state = self.state.lock().unwrap();
        if state.failures > 0 {
            state.failures -= 1;
            return Err(LocalError::Subscribe {
                path: path.to_path_buf(),
                details: "injected failure".to_string(),
            });
        }

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let id = state.next_id;
        state.next_id += 1;
        state.open.insert(id, (path.to_path_buf(), Some(events_tx)));
        state.total += 1;
        state.max_open = state.max_open.max(state.open.len());

        Ok(Box::new(FakeSubscription {
            id,
            events: events_rx,
            state: self.state.clone(),
            closed: false,
        }))
    }
}

struct FakeSubscription {
    id: u64,
    events: mpsc::UnboundedReceiver<FsEvent>,
    state: Arc<Mutex<FakeState>>,
    closed: bool,
}

#[async_trait]
impl FsSubscription for FakeSubscription {
    async fn next_event(&mut self) -> Option<FsEvent> {
        if self.closed {
            return None;
        }
        self.events.recv().await
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.state.lock().unwrap().open.remove(&self.id);
        }
    }
}

impl Drop for FakeSubscription {
    fn drop(&mut self) {
        self.close();
    }
}

/// In-process store, temporary override directory and fake file events.
pub struct Harness {
    pub kv: MemoryKv,
    pub dir: TempDir,
    pub fs: FakeFsWatch,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            kv: MemoryKv::new(),
            dir: TempDir::new().unwrap(),
            fs: FakeFsWatch::new(),
        }
    }

    pub fn builder(&self) -> StoreContextBuilder {
        let endpoints = EndpointConfig::from_nodes(vec![EndpointNode {
            ip: "127.0.0.1".to_string(),
            port: 2379,
        }])
        .unwrap();

        StoreContext::builder(Arc::new(self.kv.clone()), self.dir.path())
            .endpoints(EndpointSource::fixed(endpoints))
            .fs_watch(Arc::new(self.fs.clone()))
            .watch(WatchOptions {
                recheck_interval: RECHECK,
                remote: false,
                remote_backoff: Duration::from_millis(50),
            })
    }

    pub fn context(&self) -> Arc<StoreContext> {
        Arc::new(self.builder().build())
    }

    pub fn override_path(&self, key: &str) -> PathBuf {
        self.dir.path().join(format!("{key}.json"))
    }

    /// Writes an override file in one step, so readers never see it half written.
    pub fn write_override(&self, key: &str, value: &str, version: i64) {
        let item = serde_json::json!({ "Key": key, "Val": value, "Ver": version });
        let staged = self.dir.path().join(format!("{key}.json.tmp"));
        fs::write(&staged, item.to_string()).unwrap();
        fs::rename(&staged, self.override_path(key)).unwrap();
    }

    pub fn write_raw_override(&self, key: &str, content: &str) {
        fs::write(self.override_path(key), content).unwrap();
    }

    pub fn remove_override(&self, key: &str) {
        fs::remove_file(self.override_path(key)).unwrap();
    }
}

/// Polls `condition` until it holds, failing the test after [`WAIT`].
pub async fn eventually<F>(what: &str, condition: F)
where
    F: Fn() -> bool,
{
    let polled = tokio::time::timeout(WAIT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;

    if polled.is_err() {
        panic!("timed out waiting for {what}");
    }
}

/// Awaits `future`, failing the test after [`WAIT`].
pub async fn within<T>(what: &str, future: impl Future<Output = T>) -> T {
    match tokio::time::timeout(WAIT, future).await {
        Ok(value) => value,
        Err(_) => panic!("timed out waiting for {what}"),
    }
}
