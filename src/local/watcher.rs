use std::{path::PathBuf, sync::Arc, time::Duration};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::{FsEvent, FsSubscription, FsWatch, LocalOverrideStore};
use crate::item::Item;

/// Delay between existence checks and subscription retries while unarmed.
pub const DEFAULT_RECHECK_INTERVAL: Duration = Duration::from_secs(5);

/// Kind of change delivered to configuration callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// The value appeared
    Created,
    /// The value changed
    Updated,
    /// The value disappeared
    Deleted,
}

/// Event emitted by a [`LocalChangeWatcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemEvent {
    /// The override file appeared (or was found at startup) with a valid item.
    Created(Item),
    /// The override file changed and still holds a valid item.
    Updated(Item),
    /// The override file was removed.
    Deleted,
}

impl ItemEvent {
    /// The change kind of this event.
    pub fn kind(&self) -> ChangeKind {
        match self {
            ItemEvent::Created(_) => ChangeKind::Created,
            ItemEvent::Updated(_) => ChangeKind::Updated,
            ItemEvent::Deleted => ChangeKind::Deleted,
        }
    }

    /// The item carried by the event, if any.
    pub fn item(&self) -> Option<&Item> {
        match self {
            ItemEvent::Created(item) | ItemEvent::Updated(item) => Some(item),
            ItemEvent::Deleted => None,
        }
    }
}

/// Where the watch loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchPhase {
    /// No filesystem subscription is open; polling for the file.
    Unarmed,
    /// Subscribed to the override file.
    Armed,
    /// The loop has exited.
    Stopped,
}

type Handler = Box<dyn FnMut(ItemEvent) + Send>;

/// Watches the override file of a single key.
///
/// While the file is missing the watcher polls for it every recheck interval.
/// Once it exists, the current item is delivered as [`ItemEvent::Created`]
/// and a filesystem subscription is armed; subsequent writes are delivered as
/// [`ItemEvent::Updated`] and removal as [`ItemEvent::Deleted`], after which
/// polling resumes. At most one subscription is open at any time.
///
/// The handler runs on the watcher's own task, one event at a time.
/// Dropping the watcher stops it.
pub struct LocalChangeWatcher {
    key: String,
    store: LocalOverrideStore,
    fs_watch: Arc<dyn FsWatch>,
    recheck_interval: Duration,
    cancel: CancellationToken,
    phase: watch::Sender<WatchPhase>,
    started: bool,
}

impl LocalChangeWatcher {
    /// Creates an idle watcher for `key`.
    pub fn new(key: impl Into<String>, store: LocalOverrideStore, fs_watch: Arc<dyn FsWatch>) -> Self {
        let (phase, _) = watch::channel(WatchPhase::Unarmed);

        Self {
            key: key.into(),
            store,
            fs_watch,
            recheck_interval: DEFAULT_RECHECK_INTERVAL,
            cancel: CancellationToken::new(),
            phase,
            started: false,
        }
    }

    /// Overrides the polling and retry interval.
    pub fn with_recheck_interval(mut self, interval: Duration) -> Self {
        self.recheck_interval = interval;
        self
    }

    /// The watched key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current phase of the watch loop.
    pub fn phase(&self) -> WatchPhase {
        *self.phase.borrow()
    }

    /// Waits until the loop reaches `phase`.
    pub async fn wait_for_phase(&self, phase: WatchPhase) {
        let mut phases = self.phase.subscribe();
        let _ = phases.wait_for(|current| *current == phase).await;
    }

    /// Spawns the watch loop. Calling it again is a no-op.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<F>(&mut self, handler: F)
    where
        F: FnMut(ItemEvent) + Send + 'static,
    {
        if self.started {
            return;
        }
        self.started = true;

        let watch_loop = WatchLoop {
            path: self.store.path_for(&self.key),
            key: self.key.clone(),
            store: self.store.clone(),
            fs_watch: self.fs_watch.clone(),
            recheck_interval: self.recheck_interval,
            cancel: self.cancel.clone(),
            phase: self.phase.clone(),
        };

        tokio::spawn(watch_loop.run(Box::new(handler)));
    }

    /// Asks the loop to exit.
    ///
    /// Returns immediately; the loop closes its subscription and reaches
    /// [`WatchPhase::Stopped`] shortly after.
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for LocalChangeWatcher {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct WatchLoop {
    key: String,
    path: PathBuf,
    store: LocalOverrideStore,
    fs_watch: Arc<dyn FsWatch>,
    recheck_interval: Duration,
    cancel: CancellationToken,
    phase: watch::Sender<WatchPhase>,
}

impl WatchLoop {
    async fn run(self, mut handler: Handler) {
        let mut subscription: Option<Box<dyn FsSubscription>> = None;

        loop {
            match subscription.as_mut() {
                None => {
                    if self.cancel.is_cancelled() {
                        break;
                    }

                    if !self.store.exists(&self.key).await {
                        if self.pause().await {
                            continue;
                        }
                        break;
                    }

                    if let Some(item) = self.read_valid().await {
                        handler(ItemEvent::Created(item));
                    }

                    match self.fs_watch.subscribe(&self.path) {
                        Ok(armed) => {
                            info!(key = %self.key, "Watching override file");
                            subscription = Some(armed);
                            self.phase.send_replace(WatchPhase::Armed);
                        }
                        Err(e) => {
                            error!(key = %self.key, error = %e, "Failed to watch override file");
                            if !self.pause().await {
                                break;
                            }
                        }
                    }
                }
                Some(armed) => {
                    let event = tokio::select! {
                        () = self.cancel.cancelled() => break,
                        event = armed.next_event() => event,
                    };

                    match event {
                        Some(FsEvent::Deleted) => {
                            warn!(key = %self.key, "Override file deleted");
                            Self::disarm(&mut subscription, &self.phase);
                            handler(ItemEvent::Deleted);
                        }
                        Some(FsEvent::AttribChanged) => {}
                        Some(FsEvent::Created | FsEvent::Modified) => {
                            debug!(key = %self.key, "Override file changed");
                            if let Some(item) = self.read_valid().await {
                                handler(ItemEvent::Updated(item));
                            }
                        }
                        None => {
                            warn!(key = %self.key, "File events stopped, re-arming");
                            Self::disarm(&mut subscription, &self.phase);
                        }
                    }
                }
            }
        }

        Self::disarm(&mut subscription, &self.phase);
        self.phase.send_replace(WatchPhase::Stopped);
        info!(key = %self.key, "Watch loop exited");
    }

    /// Sleeps one recheck interval. Returns `false` if stopped meanwhile.
    async fn pause(&self) -> bool {
        tokio::select! {
            () = self.cancel.cancelled() => false,
            () = tokio::time::sleep(self.recheck_interval) => true,
        }
    }

    async fn read_valid(&self) -> Option<Item> {
        self.store.read(&self.key).await.ok().flatten()
    }

    fn disarm(subscription: &mut Option<Box<dyn FsSubscription>>, phase: &watch::Sender<WatchPhase>) {
        if let Some(mut armed) = subscription.take() {
            armed.close();
            phase.send_replace(WatchPhase::Unarmed);
        }
    }
}
