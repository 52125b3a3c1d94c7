use std::{
    fmt,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
};

use arc_swap::ArcSwap;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::{
    config_store::{ConfigError, ConfigStore, ConfigValue},
    context::StoreContext,
    item::decode_value,
    local::{ChangeKind, ItemEvent, LocalChangeWatcher},
    remote::WatchEvent,
};

/// Callback invoked after every background change with `(kind, old, new)`.
///
/// On [`ChangeKind::Deleted`] the value is retained, so `old` and `new` are
/// the same instance.
pub type ChangeCallback<T> = Arc<dyn Fn(ChangeKind, Arc<T>, Arc<T>) + Send + Sync>;

/// A typed configuration value bound to one key and kept up to date.
///
/// [`init`](Self::init) loads the current value and starts following the
/// override file (and, when enabled, the remote store). Readers call
/// [`get`](Self::get) and always see a complete value: updates replace the
/// whole instance atomically.
///
/// When the key is deleted, [`existed`](Self::existed) turns `false` but
/// [`get`](Self::get) keeps returning the last value.
pub struct LiveConfig<T: ConfigValue> {
    state: Arc<LiveState<T>>,
    initialized: AtomicBool,
    init_lock: tokio::sync::Mutex<()>,
    background: Mutex<Option<Background>>,
}

struct LiveState<T> {
    key: String,
    context: Arc<StoreContext>,
    value: ArcSwap<T>,
    existed: AtomicBool,
}

/// A change waiting to be applied. Local and remote changes of one key share
/// one queue and are applied in arrival order by a single task.
enum Change {
    Local(ItemEvent),
    Remote(WatchEvent),
}

struct Background {
    watcher: LocalChangeWatcher,
    cancel: CancellationToken,
}

impl Drop for Background {
    fn drop(&mut self) {
        self.watcher.stop();
        self.cancel.cancel();
    }
}

impl<T: ConfigValue> LiveConfig<T> {
    /// Creates an uninitialized config holding `T::default()`.
    pub fn new(key: impl Into<String>, context: Arc<StoreContext>) -> Self {
        Self {
            state: Arc::new(LiveState {
                key: key.into(),
                context,
                value: ArcSwap::from_pointee(T::default()),
                existed: AtomicBool::new(false),
            }),
            initialized: AtomicBool::new(false),
            init_lock: tokio::sync::Mutex::new(()),
            background: Mutex::new(None),
        }
    }

    /// The bound key.
    pub fn key(&self) -> &str {
        &self.state.key
    }

    /// Loads the value and starts background updates without a callback.
    ///
    /// # Errors
    /// See [`init_with`](Self::init_with).
    pub async fn init(&self) -> Result<(), ConfigError> {
        self.init_inner(None).await
    }

    /// Loads the value and starts background updates, invoking `callback`
    /// after each change.
    ///
    /// Calling it again after a successful init does nothing. A failed init
    /// leaves the config uninitialized and may be retried.
    ///
    /// In development mode without remote access the value stays at its
    /// default and nothing is watched.
    ///
    /// # Errors
    /// Returns the error of the initial read; a malformed stored value is a
    /// [`ConfigError::Format`].
    pub async fn init_with<F>(&self, callback: F) -> Result<(), ConfigError>
    where
        F: Fn(ChangeKind, Arc<T>, Arc<T>) + Send + Sync + 'static,
    {
        self.init_inner(Some(Arc::new(callback))).await
    }

    #[instrument(skip_all, fields(key = %self.state.key))]
    async fn init_inner(&self, callback: Option<ChangeCallback<T>>) -> Result<(), ConfigError> {
        let _guard = self.init_lock.lock().await;
        if self.initialized.load(Ordering::Acquire) {
            return Ok(());
        }

        let context = &self.state.context;
        if !context.remote_access_enabled() {
            debug!("Development mode, keeping default value");
            self.initialized.store(true, Ordering::Release);
            return Ok(());
        }

        let mut store = ConfigStore::new(context.clone());
        let loaded = store.get_json::<T>(&self.state.key).await;
        store.close_ignore_error().await;

        match loaded? {
            Some(value) => {
                self.state.value.store(Arc::new(value));
                self.state.existed.store(true, Ordering::Release);
            }
            None => self.state.existed.store(false, Ordering::Release),
        }

        let mut watcher = LocalChangeWatcher::new(
            self.state.key.clone(),
            context.overrides().clone(),
            context.fs_watch(),
        )
        .with_recheck_interval(context.watch_options().recheck_interval);

        let cancel = CancellationToken::new();
        let (changes_tx, changes_rx) = mpsc::unbounded_channel();
        tokio::spawn(apply_changes(
            self.state.clone(),
            callback,
            changes_rx,
            cancel.clone(),
        ));

        if context.remote_sync_enabled() {
            tokio::spawn(follow_remote(
                self.state.clone(),
                changes_tx.clone(),
                cancel.clone(),
            ));
        }

        watcher.start(move |event| {
            let _ = changes_tx.send(Change::Local(event));
        });

        *self.lock_background() = Some(Background { watcher, cancel });
        self.initialized.store(true, Ordering::Release);
        info!(existed = self.existed(), "Live config initialized");

        Ok(())
    }

    /// Current value.
    pub fn get(&self) -> Arc<T> {
        self.state.value.load_full()
    }

    /// Whether the key currently holds a value.
    pub fn existed(&self) -> bool {
        self.state.existed.load(Ordering::Acquire)
    }

    /// Whether [`init`](Self::init) has completed successfully.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Writes `value` to the remote store and, on success, makes it current.
    ///
    /// The callback is not invoked and [`existed`](Self::existed) is left
    /// unchanged.
    ///
    /// # Errors
    /// Returns the write error; the in-memory value is untouched on failure.
    #[instrument(skip_all, fields(key = %self.state.key))]
    pub async fn set(&self, value: T) -> Result<(), ConfigError> {
        let mut store = ConfigStore::new(self.state.context.clone());
        let written = store.set_json(&self.state.key, &value).await;
        store.close_ignore_error().await;

        written?;
        self.state.value.store(Arc::new(value));
        Ok(())
    }

    /// Stops background updates. The last value stays readable.
    pub fn stop(&self) {
        if self.lock_background().take().is_some() {
            debug!(key = %self.state.key, "Live config stopped");
        }
    }

    fn lock_background(&self) -> std::sync::MutexGuard<'_, Option<Background>> {
        self.background.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: ConfigValue + fmt::Debug> fmt::Debug for LiveConfig<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveConfig")
            .field("key", &self.state.key)
            .field("value", &self.get())
            .field("existed", &self.existed())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

impl<T: ConfigValue> LiveState<T> {
    fn apply_local(&self, event: ItemEvent, callback: Option<&ChangeCallback<T>>) {
        match event {
            ItemEvent::Created(item) => self.replace(ChangeKind::Created, &item.value, callback),
            ItemEvent::Updated(item) => self.replace(ChangeKind::Updated, &item.value, callback),
            ItemEvent::Deleted => self.mark_deleted(callback),
        }
    }

    /// Applies a remote change unless a valid override file shadows the key.
    ///
    /// An empty value reads as an absent key, so it is applied as a delete.
    async fn apply_remote(&self, event: WatchEvent, callback: Option<&ChangeCallback<T>>) {
        if let Ok(Some(_)) = self.context.overrides().read(&self.key).await {
            debug!(key = %self.key, "Remote change shadowed by local override");
            return;
        }

        match event {
            WatchEvent::Put(raw) if raw.is_empty() => self.mark_deleted(callback),
            WatchEvent::Put(raw) => {
                let kind = if self.existed.load(Ordering::Acquire) {
                    ChangeKind::Updated
                } else {
                    ChangeKind::Created
                };
                self.replace(kind, &raw, callback);
            }
            WatchEvent::Delete => self.mark_deleted(callback),
        }
    }

    fn replace(&self, kind: ChangeKind, raw: &str, callback: Option<&ChangeCallback<T>>) {
        let value = match decode_value::<T>(raw) {
            Ok(value) => Arc::new(value),
            Err(e) => {
                self.context.report(&ConfigError::format(&self.key, e));
                return;
            }
        };

        self.existed.store(true, Ordering::Release);
        let old = self.value.swap(value.clone());
        debug!(key = %self.key, ?kind, "Live config replaced");

        if let Some(callback) = callback {
            callback(kind, old, value);
        }
    }

    fn mark_deleted(&self, callback: Option<&ChangeCallback<T>>) {
        self.existed.store(false, Ordering::Release);
        warn!(key = %self.key, "Live config deleted, keeping last value");

        if let Some(callback) = callback {
            let current = self.value.load_full();
            callback(ChangeKind::Deleted, current.clone(), current);
        }
    }
}

/// Applies queued changes one at a time until cancelled or every producer
/// has gone away.
async fn apply_changes<T: ConfigValue>(
    state: Arc<LiveState<T>>,
    callback: Option<ChangeCallback<T>>,
    mut changes: mpsc::UnboundedReceiver<Change>,
    cancel: CancellationToken,
) {
    loop {
        let change = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            change = changes.recv() => change,
        };

        match change {
            Some(Change::Local(event)) => state.apply_local(event, callback.as_ref()),
            Some(Change::Remote(event)) => state.apply_remote(event, callback.as_ref()).await,
            None => break,
        }
    }

    debug!(key = %state.key, "Change applier exited");
}

/// Follows remote changes of one key until cancelled, reopening the watch
/// after a fixed backoff whenever it fails or ends.
async fn follow_remote<T: ConfigValue>(
    state: Arc<LiveState<T>>,
    changes: mpsc::UnboundedSender<Change>,
    cancel: CancellationToken,
) {
    let backoff = state.context.watch_options().remote_backoff;

    loop {
        let mut store = ConfigStore::new(state.context.clone());
        let opened = tokio::select! {
            () = cancel.cancelled() => break,
            opened = store.watch_stream(&state.key) => opened,
        };

        match opened {
            Ok(mut stream) => {
                debug!(key = %state.key, "Following remote changes");
                loop {
                    let next = tokio::select! {
                        () = cancel.cancelled() => None,
                        next = stream.next() => next,
                    };

                    match next {
                        Some(Ok(event)) => {
                            if changes.send(Change::Remote(event)).is_err() {
                                break;
                            }
                        }
                        Some(Err(e)) => {
                            state.context.report(&e.into());
                            break;
                        }
                        None => break,
                    }
                }
            }
            Err(e) => state.context.report(&e),
        }

        store.close_ignore_error().await;

        tokio::select! {
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(backoff) => {}
        }
        debug!(key = %state.key, "Reopening remote watch");
    }

    debug!(key = %state.key, "Remote follower exited");
}
