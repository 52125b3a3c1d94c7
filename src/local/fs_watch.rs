use std::path::{Path, PathBuf};

use async_trait::async_trait;
use notify::{
    Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher, event::ModifyKind,
    recommended_watcher,
};
use tokio::sync::mpsc;
use tracing::debug;

use super::LocalError;

/// A change to a watched file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsEvent {
    /// The file was created
    Created,
    /// The file contents changed
    Modified,
    /// The file was removed or renamed away
    Deleted,
    /// Only metadata (permissions, timestamps) changed
    AttribChanged,
}

/// Capability to subscribe to changes of a single file.
pub trait FsWatch: Send + Sync {
    /// Starts watching `path`.
    ///
    /// # Errors
    /// Returns [`LocalError::Subscribe`] if the path cannot be watched, for
    /// example because it does not exist.
    fn subscribe(&self, path: &Path) -> Result<Box<dyn FsSubscription>, LocalError>;
}

/// An open subscription to one file.
#[async_trait]
pub trait FsSubscription: Send {
    /// Waits for the next event. `None` once the subscription is closed or
    /// the backend stopped delivering events.
    async fn next_event(&mut self) -> Option<FsEvent>;

    /// Releases the underlying watch. Idempotent.
    fn close(&mut self);
}

/// [`FsWatch`] backed by the platform's native notification API.
///
/// Every subscription owns its own `notify` watcher, so closing one never
/// affects another.
#[derive(Debug, Default, Clone, Copy)]
pub struct NotifyFsWatch;

impl FsWatch for NotifyFsWatch {
    fn subscribe(&self, path: &Path) -> Result<Box<dyn FsSubscription>, LocalError> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let subscribe_error = |e: notify::Error| LocalError::Subscribe {
            path: path.to_path_buf(),
            details: e.to_string(),
        };

        let mut watcher = recommended_watcher(move |res: notify::Result<Event>| {
            let Ok(event) = res else {
                return;
            };

            if let Some(kind) = classify(&event.kind) {
                let _ = event_tx.send(kind);
            }
        })
        .map_err(subscribe_error)?;

        watcher
            .watch(path, RecursiveMode::NonRecursive)
            .map_err(subscribe_error)?;

        Ok(Box::new(NotifySubscription {
            path: path.to_path_buf(),
            watcher: Some(watcher),
            events: event_rx,
        }))
    }
}

struct NotifySubscription {
    path: PathBuf,
    watcher: Option<RecommendedWatcher>,
    events: mpsc::UnboundedReceiver<FsEvent>,
}

#[async_trait]
impl FsSubscription for NotifySubscription {
    async fn next_event(&mut self) -> Option<FsEvent> {
        self.watcher.as_ref()?;
        self.events.recv().await
    }

    fn close(&mut self) {
        if self.watcher.take().is_some() {
            debug!(path = %self.path.display(), "Closed file subscription");
        }
    }
}

/// Maps a raw notify event to the events the watcher cares about.
///
/// Renames count as deletion: editors that save by renaming a temp file over
/// the existing file leave the old inode (and its watch) behind.
pub(super) fn classify(kind: &EventKind) -> Option<FsEvent> {
    match kind {
        EventKind::Create(_) => Some(FsEvent::Created),
        EventKind::Modify(ModifyKind::Metadata(_)) => Some(FsEvent::AttribChanged),
        EventKind::Modify(ModifyKind::Name(_)) => Some(FsEvent::Deleted),
        EventKind::Modify(_) => Some(FsEvent::Modified),
        EventKind::Remove(_) => Some(FsEvent::Deleted),
        _ => None,
    }
}
