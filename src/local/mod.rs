//! Local override files and the per-key change watcher.
//!
//! An override file at `<override_dir>/<key>.json` supersedes the remote
//! value for that key while it exists and holds a valid item.

mod error;
mod fs_watch;
mod override_store;
mod watcher;

#[cfg(test)]
mod tests;

pub use error::LocalError;
pub use fs_watch::{FsEvent, FsSubscription, FsWatch, NotifyFsWatch};
pub use override_store::LocalOverrideStore;
pub use watcher::{
    ChangeKind, DEFAULT_RECHECK_INTERVAL, ItemEvent, LocalChangeWatcher, WatchPhase,
};
