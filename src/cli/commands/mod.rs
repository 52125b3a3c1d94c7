//! Built-in commands, one module per category.

pub mod local;

use std::{sync::Arc, time::Duration};

use crate::local::{FsWatch, LocalOverrideStore};

/// Dependencies shared by the `local` commands.
#[derive(Clone)]
pub struct LocalDeps {
    /// Override files to inspect.
    pub overrides: LocalOverrideStore,
    /// Filesystem watch backend for `watch`.
    pub fs_watch: Arc<dyn FsWatch>,
    /// Default recheck interval for `watch`.
    pub recheck_interval: Duration,
}
