//! Shared, explicitly passed state for stores and live configs.

use std::{fmt, path::PathBuf, sync::Arc, time::Duration};

use tracing::error;

use crate::{
    config::{DEFAULT_NAMESPACE, DeploymentMode, Settings},
    config_store::ConfigError,
    core::Result,
    local::{DEFAULT_RECHECK_INTERVAL, FsWatch, LocalOverrideStore, NotifyFsWatch},
    remote::{EndpointSource, KvConnector},
};

/// Callback invoked for every error reported by a store or a background task.
pub type ErrorHook = Arc<dyn Fn(&ConfigError) + Send + Sync>;

/// Deadlines for remote operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Point reads, writes and deletes.
    pub point: Duration,
    /// Prefix scans.
    pub scan: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            point: Duration::from_secs(3),
            scan: Duration::from_secs(10),
        }
    }
}

/// Background watch behaviour for live configs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    /// Override file recheck interval while it is missing.
    pub recheck_interval: Duration,
    /// Follow remote changes.
    pub remote: bool,
    /// Delay before re-opening a failed remote watch.
    pub remote_backoff: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            recheck_interval: DEFAULT_RECHECK_INTERVAL,
            remote: false,
            remote_backoff: Duration::from_secs(5),
        }
    }
}

/// Everything a [`ConfigStore`](crate::config_store::ConfigStore) or a
/// [`LiveConfig`](crate::live::LiveConfig) needs: namespace, override
/// directory, endpoints, transport, deployment mode and error reporting.
///
/// Built once per process (or per test) and shared behind an [`Arc`].
pub struct StoreContext {
    namespace: String,
    overrides: LocalOverrideStore,
    endpoints: EndpointSource,
    connector: Arc<dyn KvConnector>,
    fs_watch: Arc<dyn FsWatch>,
    mode: DeploymentMode,
    use_remote_in_dev: bool,
    timeouts: Timeouts,
    watch: WatchOptions,
    error_hook: Option<ErrorHook>,
}

impl StoreContext {
    /// Starts a builder with the required transport and override directory.
    pub fn builder(
        connector: Arc<dyn KvConnector>,
        override_dir: impl Into<PathBuf>,
    ) -> StoreContextBuilder {
        StoreContextBuilder {
            context: StoreContext {
                namespace: DEFAULT_NAMESPACE.to_string(),
                overrides: LocalOverrideStore::new(override_dir),
                endpoints: EndpointSource::none(),
                connector,
                fs_watch: Arc::new(NotifyFsWatch),
                mode: DeploymentMode::default(),
                use_remote_in_dev: false,
                timeouts: Timeouts::default(),
                watch: WatchOptions::default(),
                error_hook: None,
            },
        }
    }

    /// Builds a context from loaded settings.
    ///
    /// # Errors
    /// Returns an error if the override directory or endpoint file path
    /// cannot be resolved.
    pub fn from_settings(settings: &Settings, connector: Arc<dyn KvConnector>) -> Result<Self> {
        let context = Self::builder(connector, settings.override_dir()?)
            .namespace(settings.namespace.clone())
            .endpoints(EndpointSource::file(settings.endpoints_file()?))
            .mode(settings.mode)
            .use_remote_in_dev(settings.use_remote_in_dev)
            .timeouts(Timeouts {
                point: settings.timeouts.point(),
                scan: settings.timeouts.scan(),
            })
            .watch(WatchOptions {
                recheck_interval: settings.watch.recheck_interval(),
                remote: settings.watch.remote,
                remote_backoff: settings.watch.remote_backoff(),
            })
            .build();

        Ok(context)
    }

    /// Namespace prepended to remote keys.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Remote key for a logical key.
    pub fn namespaced(&self, key: &str) -> String {
        format!("{}{key}", self.namespace)
    }

    /// Override file store.
    pub fn overrides(&self) -> &LocalOverrideStore {
        &self.overrides
    }

    /// Endpoint source.
    pub fn endpoints(&self) -> &EndpointSource {
        &self.endpoints
    }

    /// Transport used to open sessions.
    pub fn connector(&self) -> &dyn KvConnector {
        self.connector.as_ref()
    }

    /// Filesystem watch backend.
    pub fn fs_watch(&self) -> Arc<dyn FsWatch> {
        self.fs_watch.clone()
    }

    /// Deployment mode.
    pub fn mode(&self) -> DeploymentMode {
        self.mode
    }

    /// Operation deadlines.
    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    /// Background watch behaviour.
    pub fn watch_options(&self) -> WatchOptions {
        self.watch
    }

    /// Whether live configs may read the remote store at all.
    ///
    /// Always true in production; in development only with
    /// `use_remote_in_dev`.
    pub fn remote_access_enabled(&self) -> bool {
        self.mode == DeploymentMode::Production || self.use_remote_in_dev
    }

    /// Whether live configs should follow the remote store.
    pub fn remote_sync_enabled(&self) -> bool {
        self.watch.remote && self.remote_access_enabled()
    }

    /// Logs an error and forwards it to the installed hook, if any.
    pub fn report(&self, err: &ConfigError) {
        error!(error = %err, "Configuration error");
        if let Some(hook) = &self.error_hook {
            hook(err);
        }
    }
}

impl fmt::Debug for StoreContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreContext")
            .field("namespace", &self.namespace)
            .field("override_dir", &self.overrides.dir())
            .field("mode", &self.mode)
            .field("use_remote_in_dev", &self.use_remote_in_dev)
            .field("timeouts", &self.timeouts)
            .field("watch", &self.watch)
            .field("error_hook", &self.error_hook.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`StoreContext`].
pub struct StoreContextBuilder {
    context: StoreContext,
}

impl StoreContextBuilder {
    /// Sets the remote key namespace.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.context.namespace = namespace.into();
        self
    }

    /// Sets the endpoint source.
    pub fn endpoints(mut self, endpoints: EndpointSource) -> Self {
        self.context.endpoints = endpoints;
        self
    }

    /// Replaces the filesystem watch backend.
    pub fn fs_watch(mut self, fs_watch: Arc<dyn FsWatch>) -> Self {
        self.context.fs_watch = fs_watch;
        self
    }

    /// Sets the deployment mode.
    pub fn mode(mut self, mode: DeploymentMode) -> Self {
        self.context.mode = mode;
        self
    }

    /// Follow the remote store in development mode too.
    pub fn use_remote_in_dev(mut self, enabled: bool) -> Self {
        self.context.use_remote_in_dev = enabled;
        self
    }

    /// Sets operation deadlines.
    pub fn timeouts(mut self, timeouts: Timeouts) -> Self {
        self.context.timeouts = timeouts;
        self
    }

    /// Sets background watch behaviour.
    pub fn watch(mut self, watch: WatchOptions) -> Self {
        self.context.watch = watch;
        self
    }

    /// Installs an error hook.
    pub fn error_hook(mut self, hook: ErrorHook) -> Self {
        self.context.error_hook = Some(hook);
        self
    }

    /// Finishes the context.
    pub fn build(self) -> StoreContext {
        self.context
    }
}
