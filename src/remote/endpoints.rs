use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};

use serde::Deserialize;
use tokio::{fs, sync::RwLock};
use tracing::{debug, error};

use super::EndpointError;

const DEFAULT_CONNECT_TIMEOUT_MS: i64 = 800;
const DEFAULT_OP_TIMEOUT_MS: i64 = 5000;

/// How long a loaded endpoint file is trusted before it is read again.
pub const ENDPOINT_RELOAD_INTERVAL: Duration = Duration::from_secs(30);

/// A single store node as listed in the endpoint file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EndpointNode {
    /// Node address
    #[serde(default)]
    pub ip: String,
    /// Node port
    #[serde(default)]
    pub port: u16,
}

/// Node list and timeouts for reaching the key-value store.
///
/// Loaded from a JSON file of the form
/// `{"node": [{"ip": "10.0.0.1", "port": 2379}], "connect_timeout_ms": 800, "op_timeout_ms": 5000}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointConfig {
    nodes: Vec<EndpointNode>,
    connect_timeout_ms: i64,
    op_timeout_ms: i64,
    endpoints: Vec<String>,
}

#[derive(Deserialize)]
struct RawEndpointConfig {
    #[serde(default)]
    node: Vec<EndpointNode>,
    #[serde(default)]
    connect_timeout_ms: i64,
    #[serde(default)]
    op_timeout_ms: i64,
}

impl EndpointConfig {
    /// Builds a config from a node list, applying default timeouts.
    ///
    /// # Errors
    /// Returns [`EndpointError::NoNodes`] for an empty list and
    /// [`EndpointError::InvalidNode`] for a node without address or port.
    pub fn from_nodes(nodes: Vec<EndpointNode>) -> Result<Self, EndpointError> {
        Self::build(nodes, 0, 0)
    }

    /// Parses the JSON endpoint file format.
    ///
    /// Non-positive timeouts fall back to 800 ms (connect) and 5000 ms (op).
    ///
    /// # Errors
    /// Returns [`EndpointError`] for malformed JSON, an empty node list or an
    /// incomplete node.
    pub fn parse(content: &str) -> Result<Self, EndpointError> {
        let raw: RawEndpointConfig =
            serde_json::from_str(content).map_err(|e| EndpointError::Parse {
                details: e.to_string(),
            })?;

        Self::build(raw.node, raw.connect_timeout_ms, raw.op_timeout_ms)
    }

    /// Reads and parses an endpoint file.
    ///
    /// # Errors
    /// Returns [`EndpointError::Read`] if the file cannot be read, otherwise
    /// the same errors as [`EndpointConfig::parse`].
    pub async fn load(path: &Path) -> Result<Self, EndpointError> {
        let content = fs::read_to_string(path).await.map_err(|e| EndpointError::Read {
            path: path.to_path_buf(),
            details: e.to_string(),
        })?;

        Self::parse(&content)
    }

    fn build(
        nodes: Vec<EndpointNode>,
        connect_timeout_ms: i64,
        op_timeout_ms: i64,
    ) -> Result<Self, EndpointError> {
        if nodes.is_empty() {
            return Err(EndpointError::NoNodes);
        }

        let endpoints = nodes
            .iter()
            .map(|node| {
                if node.ip.is_empty() || node.port == 0 {
                    return Err(EndpointError::InvalidNode {
                        ip: node.ip.clone(),
                        port: node.port,
                    });
                }
                Ok(format!("http://{}:{}", node.ip, node.port))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            nodes,
            connect_timeout_ms: positive_or(connect_timeout_ms, DEFAULT_CONNECT_TIMEOUT_MS),
            op_timeout_ms: positive_or(op_timeout_ms, DEFAULT_OP_TIMEOUT_MS),
            endpoints,
        })
    }

    /// Rendered endpoints, `http://ip:port` each. Empty if nothing usable was loaded.
    pub fn endpoint_list(&self) -> &[String] {
        &self.endpoints
    }

    /// Configured nodes.
    pub fn nodes(&self) -> &[EndpointNode] {
        &self.nodes
    }

    /// Timeout for establishing a session.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(positive_or(self.connect_timeout_ms, DEFAULT_CONNECT_TIMEOUT_MS) as u64)
    }

    /// Default per-operation timeout advertised by the endpoint file.
    pub fn op_timeout(&self) -> Duration {
        Duration::from_millis(positive_or(self.op_timeout_ms, DEFAULT_OP_TIMEOUT_MS) as u64)
    }
}

fn positive_or(value: i64, default: i64) -> i64 {
    if value > 0 { value } else { default }
}

/// Where endpoint configuration comes from.
pub enum EndpointSource {
    /// A fixed configuration, never reloaded.
    Static(Arc<EndpointConfig>),
    /// A file re-read at most every [`ENDPOINT_RELOAD_INTERVAL`].
    File(EndpointFile),
}

impl EndpointSource {
    /// A fixed endpoint configuration.
    pub fn fixed(config: EndpointConfig) -> Self {
        EndpointSource::Static(Arc::new(config))
    }

    /// An endpoint file with the default reload interval.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        EndpointSource::File(EndpointFile::new(path, ENDPOINT_RELOAD_INTERVAL))
    }

    /// No endpoints at all. Every connection attempt fails fast.
    pub fn none() -> Self {
        EndpointSource::Static(Arc::new(EndpointConfig::default()))
    }

    /// Returns the current endpoint configuration.
    ///
    /// Never fails: an unusable file yields the last good configuration, or
    /// an empty one if there never was one.
    pub async fn current(&self) -> Arc<EndpointConfig> {
        match self {
            EndpointSource::Static(config) => config.clone(),
            EndpointSource::File(file) => file.current().await,
        }
    }
}

/// Endpoint file with a bounded-staleness cache.
pub struct EndpointFile {
    path: PathBuf,
    reload_interval: Duration,
    cache: RwLock<EndpointCache>,
}

#[derive(Default)]
struct EndpointCache {
    last_good: Option<Arc<EndpointConfig>>,
    loaded_at: Option<Instant>,
}

impl EndpointCache {
    fn fresh(&self, now: Instant, interval: Duration) -> Option<Arc<EndpointConfig>> {
        let loaded_at = self.loaded_at?;
        let config = self.last_good.as_ref()?;

        (now.duration_since(loaded_at) <= interval).then(|| config.clone())
    }
}

impl EndpointFile {
    /// Creates a cache over `path` trusted for `reload_interval` after each load.
    pub fn new(path: impl Into<PathBuf>, reload_interval: Duration) -> Self {
        Self {
            path: path.into(),
            reload_interval,
            cache: RwLock::new(EndpointCache::default()),
        }
    }

    /// Path of the endpoint file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn current(&self) -> Arc<EndpointConfig> {
        let now = Instant::now();

        if let Some(config) = self.cache.read().await.fresh(now, self.reload_interval) {
            return config;
        }

        // Reloads are serialized; a caller that waited here reuses the result.
        let mut cache = self.cache.write().await;
        if let Some(config) = cache.fresh(now, self.reload_interval) {
            return config;
        }

        match EndpointConfig::load(&self.path).await {
            Ok(config) => {
                debug!(path = %self.path.display(), endpoints = ?config.endpoint_list(), "Loaded endpoint file");
                cache.last_good = Some(Arc::new(config));
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Failed to load endpoint file");
            }
        }
        cache.loaded_at = Some(now);

        cache
            .last_good
            .clone()
            .unwrap_or_else(|| Arc::new(EndpointConfig::default()))
    }
}
