//! Topology providers
//!
//! Sources of whole-topology snapshots. The explorer polls one of these and
//! replaces its store with whatever comes back.

use crate::error::{TopologyError, TopologyResult};
use crate::store::GraphData;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::RwLock;

/// Supplier of full topology snapshots
#[async_trait]
pub trait TopologyProvider: Send + Sync {
    /// Fetch the latest snapshot
    async fn fetch_topology(&self) -> TopologyResult<GraphData>;
}

/// In-memory provider; push updates with [`StaticTopologyProvider::publish`]
#[derive(Debug, Default)]
pub struct StaticTopologyProvider {
    snapshot: RwLock<Option<GraphData>>,
}

impl StaticTopologyProvider {
    pub fn new(data: GraphData) -> Self {
        Self {
            snapshot: RwLock::new(Some(data)),
        }
    }

    /// A provider with nothing published yet; fetching fails until [`Self::publish`]
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Replace the snapshot handed out by subsequent fetches
    pub async fn publish(&self, data: GraphData) {
        *self.snapshot.write().await = Some(data);
    }

    /// Make subsequent fetches fail
    pub async fn withdraw(&self) {
        *self.snapshot.write().await = None;
    }
}

#[async_trait]
impl TopologyProvider for StaticTopologyProvider {
    async fn fetch_topology(&self) -> TopologyResult<GraphData> {
        self.snapshot
            .read()
            .await
            .clone()
            .ok_or_else(|| TopologyError::DataUnavailable {
                reason: "no snapshot published".to_string(),
            })
    }
}

/// Reads a JSON snapshot (`{"nodes": [...], "edges": [...]}`) from disk on every fetch
#[derive(Debug, Clone)]
pub struct JsonFileTopologyProvider {
    path: PathBuf,
}

impl JsonFileTopologyProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl TopologyProvider for JsonFileTopologyProvider {
    async fn fetch_topology(&self) -> TopologyResult<GraphData> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| TopologyError::DataUnavailable {
                reason: format!("{}: {e}", self.path.display()),
            })?;

        serde_json::from_str(&contents).map_err(|e| TopologyError::DataUnavailable {
            reason: format!("{}: {e}", self.path.display()),
        })
    }
}
