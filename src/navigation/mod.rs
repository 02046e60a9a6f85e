//! Drill-down navigation through the containment hierarchy
//!
//! The [`DrillDownNavigator`] keeps a breadcrumb path of the nodes the user has
//! stepped through and loads details for the latest one from a
//! [`NodeDetailProvider`]. Every selection bumps a generation counter; a
//! response is applied only if its generation is still current, so a slow
//! answer for an earlier selection is dropped instead of flashing stale data.
//!
//! ```text
//! Empty --select--> Loading --ok--> Loaded
//!                      |  ^            |
//!                     err |select      |select / breadcrumb
//!                      v  |            v
//!                     Error --retry-> Loading
//! ```

use crate::error::{TopologyError, TopologyResult};
use crate::store::{GraphEdge, GraphNode};
use crate::value_objects::NodeType;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// Everything shown for the node at the end of the path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDetails {
    pub node: GraphNode,
    pub children: Vec<GraphNode>,
    pub dependencies: Vec<GraphEdge>,
    pub metrics: BTreeMap<String, f64>,
}

/// Source of per-node details
#[async_trait]
pub trait NodeDetailProvider: Send + Sync {
    /// Load details for one node
    async fn fetch_details(&self, node_id: &str) -> TopologyResult<NodeDetails>;
}

/// One step of the drill-down path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breadcrumb {
    /// Position in the path, starting at 0
    pub level: usize,
    pub node_id: String,
    pub node_name: String,
    pub node_type: NodeType,
}

/// Where the navigator is in its lifecycle
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationState {
    /// Nothing selected
    Empty,
    /// Details for `node_id` are in flight
    Loading { node_id: String },
    /// Details for the last breadcrumb are available
    Loaded,
    /// The last fetch failed; [`DrillDownNavigator::retry`] re-attempts it
    Error { node_id: String, error: TopologyError },
}

/// Result of a selection that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// The response was applied to the path and details
    Applied,
    /// A newer selection arrived first; the response was discarded
    Superseded,
}

/// Collapsible sections of the details panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DetailSection {
    Overview,
    Children,
    Dependencies,
    Metrics,
    Properties,
}

fn default_sections() -> BTreeSet<DetailSection> {
    BTreeSet::from([DetailSection::Overview])
}

struct NavigatorInner {
    path: Vec<Breadcrumb>,
    state: NavigationState,
    details: Option<Arc<NodeDetails>>,
    generation: u64,
    open_sections: BTreeSet<DetailSection>,
}

impl NavigatorInner {
    /// Enter `Loading` for `node_id` and return the generation of the request
    fn begin(&mut self, node_id: &str) -> u64 {
        self.generation += 1;
        self.state = NavigationState::Loading {
            node_id: node_id.to_string(),
        };
        self.details = None;
        self.generation
    }
}

/// Breadcrumb navigator with race-safe detail loading
pub struct DrillDownNavigator {
    provider: Arc<dyn NodeDetailProvider>,
    inner: Mutex<NavigatorInner>,
}

impl DrillDownNavigator {
    pub fn new(provider: Arc<dyn NodeDetailProvider>) -> Self {
        Self {
            provider,
            inner: Mutex::new(NavigatorInner {
                path: Vec::new(),
                state: NavigationState::Empty,
                details: None,
                generation: 0,
                open_sections: default_sections(),
            }),
        }
    }

    /// Select a node, appending it to the path once its details arrive.
    /// Resets the details panel sections when the response is applied.
    pub async fn select(&self, node_id: &str) -> TopologyResult<SelectOutcome> {
        self.load(node_id, true).await
    }

    /// Step into a child of the current node, keeping panel sections as they are
    pub async fn drill_into(&self, child: &GraphNode) -> TopologyResult<SelectOutcome> {
        self.load(&child.id, false).await
    }

    /// Cut the path back to `index` and reload that node's details
    pub async fn navigate_to_breadcrumb(&self, index: usize) -> TopologyResult<SelectOutcome> {
        let (generation, node_id) = {
            let mut inner = self.inner.lock();
            let len = inner.path.len();
            let node_id = match inner.path.get(index) {
                Some(crumb) => crumb.node_id.clone(),
                None => return Err(TopologyError::InvalidBreadcrumb { index, len }),
            };
            inner.path.truncate(index);
            (inner.begin(&node_id), node_id)
        };

        let result = self.provider.fetch_details(&node_id).await;
        self.finish(generation, &node_id, false, result)
    }

    /// Re-attempt the failed fetch; `None` when not in the error state
    pub async fn retry(&self) -> Option<TopologyResult<SelectOutcome>> {
        let node_id = match &self.inner.lock().state {
            NavigationState::Error { node_id, .. } => node_id.clone(),
            _ => return None,
        };
        Some(self.load(&node_id, false).await)
    }

    /// Follow the externally selected root. `None` clears the path; a different
    /// root starts a fresh path at it. Returns `None` when nothing was loaded.
    pub async fn sync_root(&self, root: Option<&GraphNode>) -> Option<TopologyResult<SelectOutcome>> {
        let Some(root) = root else {
            self.clear();
            return None;
        };

        {
            let inner = self.inner.lock();
            let same_root = inner.path.first().is_some_and(|crumb| crumb.node_id == root.id);
            if same_root {
                return None;
            }
        }

        self.clear();
        Some(self.select(&root.id).await)
    }

    /// Drop the path and details; in-flight responses are discarded
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        inner.path.clear();
        inner.state = NavigationState::Empty;
        inner.details = None;
    }

    pub fn path(&self) -> Vec<Breadcrumb> {
        self.inner.lock().path.clone()
    }

    pub fn state(&self) -> NavigationState {
        self.inner.lock().state.clone()
    }

    /// Details of the node at the end of the path, when loaded
    pub fn current_details(&self) -> Option<Arc<NodeDetails>> {
        self.inner.lock().details.clone()
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.inner.lock().state, NavigationState::Loading { .. })
    }

    /// Generation of the latest request
    pub fn generation(&self) -> u64 {
        self.inner.lock().generation
    }

    /// Open or close a details panel section, returning whether it is now open
    pub fn toggle_section(&self, section: DetailSection) -> bool {
        let mut inner = self.inner.lock();
        if inner.open_sections.remove(&section) {
            false
        } else {
            inner.open_sections.insert(section);
            true
        }
    }

    pub fn is_section_open(&self, section: DetailSection) -> bool {
        self.inner.lock().open_sections.contains(&section)
    }

    async fn load(&self, node_id: &str, reset_sections: bool) -> TopologyResult<SelectOutcome> {
        let generation = self.inner.lock().begin(node_id);
        let result = self.provider.fetch_details(node_id).await;
        self.finish(generation, node_id, reset_sections, result)
    }

    fn finish(
        &self,
        generation: u64,
        node_id: &str,
        reset_sections: bool,
        result: TopologyResult<NodeDetails>,
    ) -> TopologyResult<SelectOutcome> {
        let mut inner = self.inner.lock();
        if generation != inner.generation {
            debug!(node_id, generation, current = inner.generation, "Discarding stale detail response");
            return Ok(SelectOutcome::Superseded);
        }
        if reset_sections {
            inner.open_sections = default_sections();
        }

        match result {
            Ok(details) => {
                let repeat = inner.path.last().is_some_and(|crumb| crumb.node_id == node_id);
                if !repeat {
                    let level = inner.path.len();
                    inner.path.push(Breadcrumb {
                        level,
                        node_id: node_id.to_string(),
                        node_name: details.node.label.clone(),
                        node_type: details.node.node_type.clone(),
                    });
                }
                inner.state = NavigationState::Loaded;
                inner.details = Some(Arc::new(details));
                Ok(SelectOutcome::Applied)
            }
            Err(err) => {
                let error = match err {
                    TopologyError::DetailFetchFailed { .. } => err,
                    other => TopologyError::DetailFetchFailed {
                        node_id: node_id.to_string(),
                        reason: other.to_string(),
                    },
                };
                warn!(node_id, error = %error, "Node detail fetch failed");
                inner.state = NavigationState::Error {
                    node_id: node_id.to_string(),
                    error: error.clone(),
                };
                inner.details = None;
                Err(error)
            }
        }
    }
}
