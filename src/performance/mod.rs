//! Performance optimizations for large topologies
//!
//! Level-of-detail selection keeps the rendered set bounded and the spatial
//! structures keep each layout tick sub-quadratic.

pub mod level_of_detail;
pub mod spatial_acceleration;

pub use level_of_detail::{LodConfig, LodSelector, VisibleNode, VisibleSet};

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Read-only diagnostics for the host UI
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerformanceStats {
    /// Nodes in the current snapshot
    pub total_nodes: usize,
    /// Edges in the current snapshot
    pub total_edges: usize,
    /// Nodes currently visible (after LOD)
    pub visible_nodes: usize,
    /// Edges currently visible (after LOD)
    pub visible_edges: usize,
    /// Visible nodes per node type
    pub type_distribution: BTreeMap<String, usize>,
    /// Time spent in the last layout tick (ms)
    pub layout_time_ms: f64,
    /// Last frame render time reported by the host (ms)
    pub render_time_ms: f64,
    /// Current simulation energy
    pub alpha: f64,
    /// Ticks since the simulation was last started or reheated
    pub ticks_since_reheat: usize,
}

impl PerformanceStats {
    /// Refresh the visible-set counters
    pub fn record_visible(&mut self, visible: &VisibleSet) {
        self.visible_nodes = visible.len();
        self.visible_edges = visible.edge_count();
        self.type_distribution.clear();
        for node in &visible.nodes {
            *self
                .type_distribution
                .entry(node.node.node_type.as_str().to_string())
                .or_insert(0) += 1;
        }
    }

    pub fn record_layout(&mut self, elapsed: Duration, alpha: f64, ticks_since_reheat: usize) {
        self.layout_time_ms = elapsed.as_secs_f64() * 1000.0;
        self.alpha = alpha;
        self.ticks_since_reheat = ticks_since_reheat;
    }

    pub fn record_render(&mut self, elapsed: Duration) {
        self.render_time_ms = elapsed.as_secs_f64() * 1000.0;
    }
}
