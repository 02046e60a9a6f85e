//! Level of Detail (LOD) selection for large topologies
//!
//! Chooses the bounded subset of a snapshot that is handed to the layout and the
//! renderer. Selection is a pure function of the store, the view state and the
//! budget: nodes are ranked by the static priority of their type, ties keep
//! delivery order, and only edges whose endpoints both survive are emitted.

use crate::selection::ViewState;
use crate::store::{GraphEdge, GraphNode, GraphStore};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Configuration for LOD selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LodConfig {
    /// Snapshots smaller than this are always rendered in full
    pub small_graph_threshold: usize,
    /// Floor of the zoom-scaled budget
    pub min_visible_nodes: usize,
    /// Budget at zoom 1.0 and above
    pub max_visible_nodes: usize,
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            small_graph_threshold: 1000,
            min_visible_nodes: 100,
            max_visible_nodes: 2000,
        }
    }
}

/// A node that made it into the visible set
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleNode {
    pub node: Arc<GraphNode>,
    /// False when a category filter is active and the node is outside it.
    /// Such nodes stay in the set (dimmed) so their edges stay intact.
    pub interactive: bool,
}

impl VisibleNode {
    pub fn id(&self) -> &str {
        &self.node.id
    }
}

/// The rendered subset of a snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisibleSet {
    pub nodes: Vec<VisibleNode>,
    pub edges: Vec<Arc<GraphEdge>>,
}

impl VisibleSet {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Node ids in render order
    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(VisibleNode::id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id() == id)
    }

    /// Whether both sets hold the same nodes and edges in the same order,
    /// ignoring the interactive overlay
    pub fn same_membership(&self, other: &VisibleSet) -> bool {
        self.nodes.len() == other.nodes.len()
            && self.edges.len() == other.edges.len()
            && self.node_ids().eq(other.node_ids())
            && self.edges.iter().map(|e| &e.id).eq(other.edges.iter().map(|e| &e.id))
    }
}

/// Budget-driven node selector
#[derive(Debug, Clone, Default)]
pub struct LodSelector {
    config: LodConfig,
}

impl LodSelector {
    pub fn new(config: LodConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LodConfig {
        &self.config
    }

    /// Number of nodes kept at a zoom level: `clamp(floor(zoom * max), floor, max)`.
    ///
    /// When `max_visible_nodes` is below the floor the floor wins.
    pub fn effective_budget(&self, zoom: f64, max_visible_nodes: usize) -> usize {
        let floor = self.config.min_visible_nodes;
        let ceiling = max_visible_nodes.max(floor);
        // Float casts saturate: NaN and negative zoom land on the floor
        let scaled = (zoom * max_visible_nodes as f64).floor() as usize;
        scaled.clamp(floor, ceiling)
    }

    /// Select the visible subset of `store` for `view` under `max_visible_nodes`
    pub fn select(&self, store: &GraphStore, view: &ViewState, max_visible_nodes: usize) -> VisibleSet {
        let interactive = |node: &GraphNode| match &view.filter_category {
            Some(category) => node.category == *category,
            None => true,
        };

        if store.len() < self.config.small_graph_threshold {
            return VisibleSet {
                nodes: store
                    .nodes()
                    .map(|node| VisibleNode {
                        interactive: interactive(node.as_ref()),
                        node: Arc::clone(node),
                    })
                    .collect(),
                edges: store.edges().to_vec(),
            };
        }

        let budget = self.effective_budget(view.zoom, max_visible_nodes);

        // Stable sort keeps delivery order between equal priorities
        let mut ranked: Vec<&Arc<GraphNode>> = store.nodes().collect();
        ranked.sort_by_key(|node| Reverse(node.node_type.priority()));
        ranked.truncate(budget);

        let visible_ids: HashSet<&str> = ranked.iter().map(|n| n.id.as_str()).collect();
        let edges: Vec<Arc<GraphEdge>> = store
            .edges()
            .iter()
            .filter(|e| visible_ids.contains(e.source.as_str()) && visible_ids.contains(e.target.as_str()))
            .cloned()
            .collect();

        debug!(
            total = store.len(),
            budget,
            zoom = view.zoom,
            visible_edges = edges.len(),
            "LOD selection"
        );

        VisibleSet {
            nodes: ranked
                .into_iter()
                .map(|node| VisibleNode {
                    interactive: interactive(node.as_ref()),
                    node: Arc::clone(node),
                })
                .collect(),
            edges,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::GraphData;
    use crate::value_objects::{EdgeType, NodeType};

    /// 1 region, 5 networks, 40 clusters, 1154 services with containment edges
    fn tiered_store() -> GraphStore {
        let mut nodes = Vec::new();
        let mut edges = Vec::new();

        nodes.push(GraphNode::new("region-0", "region", NodeType::Region, "aws"));
        for n in 0..5 {
            nodes.push(GraphNode::new(format!("net-{n}"), "net", NodeType::Network, "aws"));
            edges.push(GraphEdge::new(format!("e-r-{n}"), "region-0", format!("net-{n}"), EdgeType::Containment));
        }
        for c in 0..40 {
            nodes.push(GraphNode::new(format!("cluster-{c}"), "cluster", NodeType::Cluster, "k8s"));
            edges.push(GraphEdge::new(
                format!("e-n-{c}"),
                format!("net-{}", c % 5),
                format!("cluster-{c}"),
                EdgeType::Containment,
            ));
        }
        for s in 0..1154 {
            nodes.push(GraphNode::new(format!("svc-{s}"), "svc", NodeType::Service, "apps"));
            edges.push(GraphEdge::new(
                format!("e-c-{s}"),
                format!("cluster-{}", s % 40),
                format!("svc-{s}"),
                EdgeType::Containment,
            ));
        }

        GraphStore::from_data(GraphData {
            nodes,
            edges,
            metadata: None,
        })
    }

    fn view(zoom: f64) -> ViewState {
        ViewState {
            zoom,
            ..ViewState::default()
        }
    }

    #[test]
    fn test_effective_budget() {
        let selector = LodSelector::default();
        assert_eq!(selector.effective_budget(0.5, 200), 100);
        assert_eq!(selector.effective_budget(1.0, 200), 200);
        assert_eq!(selector.effective_budget(3.0, 200), 200);
        assert_eq!(selector.effective_budget(0.75, 1000), 750);
        assert_eq!(selector.effective_budget(1.0, 40), 100);
        assert_eq!(selector.effective_budget(f64::NAN, 500), 100);
    }

    #[test]
    fn test_tiered_example() {
        let store = tiered_store();
        let visible = LodSelector::default().select(&store, &view(0.5), 200);

        assert_eq!(visible.len(), 100);
        let count = |t: NodeType| visible.nodes.iter().filter(|n| n.node.node_type == t).count();
        assert_eq!(count(NodeType::Region), 1);
        assert_eq!(count(NodeType::Network), 5);
        assert_eq!(count(NodeType::Cluster), 40);
        assert_eq!(count(NodeType::Service), 54);

        // Services are the first 54 in delivery order
        assert!(visible.contains("svc-0"));
        assert!(visible.contains("svc-53"));
        assert!(!visible.contains("svc-54"));

        // 5 + 40 structural edges plus one edge per kept service
        assert_eq!(visible.edge_count(), 5 + 40 + 54);
        for edge in &visible.edges {
            assert!(visible.contains(&edge.source) && visible.contains(&edge.target));
        }
    }

    #[test]
    fn test_small_graph_passthrough() {
        let nodes = (0..500)
            .map(|i| GraphNode::new(format!("svc-{i}"), "svc", NodeType::Service, "apps"))
            .collect();
        let store = GraphStore::from_data(GraphData {
            nodes,
            edges: Vec::new(),
            metadata: None,
        });

        for zoom in [0.1, 0.5, 1.0, 4.0] {
            assert_eq!(LodSelector::default().select(&store, &view(zoom), 200).len(), 500);
        }
    }

    #[test]
    fn test_deterministic() {
        let store = tiered_store();
        let selector = LodSelector::default();
        let first = selector.select(&store, &view(0.8), 300);
        let second = selector.select(&store, &view(0.8), 300);
        assert_eq!(first, second);
        assert!(first.same_membership(&second));
    }

    #[test]
    fn test_category_filter_dims_without_removing() {
        let store = tiered_store();
        let mut filtered = view(0.5);
        filtered.filter_category = Some("k8s".to_string());

        let selector = LodSelector::default();
        let plain = selector.select(&store, &view(0.5), 200);
        let dimmed = selector.select(&store, &filtered, 200);

        assert!(plain.same_membership(&dimmed));
        for node in &dimmed.nodes {
            assert_eq!(node.interactive, node.node.category == "k8s");
        }
    }
}
