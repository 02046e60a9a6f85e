//! Topology snapshots
//!
//! A [`GraphStore`] is an immutable, validated snapshot of the whole topology.
//! Providers hand over [`GraphData`]; ingestion keeps node order, drops duplicate
//! nodes and dangling edges, and recomputes the metadata counts. New topology
//! replaces the store wholesale, it is never patched in place.

use crate::error::TopologyError;
use crate::value_objects::{EdgeType, NodeStatus, NodeType, Properties};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

/// An infrastructure element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Unique identifier within a snapshot
    pub id: String,
    /// Human-readable name
    pub label: String,
    /// Element kind
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Free-form grouping used by the category filter
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub status: NodeStatus,
    /// Monthly cost, when the provider knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(default)]
    pub properties: Properties,
}

impl GraphNode {
    /// Create a node with empty properties
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        node_type: NodeType,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            node_type,
            category: category.into(),
            status: NodeStatus::default(),
            cost: None,
            properties: Properties::new(),
        }
    }
}

/// A relationship between two elements of the same snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default)]
    pub properties: Properties,
}

impl GraphEdge {
    /// Create an edge with empty properties
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        edge_type: EdgeType,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            edge_type,
            weight: None,
            properties: Properties::new(),
        }
    }
}

/// Summary information about a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphMetadata {
    pub total_nodes: usize,
    pub total_edges: usize,
    /// Distinct node categories, sorted
    pub categories: Vec<String>,
    pub last_updated: DateTime<Utc>,
}

/// Snapshot as delivered by a topology provider, before validation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<GraphMetadata>,
}

/// Validated, immutable topology snapshot
#[derive(Debug, Clone)]
pub struct GraphStore {
    nodes: IndexMap<String, Arc<GraphNode>>,
    edges: Vec<Arc<GraphEdge>>,
    metadata: GraphMetadata,
    rejected_edges: Vec<TopologyError>,
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::from_data(GraphData::default())
    }
}

impl GraphStore {
    /// Validate a provider snapshot into a store.
    ///
    /// Never fails: duplicate node ids keep the first occurrence and edges whose
    /// endpoints are missing are dropped and recorded in [`GraphStore::rejected_edges`].
    pub fn from_data(data: GraphData) -> Self {
        let GraphData {
            nodes: raw_nodes,
            edges: raw_edges,
            metadata: raw_metadata,
        } = data;

        let mut nodes: IndexMap<String, Arc<GraphNode>> = IndexMap::with_capacity(raw_nodes.len());
        for node in raw_nodes {
            if nodes.contains_key(&node.id) {
                warn!(node_id = %node.id, "Duplicate node id in snapshot, keeping first occurrence");
                continue;
            }
            nodes.insert(node.id.clone(), Arc::new(node));
        }

        let mut edges = Vec::with_capacity(raw_edges.len());
        let mut rejected_edges = Vec::new();
        for edge in raw_edges {
            let missing = [&edge.source, &edge.target]
                .into_iter()
                .find(|id| !nodes.contains_key(id.as_str()))
                .cloned();

            match missing {
                Some(missing_node_id) => {
                    warn!(
                        edge_id = %edge.id,
                        missing_node_id = %missing_node_id,
                        "Dropping edge that references a missing node"
                    );
                    rejected_edges.push(TopologyError::InvariantViolation {
                        edge_id: edge.id,
                        missing_node_id,
                    });
                }
                None => edges.push(Arc::new(edge)),
            }
        }

        let categories: BTreeSet<&str> = nodes
            .values()
            .map(|n| n.category.as_str())
            .filter(|c| !c.is_empty())
            .collect();

        let metadata = GraphMetadata {
            total_nodes: nodes.len(),
            total_edges: edges.len(),
            categories: categories.into_iter().map(str::to_string).collect(),
            last_updated: raw_metadata.map(|m| m.last_updated).unwrap_or_else(Utc::now),
        };

        info!(
            nodes = metadata.total_nodes,
            edges = metadata.total_edges,
            rejected = rejected_edges.len(),
            "Topology snapshot ingested"
        );

        Self {
            nodes,
            edges,
            metadata,
            rejected_edges,
        }
    }

    /// Look up a node by id
    pub fn node(&self, id: &str) -> Option<&Arc<GraphNode>> {
        self.nodes.get(id)
    }

    /// Whether the snapshot contains a node
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Nodes in the order the provider delivered them
    pub fn nodes(&self) -> impl Iterator<Item = &Arc<GraphNode>> {
        self.nodes.values()
    }

    /// Accepted edges in delivery order
    pub fn edges(&self) -> &[Arc<GraphEdge>] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn metadata(&self) -> &GraphMetadata {
        &self.metadata
    }

    /// Edges dropped at ingestion
    pub fn rejected_edges(&self) -> &[TopologyError] {
        &self.rejected_edges
    }

    /// Direct children of a node along containment edges
    pub fn children_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Arc<GraphNode>> + 'a {
        self.edges
            .iter()
            .filter(move |e| e.edge_type == EdgeType::Containment && e.source == id)
            .filter_map(move |e| self.nodes.get(&e.target))
    }

    /// Every edge with the node as source or target
    pub fn edges_touching<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Arc<GraphEdge>> + 'a {
        self.edges
            .iter()
            .filter(move |e| e.source == id || e.target == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_data() -> GraphData {
        GraphData {
            nodes: vec![
                GraphNode::new("r1", "us-east-1", NodeType::Region, "aws"),
                GraphNode::new("n1", "prod-vpc", NodeType::Network, "aws"),
                GraphNode::new("c1", "payments", NodeType::Cluster, "k8s"),
            ],
            edges: vec![
                GraphEdge::new("e1", "r1", "n1", EdgeType::Containment),
                GraphEdge::new("e2", "n1", "c1", EdgeType::Containment),
                GraphEdge::new("e3", "c1", "ghost", EdgeType::Depends),
            ],
            metadata: None,
        }
    }

    #[test]
    fn test_dangling_edges_dropped_at_ingestion() {
        let store = GraphStore::from_data(sample_data());

        assert_eq!(store.len(), 3);
        assert_eq!(store.edge_count(), 2);
        assert_eq!(store.rejected_edges().len(), 1);
        assert_eq!(
            store.rejected_edges()[0],
            TopologyError::InvariantViolation {
                edge_id: "e3".to_string(),
                missing_node_id: "ghost".to_string(),
            }
        );
    }

    #[test]
    fn test_duplicate_nodes_keep_first() {
        let mut data = sample_data();
        data.nodes.push(GraphNode::new("r1", "shadow", NodeType::Region, "gcp"));

        let store = GraphStore::from_data(data);
        assert_eq!(store.len(), 3);
        assert_eq!(store.node("r1").unwrap().label, "us-east-1");
    }

    #[test]
    fn test_metadata_recomputed() {
        let store = GraphStore::from_data(sample_data());
        let metadata = store.metadata();

        assert_eq!(metadata.total_nodes, 3);
        assert_eq!(metadata.total_edges, 2);
        assert_eq!(metadata.categories, vec!["aws".to_string(), "k8s".to_string()]);
    }

    #[test]
    fn test_node_order_preserved() {
        let store = GraphStore::from_data(sample_data());
        let ids: Vec<&str> = store.nodes().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "n1", "c1"]);
    }

    #[test]
    fn test_children_follow_containment() {
        let store = GraphStore::from_data(sample_data());
        let children: Vec<&str> = store.children_of("r1").map(|n| n.id.as_str()).collect();
        assert_eq!(children, vec!["n1"]);
        assert_eq!(store.edges_touching("n1").count(), 2);
    }

    #[test]
    fn test_wire_format() {
        let json = r#"{
            "nodes": [
                {"id": "a", "label": "A", "type": "region", "category": "aws", "status": "warning", "cost": 12.5},
                {"id": "b", "label": "B", "type": "vpc"}
            ],
            "edges": [
                {"id": "e", "source": "a", "target": "b", "type": "containment", "weight": 2.0}
            ]
        }"#;
        let data: GraphData = serde_json::from_str(json).unwrap();
        let store = GraphStore::from_data(data);

        let a = store.node("a").unwrap();
        assert_eq!(a.status, NodeStatus::Warning);
        assert_eq!(a.cost, Some(12.5));
        assert_eq!(store.node("b").unwrap().node_type, NodeType::Network);
        assert_eq!(store.edges()[0].weight, Some(2.0));
    }
}
