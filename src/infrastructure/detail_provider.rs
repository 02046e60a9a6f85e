//! Node details served from a topology snapshot

use crate::error::{TopologyError, TopologyResult};
use crate::navigation::{NodeDetailProvider, NodeDetails};
use crate::store::GraphStore;
use crate::value_objects::EdgeType;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Detail provider backed by the current [`GraphStore`].
///
/// Children follow containment edges, dependencies are every other edge that
/// touches the node, and metrics are the node's numeric properties plus cost
/// and the two counts.
pub struct StoreDetailProvider {
    store: RwLock<Arc<GraphStore>>,
}

impl StoreDetailProvider {
    pub fn new(store: Arc<GraphStore>) -> Self {
        Self {
            store: RwLock::new(store),
        }
    }

    /// Serve subsequent fetches from a newer snapshot
    pub fn replace_store(&self, store: Arc<GraphStore>) {
        *self.store.write() = store;
    }

    fn details(store: &GraphStore, node_id: &str) -> TopologyResult<NodeDetails> {
        let node = store
            .node(node_id)
            .ok_or_else(|| TopologyError::UnknownNode(node_id.to_string()))?;

        let children: Vec<_> = store.children_of(node_id).map(|n| (**n).clone()).collect();
        let dependencies: Vec<_> = store
            .edges_touching(node_id)
            .filter(|e| e.edge_type != EdgeType::Containment)
            .map(|e| (**e).clone())
            .collect();

        let mut metrics: BTreeMap<String, f64> = node
            .properties
            .iter()
            .filter_map(|(key, value)| value.as_f64().map(|v| (key.clone(), v)))
            .collect();
        if let Some(cost) = node.cost {
            metrics.insert("cost".to_string(), cost);
        }
        metrics.insert("children".to_string(), children.len() as f64);
        metrics.insert("dependencies".to_string(), dependencies.len() as f64);

        Ok(NodeDetails {
            node: (**node).clone(),
            children,
            dependencies,
            metrics,
        })
    }
}

#[async_trait]
impl NodeDetailProvider for StoreDetailProvider {
    async fn fetch_details(&self, node_id: &str) -> TopologyResult<NodeDetails> {
        let store = Arc::clone(&self.store.read());
        Self::details(&store, node_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{GraphData, GraphEdge, GraphNode};
    use crate::value_objects::NodeType;

    fn store() -> Arc<GraphStore> {
        let mut cluster = GraphNode::new("c1", "payments", NodeType::Cluster, "k8s");
        cluster.cost = Some(420.0);
        cluster.properties.insert("cpu_utilization".to_string(), serde_json::json!(0.62));
        cluster.properties.insert("owner".to_string(), serde_json::json!("team-pay"));

        Arc::new(GraphStore::from_data(GraphData {
            nodes: vec![
                cluster,
                GraphNode::new("p1", "api-7f9", NodeType::Pod, "k8s"),
                GraphNode::new("p2", "worker-2c1", NodeType::Pod, "k8s"),
                GraphNode::new("db", "orders", NodeType::Database, "data"),
            ],
            edges: vec![
                GraphEdge::new("e1", "c1", "p1", EdgeType::Containment),
                GraphEdge::new("e2", "c1", "p2", EdgeType::Containment),
                GraphEdge::new("e3", "c1", "db", EdgeType::Depends),
            ],
            metadata: None,
        }))
    }

    #[tokio::test]
    async fn test_details_from_store() {
        let provider = StoreDetailProvider::new(store());
        let details = provider.fetch_details("c1").await.unwrap();

        let children: Vec<&str> = details.children.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(children, vec!["p1", "p2"]);
        assert_eq!(details.dependencies.len(), 1);
        assert_eq!(details.dependencies[0].target, "db");
        assert_eq!(details.metrics["cost"], 420.0);
        assert_eq!(details.metrics["cpu_utilization"], 0.62);
        assert_eq!(details.metrics["children"], 2.0);
        assert!(!details.metrics.contains_key("owner"));
    }

    #[tokio::test]
    async fn test_unknown_node_and_store_replacement() {
        let provider = StoreDetailProvider::new(Arc::new(GraphStore::default()));
        assert_eq!(
            provider.fetch_details("c1").await,
            Err(TopologyError::UnknownNode("c1".to_string()))
        );

        provider.replace_store(store());
        assert!(provider.fetch_details("c1").await.is_ok());
    }
}
