//! Property tests for level-of-detail selection

use proptest::prelude::*;
use topology_explorer::{
    EdgeType, GraphData, GraphEdge, GraphNode, GraphStore, LodConfig, LodSelector, NodeType, ViewState,
};

const TYPES: [NodeType; 6] = [
    NodeType::Region,
    NodeType::Network,
    NodeType::Cluster,
    NodeType::Database,
    NodeType::Pod,
    NodeType::Service,
];

const CATEGORIES: [&str; 3] = ["aws", "k8s", "data"];

fn build_store(nodes: &[(usize, usize)], edges: &[(usize, usize)]) -> GraphStore {
    let nodes: Vec<GraphNode> = nodes
        .iter()
        .enumerate()
        .map(|(i, &(t, c))| GraphNode::new(format!("n{i}"), format!("node {i}"), TYPES[t].clone(), CATEGORIES[c]))
        .collect();
    let edges = if nodes.is_empty() {
        Vec::new()
    } else {
        edges
            .iter()
            .enumerate()
            .map(|(i, &(s, t))| {
                GraphEdge::new(
                    format!("e{i}"),
                    format!("n{}", s % nodes.len()),
                    format!("n{}", t % nodes.len()),
                    EdgeType::Connects,
                )
            })
            .collect()
    };

    GraphStore::from_data(GraphData {
        nodes,
        edges,
        metadata: None,
    })
}

fn store_strategy(min_nodes: usize, max_nodes: usize) -> impl Strategy<Value = GraphStore> {
    (
        prop::collection::vec((0..TYPES.len(), 0..CATEGORIES.len()), min_nodes..max_nodes),
        prop::collection::vec((any::<usize>(), any::<usize>()), 0..600),
    )
        .prop_map(|(nodes, edges)| build_store(&nodes, &edges))
}

fn view(zoom: f64, filter: Option<usize>) -> ViewState {
    ViewState {
        zoom,
        filter_category: filter.map(|c| CATEGORIES[c].to_string()),
        ..ViewState::default()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn test_large_store_respects_budget_and_edges(
        store in store_strategy(1000, 1600),
        zoom in 0.0f64..4.0,
        max_visible in 0usize..2500,
        filter in prop::option::of(0..CATEGORIES.len()),
    ) {
        let selector = LodSelector::new(LodConfig::default());
        let visible = selector.select(&store, &view(zoom, filter), max_visible);

        prop_assert!(visible.len() <= max_visible.max(100));
        prop_assert!(visible.len() >= 100);
        for edge in &visible.edges {
            prop_assert!(visible.contains(&edge.source));
            prop_assert!(visible.contains(&edge.target));
        }
    }

    #[test]
    fn test_selection_is_deterministic(
        store in store_strategy(900, 1300),
        zoom in 0.1f64..2.0,
        max_visible in 100usize..1500,
    ) {
        let selector = LodSelector::new(LodConfig::default());
        let view = view(zoom, None);

        let first = selector.select(&store, &view, max_visible);
        let second = selector.select(&store, &view, max_visible);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_small_store_passes_through(
        store in store_strategy(0, 1000),
        zoom in 0.0f64..4.0,
        max_visible in 0usize..300,
    ) {
        let selector = LodSelector::new(LodConfig::default());
        let visible = selector.select(&store, &view(zoom, None), max_visible);

        prop_assert_eq!(visible.len(), store.len());
        prop_assert_eq!(visible.edge_count(), store.edge_count());
    }

    #[test]
    fn test_higher_priority_never_dropped_before_lower(
        store in store_strategy(1000, 1400),
        zoom in 0.0f64..1.0,
    ) {
        let selector = LodSelector::new(LodConfig::default());
        let visible = selector.select(&store, &view(zoom, None), 400);

        let lowest_kept = visible.nodes.iter().map(|n| n.node.node_type.priority()).min().unwrap_or(0);
        let dropped_above = store
            .nodes()
            .filter(|n| !visible.contains(&n.id))
            .any(|n| n.node_type.priority() > lowest_kept);
        prop_assert!(!dropped_above);
    }
}
