//! View state and user selection
//!
//! The [`SelectionController`] owns the [`ViewState`]. Each operation reports a
//! [`ViewChange`] telling the caller whether the LOD selection must be recomputed
//! or the layout re-centred; search and selection only affect presentation.

pub mod events;

pub use events::{EventQueue, GraphInteractionSink, InteractionEvent, NoopSink};

use crate::error::{TopologyError, TopologyResult};
use crate::store::{GraphNode, GraphStore};
use crate::value_objects::Position2D;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Zoom limits of the view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.1,
            max_zoom: 8.0,
        }
    }
}

/// What the user is currently looking at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub zoom: f64,
    pub pan: Position2D,
    pub selected_node_ids: BTreeSet<String>,
    pub filter_category: Option<String>,
    pub search_query: String,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Position2D::default(),
            selected_node_ids: BTreeSet::new(),
            filter_category: None,
            search_query: String::new(),
        }
    }
}

/// Follow-up work required after a view operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewChange {
    /// Zoom or category changed: recompute the visible set
    pub reselect: bool,
    /// Re-fit the layout in the viewport
    pub recenter: bool,
}

impl ViewChange {
    pub fn none() -> Self {
        Self::default()
    }

    fn reselect(reselect: bool) -> Self {
        Self {
            reselect,
            recenter: false,
        }
    }
}

/// Presentation tags of one node, for the renderer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NodePresentation {
    pub selected: bool,
    /// Matches the active search
    pub highlighted: bool,
    /// Outside the active search or category
    pub dimmed: bool,
    /// Accepts clicks and drags
    pub interactive: bool,
}

/// Translates user interaction into view state changes and sink events
pub struct SelectionController {
    config: ViewConfig,
    view: ViewState,
    /// Ids matching the active search; `None` when no search is active
    search_matches: Option<HashSet<String>>,
    sink: Arc<dyn GraphInteractionSink>,
}

impl SelectionController {
    pub fn new(config: ViewConfig, sink: Arc<dyn GraphInteractionSink>) -> Self {
        Self {
            config,
            view: ViewState::default(),
            search_matches: None,
            sink,
        }
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Set the zoom, clamped to the configured limits. Non-finite values are ignored.
    pub fn set_zoom(&mut self, zoom: f64) -> ViewChange {
        if !zoom.is_finite() {
            return ViewChange::none();
        }
        let zoom = zoom.clamp(self.config.min_zoom, self.config.max_zoom);
        if zoom == self.view.zoom {
            return ViewChange::none();
        }

        self.view.zoom = zoom;
        self.sink.on_viewport_change(&self.view);
        ViewChange::reselect(true)
    }

    /// Pan never changes the visible set
    pub fn set_pan(&mut self, x: f64, y: f64) -> ViewChange {
        if !(x.is_finite() && y.is_finite()) {
            return ViewChange::none();
        }
        self.view.pan = Position2D::new(x, y);
        self.sink.on_viewport_change(&self.view);
        ViewChange::none()
    }

    /// Highlight nodes whose label, type or category contains `query`
    /// (case-insensitive) and dim the rest. An empty query clears both tags.
    /// Returns the number of matches.
    pub fn search(&mut self, store: &GraphStore, query: &str) -> usize {
        let needle = query.trim().to_lowercase();
        self.view.search_query = query.trim().to_string();

        if needle.is_empty() {
            self.search_matches = None;
            return 0;
        }

        let matches: HashSet<String> = store
            .nodes()
            .filter(|node| {
                node.label.to_lowercase().contains(&needle)
                    || node.node_type.as_str().to_lowercase().contains(&needle)
                    || node.category.to_lowercase().contains(&needle)
            })
            .map(|node| node.id.clone())
            .collect();

        debug!(query = %needle, matches = matches.len(), "Search applied");
        let count = matches.len();
        self.search_matches = Some(matches);
        count
    }

    /// Dim every node outside `category`; `None` clears the overlay
    pub fn filter_by_category(&mut self, category: Option<&str>) -> ViewChange {
        let category = category.map(str::to_string);
        if category == self.view.filter_category {
            return ViewChange::none();
        }
        self.view.filter_category = category;
        ViewChange::reselect(true)
    }

    /// Make `node_id` the single selected node and notify the sink
    pub fn select_node(&mut self, store: &GraphStore, node_id: &str) -> TopologyResult<()> {
        let node = store
            .node(node_id)
            .ok_or_else(|| TopologyError::UnknownNode(node_id.to_string()))?;

        self.view.selected_node_ids.clear();
        self.view.selected_node_ids.insert(node.id.clone());
        self.sink.on_node_click(node);
        Ok(())
    }

    /// Forward an edge click to the sink
    pub fn click_edge(&mut self, store: &GraphStore, edge_id: &str) -> TopologyResult<()> {
        let edge = store
            .edges()
            .iter()
            .find(|e| e.id == edge_id)
            .ok_or_else(|| TopologyError::UnknownEdge(edge_id.to_string()))?;
        self.sink.on_edge_click(edge);
        Ok(())
    }

    /// Forward a double click to the sink; selection follows the click
    pub fn double_click_node(&mut self, store: &GraphStore, node_id: &str) -> TopologyResult<()> {
        self.select_node(store, node_id)?;
        if let Some(node) = store.node(node_id) {
            self.sink.on_node_double_click(node);
        }
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        if !self.view.selected_node_ids.is_empty() {
            self.view.selected_node_ids.clear();
            self.sink.on_selection_cleared();
        }
    }

    /// Back to zoom 1 at the origin with no selection, search or filter
    pub fn reset(&mut self) -> ViewChange {
        let reselect = self.view.zoom != 1.0 || self.view.filter_category.is_some();

        self.clear_selection();
        self.view = ViewState::default();
        self.search_matches = None;
        self.sink.on_viewport_change(&self.view);

        ViewChange {
            reselect,
            recenter: true,
        }
    }

    /// Drop selection entries that no longer exist in `store`
    pub fn retain_known(&mut self, store: &GraphStore) {
        self.view.selected_node_ids.retain(|id| store.contains(id));
        if let Some(matches) = self.search_matches.as_mut() {
            matches.retain(|id| store.contains(id));
        }
    }

    /// Presentation tags of a node under the current search, filter and selection
    pub fn presentation(&self, node: &GraphNode) -> NodePresentation {
        let in_category = self
            .view
            .filter_category
            .as_ref()
            .map_or(true, |category| node.category == *category);
        let (highlighted, search_dimmed) = match &self.search_matches {
            Some(matches) => {
                let hit = matches.contains(&node.id);
                (hit, !hit)
            }
            None => (false, false),
        };

        NodePresentation {
            selected: self.view.selected_node_ids.contains(&node.id),
            highlighted,
            dimmed: search_dimmed || !in_category,
            interactive: in_category,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{GraphData, GraphEdge};
    use crate::value_objects::{EdgeType, NodeType};

    fn store() -> GraphStore {
        GraphStore::from_data(GraphData {
            nodes: vec![
                GraphNode::new("r1", "us-east-1", NodeType::Region, "aws"),
                GraphNode::new("c1", "Payments", NodeType::Cluster, "k8s"),
                GraphNode::new("s1", "payments-api", NodeType::Service, "apps"),
                GraphNode::new("d1", "orders-db", NodeType::Database, "data"),
            ],
            edges: vec![GraphEdge::new("e1", "c1", "s1", EdgeType::Containment)],
            metadata: None,
        })
    }

    fn controller() -> (SelectionController, Arc<EventQueue>) {
        let queue = Arc::new(EventQueue::new());
        (SelectionController::new(ViewConfig::default(), queue.clone()), queue)
    }

    #[test]
    fn test_zoom_clamped_and_reselects() {
        let (mut controller, queue) = controller();

        assert!(controller.set_zoom(0.5).reselect);
        assert_eq!(controller.view().zoom, 0.5);
        assert!(controller.set_zoom(100.0).reselect);
        assert_eq!(controller.view().zoom, 8.0);
        assert!(!controller.set_zoom(8.0).reselect);
        assert!(!controller.set_zoom(f64::NAN).reselect);
        assert_eq!(queue.drain().len(), 2);
    }

    #[test]
    fn test_pan_does_not_reselect() {
        let (mut controller, _) = controller();
        assert_eq!(controller.set_pan(10.0, -5.0), ViewChange::none());
        assert_eq!(controller.view().pan, Position2D::new(10.0, -5.0));
    }

    #[test]
    fn test_search_is_case_insensitive_over_label_type_category() {
        let (mut controller, _) = controller();
        let store = store();

        assert_eq!(controller.search(&store, "PAYMENTS"), 2);
        assert_eq!(controller.search(&store, "database"), 1);
        assert_eq!(controller.search(&store, "k8s"), 1);

        let db = store.node("d1").unwrap();
        let region = store.node("r1").unwrap();
        controller.search(&store, "orders");
        assert!(controller.presentation(db).highlighted);
        assert!(controller.presentation(region).dimmed);
    }

    #[test]
    fn test_empty_search_restores_every_node() {
        let (mut controller, _) = controller();
        let store = store();

        controller.search(&store, "foo");
        assert!(store.nodes().all(|n| controller.presentation(n).dimmed));

        assert_eq!(controller.search(&store, ""), 0);
        for node in store.nodes() {
            let presentation = controller.presentation(node);
            assert!(!presentation.dimmed);
            assert!(!presentation.highlighted);
        }
    }

    #[test]
    fn test_category_filter_dims_others() {
        let (mut controller, _) = controller();
        let store = store();

        assert!(controller.filter_by_category(Some("k8s")).reselect);
        assert!(!controller.filter_by_category(Some("k8s")).reselect);

        let cluster = controller.presentation(store.node("c1").unwrap());
        let service = controller.presentation(store.node("s1").unwrap());
        assert!(cluster.interactive && !cluster.dimmed);
        assert!(!service.interactive && service.dimmed);

        assert!(controller.filter_by_category(None).reselect);
        assert!(controller.presentation(store.node("s1").unwrap()).interactive);
    }

    #[test]
    fn test_last_click_wins() {
        let (mut controller, queue) = controller();
        let store = store();

        controller.select_node(&store, "r1").unwrap();
        controller.select_node(&store, "c1").unwrap();

        assert_eq!(controller.view().selected_node_ids.len(), 1);
        assert!(controller.view().selected_node_ids.contains("c1"));
        assert_eq!(queue.drain().len(), 2);

        assert_eq!(
            controller.select_node(&store, "nope"),
            Err(TopologyError::UnknownNode("nope".to_string()))
        );
    }

    #[test]
    fn test_edge_and_double_click_events() {
        let (mut controller, queue) = controller();
        let store = store();

        controller.click_edge(&store, "e1").unwrap();
        controller.double_click_node(&store, "s1").unwrap();

        let events = queue.drain();
        assert!(matches!(&events[0], InteractionEvent::EdgeClicked(e) if e.id == "e1"));
        assert!(matches!(&events[1], InteractionEvent::NodeClicked(n) if n.id == "s1"));
        assert!(matches!(&events[2], InteractionEvent::NodeDoubleClicked(n) if n.id == "s1"));
    }

    #[test]
    fn test_reset_clears_everything() {
        let (mut controller, _) = controller();
        let store = store();

        controller.set_zoom(2.0);
        controller.set_pan(40.0, 40.0);
        controller.filter_by_category(Some("aws"));
        controller.search(&store, "pay");
        controller.select_node(&store, "c1").unwrap();

        let change = controller.reset();
        assert!(change.reselect);
        assert!(change.recenter);
        assert_eq!(controller.view(), &ViewState::default());
        for node in store.nodes() {
            assert_eq!(
                controller.presentation(node),
                NodePresentation {
                    interactive: true,
                    ..NodePresentation::default()
                }
            );
        }
    }
}
