//! Interaction events emitted to the owning collaborators

use super::ViewState;
use crate::store::{GraphEdge, GraphNode};
use parking_lot::Mutex;
use std::sync::Arc;

/// Receiver of user interaction on the graph.
///
/// Every method has a no-op default so hosts implement only what they need.
pub trait GraphInteractionSink: Send + Sync {
    /// A node was clicked and is now the single selected node
    fn on_node_click(&self, _node: &GraphNode) {}

    fn on_edge_click(&self, _edge: &GraphEdge) {}

    /// A node was double-clicked; hosts usually drill into it
    fn on_node_double_click(&self, _node: &GraphNode) {}

    fn on_selection_cleared(&self) {}

    /// Zoom or pan changed
    fn on_viewport_change(&self, _view: &ViewState) {}
}

/// Sink that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl GraphInteractionSink for NoopSink {}

/// Interaction captured by an [`EventQueue`]
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionEvent {
    NodeClicked(Arc<GraphNode>),
    EdgeClicked(Arc<GraphEdge>),
    NodeDoubleClicked(Arc<GraphNode>),
    SelectionCleared,
    ViewportChanged { zoom: f64, pan_x: f64, pan_y: f64 },
}

/// Sink that buffers events for hosts that poll once per frame
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Mutex<Vec<InteractionEvent>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every buffered event in arrival order
    pub fn drain(&self) -> Vec<InteractionEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    fn push(&self, event: InteractionEvent) {
        self.events.lock().push(event);
    }
}

impl GraphInteractionSink for EventQueue {
    fn on_node_click(&self, node: &GraphNode) {
        self.push(InteractionEvent::NodeClicked(Arc::new(node.clone())));
    }

    fn on_edge_click(&self, edge: &GraphEdge) {
        self.push(InteractionEvent::EdgeClicked(Arc::new(edge.clone())));
    }

    fn on_node_double_click(&self, node: &GraphNode) {
        self.push(InteractionEvent::NodeDoubleClicked(Arc::new(node.clone())));
    }

    fn on_selection_cleared(&self) {
        self.push(InteractionEvent::SelectionCleared);
    }

    fn on_viewport_change(&self, view: &ViewState) {
        self.push(InteractionEvent::ViewportChanged {
            zoom: view.zoom,
            pan_x: view.pan.x,
            pan_y: view.pan.y,
        });
    }
}
