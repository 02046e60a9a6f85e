//! The exploration core wired together
//!
//! [`TopologyExplorer`] owns the current snapshot, the view state, the LOD
//! selection and the layout simulation. The renderer feeds it pointer events
//! and calls [`TopologyExplorer::frame`] once per animation frame; the host UI
//! drives search, filtering and reset. Drill-down navigation is kept separate
//! in [`crate::navigation::DrillDownNavigator`] so that detail loading can be
//! awaited without borrowing the explorer.

use crate::config::ExplorerConfig;
use crate::error::{TopologyError, TopologyResult};
use crate::infrastructure::TopologyProvider;
use crate::layout::{LayoutEngine, NodePosition};
use crate::performance::{LodSelector, PerformanceStats, VisibleSet};
use crate::selection::{GraphInteractionSink, NodePresentation, SelectionController, ViewChange, ViewState};
use crate::store::{GraphData, GraphStore};
use crate::value_objects::{Position2D, ViewportSize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Interactive explorer over one topology snapshot at a time
pub struct TopologyExplorer {
    config: ExplorerConfig,
    store: Arc<GraphStore>,
    selector: LodSelector,
    controller: SelectionController,
    layout: LayoutEngine,
    visible: VisibleSet,
    stats: PerformanceStats,
}

impl TopologyExplorer {
    /// Create an explorer with an empty snapshot
    pub fn new(config: ExplorerConfig, sink: Arc<dyn GraphInteractionSink>, viewport: ViewportSize) -> Self {
        let mut layout = LayoutEngine::new(config.forces.clone());
        let visible = VisibleSet::default();
        layout.start(&visible, viewport);

        Self {
            selector: LodSelector::new(config.lod.clone()),
            controller: SelectionController::new(config.view.clone(), sink),
            layout,
            visible,
            stats: PerformanceStats::default(),
            store: Arc::new(GraphStore::default()),
            config,
        }
    }

    // ---- topology ----

    /// Swap in a new snapshot. Positions of nodes that stay visible are kept.
    pub fn replace_snapshot(&mut self, data: GraphData) {
        let store = Arc::new(GraphStore::from_data(data));
        debug!(
            nodes = store.len(),
            rejected_edges = store.rejected_edges().len(),
            "Replacing topology snapshot"
        );
        self.store = store;
        self.stats.total_nodes = self.store.len();
        self.stats.total_edges = self.store.edge_count();

        self.controller.retain_known(&self.store);
        let query = self.controller.view().search_query.clone();
        if !query.is_empty() {
            self.controller.search(&self.store, &query);
        }

        let next = self.select_visible();
        if self.layout.nodes().is_empty() {
            self.layout.start(&next, self.layout.viewport());
        } else {
            self.layout.retarget(&next);
        }
        self.install_visible(next);
    }

    /// Poll `provider` for a new snapshot. On failure the current snapshot stays
    /// in place and the error is returned for the host to surface.
    pub async fn refresh(&mut self, provider: &dyn TopologyProvider) -> TopologyResult<()> {
        match provider.fetch_topology().await {
            Ok(data) => {
                self.replace_snapshot(data);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "Topology refresh failed, keeping last snapshot");
                Err(err)
            }
        }
    }

    // ---- frame loop ----

    /// Advance the layout one tick and return the positions to paint
    pub fn frame(&mut self) -> Vec<NodePosition> {
        let started = Instant::now();
        let positions = self.layout.tick();
        self.stats
            .record_layout(started.elapsed(), self.layout.alpha(), self.layout.ticks_since_reheat());
        positions
    }

    /// The renderer reports how long painting the last frame took
    pub fn record_render_duration(&mut self, elapsed: Duration) {
        self.stats.record_render(elapsed);
    }

    /// Whether the layout has settled and frames can be skipped
    pub fn is_idle(&self) -> bool {
        self.layout.is_idle()
    }

    // ---- pointer events ----

    pub fn on_node_click(&mut self, node_id: &str) -> TopologyResult<()> {
        self.controller.select_node(&self.store, node_id)
    }

    pub fn on_edge_click(&mut self, edge_id: &str) -> TopologyResult<()> {
        self.controller.click_edge(&self.store, edge_id)
    }

    pub fn on_double_click(&mut self, node_id: &str) -> TopologyResult<()> {
        self.controller.double_click_node(&self.store, node_id)
    }

    /// Pin a node under the pointer. Nodes dimmed by the category filter
    /// cannot be dragged.
    pub fn on_drag_start(&mut self, node_id: &str, x: f64, y: f64) -> bool {
        if !self.is_interactive(node_id) {
            debug!(node_id, "Ignoring drag on non-interactive node");
            return false;
        }
        self.layout.pin(node_id, x, y)
    }

    pub fn on_drag_move(&mut self, node_id: &str, x: f64, y: f64) -> bool {
        let pinned = self
            .layout
            .nodes()
            .iter()
            .any(|node| node.id() == node_id && node.is_pinned());
        pinned && self.layout.pin(node_id, x, y)
    }

    pub fn on_drag_end(&mut self, node_id: &str) -> bool {
        self.layout.unpin(node_id)
    }

    /// Zoom and pan reported by the renderer
    pub fn on_viewport_change(&mut self, zoom: f64, pan_x: f64, pan_y: f64) {
        let change = self.controller.set_zoom(zoom);
        self.controller.set_pan(pan_x, pan_y);
        self.apply(change);
    }

    /// The drawing surface changed size
    pub fn resize(&mut self, viewport: ViewportSize) {
        if viewport.is_degenerate() {
            let err = TopologyError::DegenerateViewport {
                width: viewport.width,
                height: viewport.height,
            };
            debug!(error = %err, "Resize to degenerate viewport");
        }
        self.layout.resize(viewport);
    }

    // ---- host UI ----

    /// Highlight matching nodes; returns the number of matches
    pub fn search_nodes(&mut self, query: &str) -> usize {
        self.controller.search(&self.store, query)
    }

    pub fn filter_by_category(&mut self, category: Option<&str>) {
        let change = self.controller.filter_by_category(category);
        self.apply(change);
    }

    /// Zoom 1, pan to origin, clear every tag and re-fit the layout
    pub fn reset_view(&mut self) {
        let change = self.controller.reset();
        self.apply(change);
    }

    pub fn select_node(&mut self, node_id: &str) -> TopologyResult<()> {
        self.controller.select_node(&self.store, node_id)
    }

    pub fn clear_selection(&mut self) {
        self.controller.clear_selection();
    }

    pub fn performance_stats(&self) -> &PerformanceStats {
        &self.stats
    }

    // ---- read access ----

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    /// The current snapshot; cheap to clone for detail providers
    pub fn store(&self) -> &Arc<GraphStore> {
        &self.store
    }

    pub fn view(&self) -> &ViewState {
        self.controller.view()
    }

    pub fn visible_set(&self) -> &VisibleSet {
        &self.visible
    }

    pub fn layout(&self) -> &LayoutEngine {
        &self.layout
    }

    /// Positions without advancing the simulation
    pub fn positions(&self) -> Vec<NodePosition> {
        self.layout.positions()
    }

    pub fn position(&self, node_id: &str) -> Option<Position2D> {
        self.layout.position(node_id)
    }

    /// Presentation tags of a visible node
    pub fn presentation(&self, node_id: &str) -> Option<NodePresentation> {
        self.visible
            .nodes
            .iter()
            .find(|n| n.id() == node_id)
            .map(|n| self.controller.presentation(&n.node))
    }

    fn is_interactive(&self, node_id: &str) -> bool {
        self.visible
            .nodes
            .iter()
            .any(|n| n.id() == node_id && n.interactive)
    }

    fn select_visible(&self) -> VisibleSet {
        self.selector
            .select(&self.store, self.controller.view(), self.config.lod.max_visible_nodes)
    }

    fn apply(&mut self, change: ViewChange) {
        if change.reselect {
            self.reselect();
        }
        if change.recenter {
            self.layout.recenter();
        }
    }

    /// Recompute the visible set; the layout is only disturbed when membership changed
    fn reselect(&mut self) {
        let next = self.select_visible();
        if !next.same_membership(&self.visible) {
            self.layout.retarget(&next);
        }
        self.install_visible(next);
    }

    fn install_visible(&mut self, visible: VisibleSet) {
        self.stats.record_visible(&visible);
        self.visible = visible;
    }
}
