//! Owned force simulation driven by explicit ticks

use super::forces::{self, Link};
use super::{ForceConfig, NodePosition, SimulationNode};
use crate::performance::spatial_acceleration::ChargeParams;
use crate::performance::VisibleSet;
use crate::value_objects::{Position2D, ViewportSize};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Force-directed layout of a [`VisibleSet`]
pub struct LayoutEngine {
    config: ForceConfig,
    nodes: Vec<SimulationNode>,
    index: HashMap<Arc<str>, usize>,
    links: Vec<Link>,
    viewport: ViewportSize,
    alpha: f64,
    alpha_target: f64,
    ticks_since_reheat: usize,
    rng: StdRng,
}

impl LayoutEngine {
    /// Create an idle engine with no nodes
    pub fn new(config: ForceConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            nodes: Vec::new(),
            index: HashMap::new(),
            links: Vec::new(),
            viewport: ViewportSize::default(),
            alpha: 0.0,
            alpha_target: 0.0,
            ticks_since_reheat: 0,
            rng,
        }
    }

    pub fn config(&self) -> &ForceConfig {
        &self.config
    }

    /// Start a fresh simulation: every node begins at the viewport centre
    pub fn start(&mut self, visible: &VisibleSet, viewport: ViewportSize) {
        self.viewport = viewport;
        if viewport.is_degenerate() {
            warn!(
                width = viewport.width,
                height = viewport.height,
                "Degenerate viewport, parking layout at fallback centre"
            );
        }

        self.rng = StdRng::seed_from_u64(self.config.seed);
        self.nodes.clear();
        self.index.clear();
        self.rebuild(visible);
        self.alpha = 1.0;
        self.alpha_target = 0.0;
        self.ticks_since_reheat = 0;
        debug!(nodes = self.nodes.len(), links = self.links.len(), "Layout started");
    }

    /// Swap in a new visible set, keeping positions of nodes that stay visible
    pub fn retarget(&mut self, visible: &VisibleSet) {
        self.rebuild(visible);
        self.reheat(self.config.reheat_alpha);
        debug!(nodes = self.nodes.len(), links = self.links.len(), "Layout retargeted");
    }

    /// Fix a node at `(x, y)` until unpinned; used for drag start and drag move
    pub fn pin(&mut self, node_id: &str, x: f64, y: f64) -> bool {
        let Some(&i) = self.index.get(node_id) else {
            return false;
        };
        if !(x.is_finite() && y.is_finite()) {
            warn!(node_id, "Ignoring non-finite pin position");
            return false;
        }

        let node = &mut self.nodes[i];
        node.fx = Some(x);
        node.fy = Some(y);
        node.x = x;
        node.y = y;
        node.vx = 0.0;
        node.vy = 0.0;

        self.alpha_target = self.config.drag_alpha_target;
        true
    }

    /// Release a pinned node; the simulation decays back to idle once nothing is pinned
    pub fn unpin(&mut self, node_id: &str) -> bool {
        let Some(&i) = self.index.get(node_id) else {
            return false;
        };
        let node = &mut self.nodes[i];
        node.fx = None;
        node.fy = None;

        if !self.nodes.iter().any(SimulationNode::is_pinned) {
            self.alpha_target = 0.0;
        }
        true
    }

    /// Halt the simulation; positions stay where they are
    pub fn stop(&mut self) {
        self.alpha = 0.0;
        self.alpha_target = 0.0;
    }

    /// Change the drawing surface, carrying the layout along with its centre
    pub fn resize(&mut self, viewport: ViewportSize) {
        let was_degenerate = self.viewport.is_degenerate();
        let old_center = self.viewport.center();
        self.viewport = viewport;

        if viewport.is_degenerate() {
            warn!(
                width = viewport.width,
                height = viewport.height,
                "Degenerate viewport, parking layout at fallback centre"
            );
            return;
        }

        let center = viewport.center();
        if was_degenerate {
            // Parked nodes have no meaningful layout yet
            for node in &mut self.nodes {
                node.x = center.x;
                node.y = center.y;
                node.vx = 0.0;
                node.vy = 0.0;
            }
            self.reheat(1.0);
        } else {
            let (dx, dy) = (center.x - old_center.x, center.y - old_center.y);
            self.translate(dx, dy);
            self.reheat(self.config.reheat_alpha);
        }
    }

    /// Move the layout so its bounding box is centred in the viewport, then reheat
    pub fn recenter(&mut self) {
        if self.nodes.is_empty() || self.viewport.is_degenerate() {
            return;
        }

        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for node in &self.nodes {
            min_x = min_x.min(node.x);
            min_y = min_y.min(node.y);
            max_x = max_x.max(node.x);
            max_y = max_y.max(node.y);
        }

        let center = self.viewport.center();
        let dx = center.x - (min_x + max_x) / 2.0;
        let dy = center.y - (min_y + max_y) / 2.0;
        self.translate(dx, dy);
        for node in &mut self.nodes {
            node.vx = 0.0;
            node.vy = 0.0;
        }
        self.reheat(self.config.reheat_alpha);
    }

    /// Shift every node, pins included
    fn translate(&mut self, dx: f64, dy: f64) {
        for node in &mut self.nodes {
            node.x += dx;
            node.y += dy;
            node.fx = node.fx.map(|fx| fx + dx);
            node.fy = node.fy.map(|fy| fy + dy);
        }
    }

    /// Advance one step and report positions. Never fails: invalid numbers are
    /// clamped to the viewport centre.
    pub fn tick(&mut self) -> Vec<NodePosition> {
        if !self.is_idle() && !self.viewport.is_degenerate() {
            self.step();
            if self.is_idle() {
                debug!(ticks = self.ticks_since_reheat, "Layout settled");
            }
        }
        self.positions()
    }

    /// Current positions without advancing the simulation
    pub fn positions(&self) -> Vec<NodePosition> {
        let fallback = self.viewport.center();
        let parked = self.viewport.is_degenerate();

        self.nodes
            .iter()
            .map(|node| {
                let position = Position2D::new(node.x, node.y);
                let position = if parked || !position.is_finite() {
                    fallback
                } else {
                    position
                };
                NodePosition {
                    id: Arc::clone(&node.id),
                    x: position.x,
                    y: position.y,
                }
            })
            .collect()
    }

    /// Reported position of a single node
    pub fn position(&self, node_id: &str) -> Option<Position2D> {
        let &i = self.index.get(node_id)?;
        let node = &self.nodes[i];
        let position = Position2D::new(node.x, node.y);
        if self.viewport.is_degenerate() || !position.is_finite() {
            Some(self.viewport.center())
        } else {
            Some(position)
        }
    }

    /// Read-only view of the simulation records
    pub fn nodes(&self) -> &[SimulationNode] {
        &self.nodes
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn alpha_target(&self) -> f64 {
        self.alpha_target
    }

    pub fn ticks_since_reheat(&self) -> usize {
        self.ticks_since_reheat
    }

    pub fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    /// Idle once the energy is spent and nothing holds it up
    pub fn is_idle(&self) -> bool {
        self.alpha < self.config.alpha_min && self.alpha_target < self.config.alpha_min
    }

    fn reheat(&mut self, alpha: f64) {
        self.alpha = self.alpha.max(alpha);
        self.ticks_since_reheat = 0;
    }

    /// Reconcile simulation nodes and links with a visible set
    fn rebuild(&mut self, visible: &VisibleSet) {
        let center = self.viewport.center();
        let padding = self.config.collision_padding;

        let mut previous: HashMap<Arc<str>, SimulationNode> = self
            .nodes
            .drain(..)
            .map(|node| (Arc::clone(&node.id), node))
            .collect();

        self.index.clear();
        for visible_node in &visible.nodes {
            let radius = visible_node.node.node_type.collision_radius() + padding;
            let node = match previous.remove(visible_node.id()) {
                Some(mut existing) => {
                    existing.radius = radius;
                    existing
                }
                None => SimulationNode::new(Arc::from(visible_node.id()), center.x, center.y, radius),
            };
            self.index.insert(Arc::clone(&node.id), self.nodes.len());
            self.nodes.push(node);
        }

        if !self.nodes.iter().any(SimulationNode::is_pinned) {
            self.alpha_target = 0.0;
        }

        self.rebuild_links(visible);
    }

    fn rebuild_links(&mut self, visible: &VisibleSet) {
        let mut degree = vec![0usize; self.nodes.len()];
        let mut endpoints = Vec::with_capacity(visible.edges.len());

        for edge in &visible.edges {
            let (Some(&source), Some(&target)) =
                (self.index.get(edge.source.as_str()), self.index.get(edge.target.as_str()))
            else {
                continue;
            };
            if source == target {
                continue;
            }
            degree[source] += 1;
            degree[target] += 1;
            endpoints.push((source, target));
        }

        self.links = endpoints
            .into_iter()
            .map(|(source, target)| {
                let (ds, dt) = (degree[source] as f64, degree[target] as f64);
                Link {
                    source,
                    target,
                    distance: self.config.link_distance,
                    strength: self.config.link_strength.unwrap_or(1.0 / ds.min(dt)),
                    bias: ds / (ds + dt),
                }
            })
            .collect();
    }

    fn step(&mut self) {
        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
        self.ticks_since_reheat += 1;

        let alpha = self.alpha;
        let center = self.viewport.center();
        let config = &self.config;

        forces::link(&mut self.nodes, &self.links, alpha, config.link_iterations, &mut self.rng);
        forces::charge(
            &mut self.nodes,
            &ChargeParams {
                strength: config.charge_strength,
                theta: config.theta,
                distance_min: config.charge_distance_min,
                alpha,
            },
            &mut self.rng,
        );
        forces::center(&mut self.nodes, center, config.center_strength);
        forces::collide(&mut self.nodes, config.collision_strength, &mut self.rng);
        forces::axis(&mut self.nodes, center, config.axis_strength, alpha);

        let retain = 1.0 - config.velocity_decay;
        let mut coerced = 0usize;
        for node in &mut self.nodes {
            match node.fx {
                Some(fx) => {
                    node.x = fx;
                    node.vx = 0.0;
                }
                None => {
                    node.vx *= retain;
                    node.x += node.vx;
                }
            }
            match node.fy {
                Some(fy) => {
                    node.y = fy;
                    node.vy = 0.0;
                }
                None => {
                    node.vy *= retain;
                    node.y += node.vy;
                }
            }

            if !(node.x.is_finite() && node.y.is_finite() && node.vx.is_finite() && node.vy.is_finite()) {
                node.x = center.x;
                node.y = center.y;
                node.vx = 0.0;
                node.vy = 0.0;
                coerced += 1;
            }
        }

        if coerced > 0 {
            warn!(coerced, "Non-finite layout values reset to viewport centre");
        }
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(ForceConfig::default())
    }
}
