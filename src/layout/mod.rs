//! Force-directed layout of the visible set
//!
//! The [`LayoutEngine`] owns one [`SimulationNode`] per visible node and is
//! advanced explicitly by the host's render loop, one [`LayoutEngine::tick`] per
//! frame, until its energy (`alpha`) decays below the idle threshold.

mod forces;
pub mod simulation;

pub use simulation::LayoutEngine;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Configuration for the force simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceConfig {
    /// Rest length of an edge spring
    pub link_distance: f64,
    /// Fixed spring strength; `None` weakens springs on high-degree nodes
    pub link_strength: Option<f64>,
    /// Spring relaxation passes per tick
    pub link_iterations: usize,
    /// Many-body strength; negative repels
    pub charge_strength: f64,
    /// Barnes-Hut accuracy parameter
    pub theta: f64,
    pub charge_distance_min: f64,
    /// Fraction of the mean offset corrected each tick
    pub center_strength: f64,
    /// Per-axis pull toward the centre
    pub axis_strength: f64,
    pub collision_strength: f64,
    /// Added to each node type's collision radius
    pub collision_padding: f64,
    /// Fraction of the gap to `alpha_target` closed per tick
    pub alpha_decay: f64,
    /// Below this the simulation is idle
    pub alpha_min: f64,
    /// Fraction of velocity lost per tick
    pub velocity_decay: f64,
    /// Energy target held while a node is being dragged
    pub drag_alpha_target: f64,
    /// Energy restored when the visible set changes
    pub reheat_alpha: f64,
    /// Seed of the jiggle applied to coincident nodes
    pub seed: u64,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            link_distance: 80.0,
            link_strength: None,
            link_iterations: 1,
            charge_strength: -30.0,
            theta: 0.9,
            charge_distance_min: 1.0,
            center_strength: 1.0,
            axis_strength: 0.05,
            collision_strength: 0.7,
            collision_padding: 2.0,
            alpha_decay: 0.03,
            alpha_min: 0.001,
            velocity_decay: 0.4,
            drag_alpha_target: 0.3,
            reheat_alpha: 0.3,
            seed: 0x5EED,
        }
    }
}

impl ForceConfig {
    /// Ticks needed to decay from `alpha` to idle with no target held
    pub fn ticks_to_idle(&self, alpha: f64) -> usize {
        if alpha < self.alpha_min || self.alpha_decay <= 0.0 {
            return 0;
        }
        ((self.alpha_min / alpha).ln() / (1.0 - self.alpha_decay).ln()).ceil() as usize
    }
}

/// Per-node simulation record. Only the engine mutates these.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationNode {
    pub(crate) id: Arc<str>,
    pub(crate) x: f64,
    pub(crate) y: f64,
    pub(crate) vx: f64,
    pub(crate) vy: f64,
    /// Pinned position while dragged
    pub(crate) fx: Option<f64>,
    pub(crate) fy: Option<f64>,
    pub(crate) radius: f64,
}

impl SimulationNode {
    pub(crate) fn new(id: Arc<str>, x: f64, y: f64, radius: f64) -> Self {
        Self {
            id,
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            fx: None,
            fy: None,
            radius,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn is_pinned(&self) -> bool {
        self.fx.is_some() || self.fy.is_some()
    }
}

/// Position of one node as reported to the renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodePosition {
    pub id: Arc<str>,
    pub x: f64,
    pub y: f64,
}
