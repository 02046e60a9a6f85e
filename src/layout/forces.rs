//! Force kernels of the layout simulation
//!
//! Every kernel adds to node velocities except [`center`], which translates
//! positions. All of them are called once per tick by the engine, in the order
//! link, charge, center, collision, axis.

use super::SimulationNode;
use crate::performance::spatial_acceleration::{jiggle, BarnesHutTree, ChargeParams, CollisionIndex};
use crate::value_objects::Position2D;
use rand::Rng;

/// Spring between two simulation nodes
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Link {
    pub source: usize,
    pub target: usize,
    pub distance: f64,
    pub strength: f64,
    /// Share of the correction applied to the target
    pub bias: f64,
}

/// Pull linked nodes toward their rest distance
pub(crate) fn link(nodes: &mut [SimulationNode], links: &[Link], alpha: f64, iterations: usize, rng: &mut impl Rng) {
    for _ in 0..iterations {
        for link in links {
            let (s, t) = (&nodes[link.source], &nodes[link.target]);
            let mut x = t.x + t.vx - s.x - s.vx;
            let mut y = t.y + t.vy - s.y - s.vy;
            if x == 0.0 {
                x = jiggle(rng);
            }
            if y == 0.0 {
                y = jiggle(rng);
            }

            let l = (x * x + y * y).sqrt();
            let k = (l - link.distance) / l * alpha * link.strength;
            x *= k;
            y *= k;

            let target = &mut nodes[link.target];
            target.vx -= x * link.bias;
            target.vy -= y * link.bias;
            let source = &mut nodes[link.source];
            source.vx += x * (1.0 - link.bias);
            source.vy += y * (1.0 - link.bias);
        }
    }
}

/// Inverse-square repulsion between all nodes, approximated with Barnes-Hut
pub(crate) fn charge(nodes: &mut [SimulationNode], params: &ChargeParams, rng: &mut impl Rng) {
    if nodes.len() < 2 || params.strength == 0.0 {
        return;
    }

    let positions: Vec<(f64, f64)> = nodes.iter().map(|n| (n.x, n.y)).collect();
    let tree = BarnesHutTree::new(&positions);

    for (index, node) in nodes.iter_mut().enumerate() {
        let (dvx, dvy) = tree.velocity_delta(index, node.x, node.y, params, rng);
        node.vx += dvx;
        node.vy += dvy;
    }
}

/// Translate the layout so its mean position moves toward `center`
pub(crate) fn center(nodes: &mut [SimulationNode], center: Position2D, strength: f64) {
    if nodes.is_empty() || strength == 0.0 {
        return;
    }

    let n = nodes.len() as f64;
    let mean_x = nodes.iter().map(|node| node.x).sum::<f64>() / n;
    let mean_y = nodes.iter().map(|node| node.y).sum::<f64>() / n;
    let shift_x = (mean_x - center.x) * strength;
    let shift_y = (mean_y - center.y) * strength;

    for node in nodes {
        node.x -= shift_x;
        node.y -= shift_y;
    }
}

/// Push apart nodes whose collision circles overlap after this tick's motion
pub(crate) fn collide(nodes: &mut [SimulationNode], strength: f64, rng: &mut impl Rng) {
    if nodes.len() < 2 || strength == 0.0 {
        return;
    }

    let predicted: Vec<(f64, f64)> = nodes.iter().map(|n| (n.x + n.vx, n.y + n.vy)).collect();
    let max_radius = nodes.iter().map(|n| n.radius).fold(0.0, f64::max);
    let index = CollisionIndex::new(&predicted);

    for i in 0..nodes.len() {
        let (xi, yi) = predicted[i];
        let ri = nodes[i].radius;

        let mut candidates: Vec<usize> = index
            .neighbors(xi, yi, ri + max_radius)
            .filter(|&j| j > i)
            .collect();
        // R-tree iteration order is not stable; keep the rng stream deterministic
        candidates.sort_unstable();

        for j in candidates {
            let rj = nodes[j].radius;
            let r = ri + rj;
            let (xj, yj) = predicted[j];
            let mut x = xi - xj;
            let mut y = yi - yj;
            let mut l = x * x + y * y;
            if l >= r * r {
                continue;
            }

            if x == 0.0 {
                x = jiggle(rng);
                l += x * x;
            }
            if y == 0.0 {
                y = jiggle(rng);
                l += y * y;
            }

            let distance = l.sqrt();
            let k = (r - distance) / distance * strength;
            x *= k;
            y *= k;

            let ri2 = ri * ri;
            let rj2 = rj * rj;
            let share = rj2 / (ri2 + rj2);

            nodes[i].vx += x * share;
            nodes[i].vy += y * share;
            nodes[j].vx -= x * (1.0 - share);
            nodes[j].vy -= y * (1.0 - share);
        }
    }
}

/// Independent pull toward the centre on each axis
pub(crate) fn axis(nodes: &mut [SimulationNode], center: Position2D, strength: f64, alpha: f64) {
    if strength == 0.0 {
        return;
    }

    for node in nodes {
        node.vx += (center.x - node.x) * strength * alpha;
        node.vy += (center.y - node.y) * strength * alpha;
    }
}
