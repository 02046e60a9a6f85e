//! Spatial acceleration structures for the force simulation
//!
//! A Barnes-Hut quadtree brings repulsion from O(n²) down to O(n log n) and an
//! R-tree answers the "who could overlap me" query of the collision force.

use rand::Rng;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// Deepest subdivision before nearly coincident bodies share a bucket
const MAX_DEPTH: usize = 32;

/// Random nudge applied to exactly coincident bodies so they can separate
pub(crate) fn jiggle(rng: &mut impl Rng) -> f64 {
    (rng.gen::<f64>() - 0.5) * 1e-6
}

/// Axis-aligned square region of the plane
#[derive(Debug, Clone, Copy)]
struct Bounds2D {
    x0: f64,
    y0: f64,
    size: f64,
}

impl Bounds2D {
    fn quadrant(&self, x: f64, y: f64) -> usize {
        let half = self.size / 2.0;
        let mut quadrant = 0;
        if x >= self.x0 + half {
            quadrant |= 1;
        }
        if y >= self.y0 + half {
            quadrant |= 2;
        }
        quadrant
    }

    fn child(&self, quadrant: usize) -> Bounds2D {
        let half = self.size / 2.0;
        Bounds2D {
            x0: if quadrant & 1 == 0 { self.x0 } else { self.x0 + half },
            y0: if quadrant & 2 == 0 { self.y0 } else { self.y0 + half },
            size: half,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Body {
    index: usize,
    x: f64,
    y: f64,
}

/// Node of the quadtree
enum QuadNode {
    Empty,
    /// One body, or several that could not be separated
    Leaf(Vec<Body>),
    Internal {
        center_x: f64,
        center_y: f64,
        mass: f64,
        children: Box<[QuadNode; 4]>,
    },
}

impl QuadNode {
    fn empty_children() -> Box<[QuadNode; 4]> {
        Box::new([QuadNode::Empty, QuadNode::Empty, QuadNode::Empty, QuadNode::Empty])
    }

    fn insert(&mut self, bounds: Bounds2D, body: Body, depth: usize) {
        match self {
            QuadNode::Empty => *self = QuadNode::Leaf(vec![body]),
            QuadNode::Leaf(bodies) => {
                let coincident = bodies.iter().all(|b| b.x == body.x && b.y == body.y);
                if coincident || depth >= MAX_DEPTH {
                    bodies.push(body);
                    return;
                }

                let existing = std::mem::take(bodies);
                *self = QuadNode::Internal {
                    center_x: 0.0,
                    center_y: 0.0,
                    mass: 0.0,
                    children: Self::empty_children(),
                };
                for old in existing {
                    self.insert(bounds, old, depth);
                }
                self.insert(bounds, body, depth);
            }
            QuadNode::Internal { children, .. } => {
                let quadrant = bounds.quadrant(body.x, body.y);
                children[quadrant].insert(bounds.child(quadrant), body, depth + 1);
            }
        }
    }

    /// Accumulate centres of mass bottom-up, returning (x, y, mass)
    fn accumulate(&mut self) -> (f64, f64, f64) {
        match self {
            QuadNode::Empty => (0.0, 0.0, 0.0),
            QuadNode::Leaf(bodies) => {
                let mass = bodies.len() as f64;
                let x = bodies.iter().map(|b| b.x).sum::<f64>() / mass;
                let y = bodies.iter().map(|b| b.y).sum::<f64>() / mass;
                (x, y, mass)
            }
            QuadNode::Internal {
                center_x,
                center_y,
                mass,
                children,
            } => {
                let (mut sx, mut sy, mut total) = (0.0, 0.0, 0.0);
                for child in children.iter_mut() {
                    let (cx, cy, m) = child.accumulate();
                    sx += cx * m;
                    sy += cy * m;
                    total += m;
                }
                if total > 0.0 {
                    *center_x = sx / total;
                    *center_y = sy / total;
                }
                *mass = total;
                (*center_x, *center_y, total)
            }
        }
    }
}

/// Parameters of one many-body evaluation
#[derive(Debug, Clone, Copy)]
pub struct ChargeParams {
    /// Per-body strength; negative repels
    pub strength: f64,
    /// Barnes-Hut accuracy; larger is coarser
    pub theta: f64,
    /// Distances below this are softened to avoid explosive forces
    pub distance_min: f64,
    pub alpha: f64,
}

/// Barnes-Hut quadtree over the current node positions
pub struct BarnesHutTree {
    root: QuadNode,
    bounds: Bounds2D,
}

impl BarnesHutTree {
    /// Build a tree over `positions`; indices into the slice identify bodies
    pub fn new(positions: &[(f64, f64)]) -> Self {
        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for &(x, y) in positions {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }

        if !(min_x.is_finite() && min_y.is_finite() && max_x.is_finite() && max_y.is_finite()) {
            return Self {
                root: QuadNode::Empty,
                bounds: Bounds2D { x0: 0.0, y0: 0.0, size: 1.0 },
            };
        }

        // Square cover, padded so bodies on the far edge stay inside
        let size = (max_x - min_x).max(max_y - min_y).max(1.0) * 1.01;
        let bounds = Bounds2D {
            x0: min_x - size * 0.005,
            y0: min_y - size * 0.005,
            size,
        };

        let mut root = QuadNode::Empty;
        for (index, &(x, y)) in positions.iter().enumerate() {
            root.insert(bounds, Body { index, x, y }, 0);
        }
        root.accumulate();

        Self { root, bounds }
    }

    /// Velocity change for body `index` at `(x, y)` from every other body
    pub fn velocity_delta(
        &self,
        index: usize,
        x: f64,
        y: f64,
        params: &ChargeParams,
        rng: &mut impl Rng,
    ) -> (f64, f64) {
        let theta2 = params.theta * params.theta;
        let min2 = params.distance_min * params.distance_min;
        let mut delta = (0.0, 0.0);
        Self::visit(&self.root, self.bounds, index, x, y, params, theta2, min2, rng, &mut delta);
        delta
    }

    #[allow(clippy::too_many_arguments)]
    fn visit(
        node: &QuadNode,
        bounds: Bounds2D,
        index: usize,
        x: f64,
        y: f64,
        params: &ChargeParams,
        theta2: f64,
        min2: f64,
        rng: &mut impl Rng,
        delta: &mut (f64, f64),
    ) {
        let mut apply = |mut dx: f64, mut dy: f64, mass: f64, rng: &mut _| {
            if dx == 0.0 {
                dx = jiggle(rng);
            }
            if dy == 0.0 {
                dy = jiggle(rng);
            }
            let mut l = dx * dx + dy * dy;
            if l < min2 {
                l = (min2 * l).sqrt();
            }
            let w = params.strength * mass * params.alpha / l;
            delta.0 += dx * w;
            delta.1 += dy * w;
        };

        match node {
            QuadNode::Empty => {}
            QuadNode::Leaf(bodies) => {
                for body in bodies.iter().filter(|b| b.index != index) {
                    apply(body.x - x, body.y - y, 1.0, rng);
                }
            }
            QuadNode::Internal {
                center_x,
                center_y,
                mass,
                children,
            } => {
                let dx = center_x - x;
                let dy = center_y - y;
                let l = dx * dx + dy * dy;

                // Far enough away: treat the whole cell as one body
                if bounds.size * bounds.size / theta2 < l {
                    apply(dx, dy, *mass, rng);
                    return;
                }

                for (quadrant, child) in children.iter().enumerate() {
                    Self::visit(child, bounds.child(quadrant), index, x, y, params, theta2, min2, rng, delta);
                }
            }
        }
    }
}

/// Collision candidate stored in the R-tree
#[derive(Debug, Clone)]
struct CollisionBody {
    index: usize,
    position: [f64; 2],
}

impl RTreeObject for CollisionBody {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for CollisionBody {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.position[0] - point[0];
        let dy = self.position[1] - point[1];
        dx * dx + dy * dy
    }
}

/// Neighbour index for the collision force
pub struct CollisionIndex {
    tree: RTree<CollisionBody>,
}

impl CollisionIndex {
    /// Bulk-load the index from predicted positions
    pub fn new(positions: &[(f64, f64)]) -> Self {
        let bodies = positions
            .iter()
            .enumerate()
            .filter(|(_, (x, y))| x.is_finite() && y.is_finite())
            .map(|(index, &(x, y))| CollisionBody {
                index,
                position: [x, y],
            })
            .collect();
        Self {
            tree: RTree::bulk_load(bodies),
        }
    }

    /// Indices of bodies within `radius` of `(x, y)`
    pub fn neighbors(&self, x: f64, y: f64, radius: f64) -> impl Iterator<Item = usize> + '_ {
        self.tree
            .locate_within_distance([x, y], radius * radius)
            .map(|body| body.index)
    }
}
