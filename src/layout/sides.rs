//! Edge side assignment with contention avoidance.
//!
//! Sides are picked from the direction between node centers. A source side
//! that already receives an edge, or a target side that already emits one,
//! is swapped for the free side closest to the travel direction.

use crate::canvas::{CanvasData, CanvasNode, Side};
use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;

/// Per-node record of sides already carrying edges in the current pass.
#[derive(Debug, Default, Clone)]
pub struct NodeSideOptimizer {
    incoming: HashMap<String, HashSet<Side>>,
    outgoing: HashMap<String, HashSet<Side>>,
}

impl NodeSideOptimizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything and start tracking `node_ids` with no used sides.
    pub fn reset<'a>(&mut self, node_ids: impl IntoIterator<Item = &'a str>) {
        self.incoming.clear();
        self.outgoing.clear();
        for id in node_ids {
            self.incoming.insert(id.to_string(), HashSet::new());
            self.outgoing.insert(id.to_string(), HashSet::new());
        }
    }

    /// Reset against the live canvas, replaying the edges it already holds.
    pub fn rebuild(&mut self, data: &CanvasData) {
        self.reset(data.nodes.iter().map(|n| n.id.as_str()));
        for edge in &data.edges {
            self.record_edge(&edge.from_node, &edge.to_node, edge.from_side, edge.to_side);
        }
    }

    /// Unknown node ids are ignored.
    pub fn record_edge(&mut self, from_id: &str, to_id: &str, from_side: Side, to_side: Side) {
        if let Some(sides) = self.outgoing.get_mut(from_id) {
            sides.insert(from_side);
        }
        if let Some(sides) = self.incoming.get_mut(to_id) {
            sides.insert(to_side);
        }
    }

    pub fn incoming_sides(&self, id: &str) -> Option<&HashSet<Side>> {
        self.incoming.get(id)
    }

    pub fn outgoing_sides(&self, id: &str) -> Option<&HashSet<Side>> {
        self.outgoing.get(id)
    }

    /// Pick `(from_side, to_side)` for an edge. Does not record it.
    pub fn choose_sides(&self, from: &CanvasNode, to: &CanvasNode) -> (Side, Side) {
        let (from_x, from_y) = from.center();
        let (to_x, to_y) = to.center();
        let (dx, dy) = (to_x - from_x, to_y - from_y);
        let angle = dy.atan2(dx);

        let (preferred_from, preferred_to) = preferred_sides(dx, dy);

        let from_side = match self.incoming.get(&from.id) {
            Some(used) => avoid_used(preferred_from, used, angle),
            None => preferred_from,
        };
        let to_side = match self.outgoing.get(&to.id) {
            Some(used) => avoid_used(preferred_to, used, angle + PI),
            None => preferred_to,
        };

        (from_side, to_side)
    }
}

/// 90 degree sectors centered on the cardinal directions, y axis down.
///
/// Right is `(-45, 45]`, bottom `(45, 135]`, left `(135, 180] u (-180, -135]`
/// and top `(-135, -45]` degrees. Decided on the deltas rather than the
/// angle so diagonal boundaries land exactly.
fn preferred_sides(dx: f64, dy: f64) -> (Side, Side) {
    if (dx == 0.0 && dy == 0.0) || (-dx < dy && dy <= dx) {
        (Side::Right, Side::Left)
    } else if dy > 0.0 && -dy <= dx && dx < dy {
        (Side::Bottom, Side::Top)
    } else if dy < 0.0 && dy < dx && dx <= -dy {
        (Side::Top, Side::Bottom)
    } else {
        (Side::Left, Side::Right)
    }
}

fn avoid_used(preferred: Side, used: &HashSet<Side>, angle: f64) -> Side {
    if !used.contains(&preferred) {
        return preferred;
    }
    let available: Vec<Side> = Side::ALL
        .iter()
        .copied()
        .filter(|side| !used.contains(side))
        .collect();
    closest_side(angle, &available).unwrap_or(preferred)
}

/// First side with the smallest arc distance to `angle`.
fn closest_side(angle: f64, available: &[Side]) -> Option<Side> {
    let angle = angle.rem_euclid(2.0 * PI);
    let arc = |side: Side| {
        let diff = (angle - side.angle()).abs();
        if diff > PI { 2.0 * PI - diff } else { diff }
    };

    let mut sides = available.iter().copied();
    let first = sides.next()?;
    Some(sides.fold(first, |closest, side| {
        if arc(side) < arc(closest) { side } else { closest }
    }))
}
