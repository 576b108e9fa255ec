//! Distance-from-center coloring.

use crate::ir::ConceptGraph;
use std::collections::{HashMap, HashSet, VecDeque};

pub const CENTRAL_NODE_COLOR: &str = "#ff4500";
/// Reachable, but deeper than the palette.
pub const DEEP_NODE_COLOR: &str = "#bada55";
/// Not connected to the central entity at all.
pub const UNREACHABLE_NODE_COLOR: &str = "#95A5A6";

const LEVEL_PALETTE: [&str; 12] = [
    CENTRAL_NODE_COLOR,
    "#00ff00",
    "#00ffff",
    "#ff80ed",
    "#ffa500",
    "#8a2be2",
    "#3498db",
    "#ffd700",
    "#ff5733",
    "#16a085",
    "#800000",
    "#40e0d0",
];

/// Hop distance from the first entity, relationships taken as undirected.
///
/// Entities the central one cannot reach are absent from the result.
pub fn node_levels(graph: &ConceptGraph) -> HashMap<String, usize> {
    let mut levels: HashMap<String, usize> = HashMap::new();
    let Some(central) = graph.central() else {
        return levels;
    };

    let adjacency = graph.undirected_adjacency();
    let mut visited: HashSet<&str> = HashSet::from([central.id.as_str()]);
    let mut queue: VecDeque<(&str, usize)> = VecDeque::from([(central.id.as_str(), 0)]);
    levels.insert(central.id.clone(), 0);

    while let Some((current, level)) = queue.pop_front() {
        for &neighbor in adjacency.get(current).into_iter().flatten() {
            if visited.insert(neighbor) {
                levels.insert(neighbor.to_string(), level + 1);
                queue.push_back((neighbor, level + 1));
            }
        }
    }

    levels
}

pub fn level_color(level: Option<usize>) -> &'static str {
    match level {
        None => UNREACHABLE_NODE_COLOR,
        Some(level) => LEVEL_PALETTE.get(level).copied().unwrap_or(DEEP_NODE_COLOR),
    }
}
