//! Layout quality scoring: overlaps and crossings.

use crate::canvas::{CanvasData, CanvasEdge, CanvasNode};
use std::collections::HashMap;

use super::geometry::{connection_point, segment_intersect, segment_intersects_rect};
use super::types::{Point, QualityMetrics, Rect};

/// Score a realized canvas.
pub fn evaluate(data: &CanvasData) -> QualityMetrics {
    QualityMetrics::new(
        count_node_overlaps(&data.nodes),
        count_edge_node_overlaps(&data.edges, &data.nodes),
        count_edge_edge_overlaps(&data.edges, &data.nodes),
    )
}

/// Unordered node pairs whose rectangles are not separated on either axis.
///
/// Rectangles that merely touch count as overlapping.
pub fn count_node_overlaps(nodes: &[CanvasNode]) -> usize {
    let mut count = 0;
    for (i, a) in nodes.iter().enumerate() {
        for b in &nodes[i + 1..] {
            let separated = a.x + a.width < b.x
                || a.x > b.x + b.width
                || a.y + a.height < b.y
                || a.y > b.y + b.height;
            if !separated {
                count += 1;
            }
        }
    }
    count
}

/// Edge segments crossing nodes other than their own endpoints.
pub fn count_edge_node_overlaps(edges: &[CanvasEdge], nodes: &[CanvasNode]) -> usize {
    let lookup = node_lookup(nodes);
    let mut count = 0;

    for edge in edges {
        let Some((start, end)) = edge_segment(edge, &lookup) else {
            continue;
        };
        count += nodes
            .iter()
            .filter(|n| n.id != edge.from_node && n.id != edge.to_node)
            .filter(|n| segment_intersects_rect(start, end, &Rect::from(*n)))
            .count();
    }

    count
}

/// Crossing edge pairs.
///
/// Pairs that leave or enter through the same side of the same node are
/// skipped; that is a shared attachment point, not a crossing. The check
/// compares node and side only, never resolved coordinates.
pub fn count_edge_edge_overlaps(edges: &[CanvasEdge], nodes: &[CanvasNode]) -> usize {
    let lookup = node_lookup(nodes);
    let mut count = 0;

    for (i, a) in edges.iter().enumerate() {
        let Some((a_start, a_end)) = edge_segment(a, &lookup) else {
            continue;
        };
        for b in &edges[i + 1..] {
            if shares_attachment(a, b) {
                continue;
            }
            let Some((b_start, b_end)) = edge_segment(b, &lookup) else {
                continue;
            };
            if segment_intersect(a_start, a_end, b_start, b_end) {
                count += 1;
            }
        }
    }

    count
}

fn shares_attachment(a: &CanvasEdge, b: &CanvasEdge) -> bool {
    (a.from_node == b.from_node && a.from_side == b.from_side)
        || (a.to_node == b.to_node && a.to_side == b.to_side)
        || (a.from_node == b.to_node && a.from_side == b.to_side)
        || (a.to_node == b.from_node && a.to_side == b.from_side)
}

fn node_lookup(nodes: &[CanvasNode]) -> HashMap<&str, &CanvasNode> {
    nodes.iter().map(|n| (n.id.as_str(), n)).collect()
}

fn edge_segment(edge: &CanvasEdge, lookup: &HashMap<&str, &CanvasNode>) -> Option<(Point, Point)> {
    let from = lookup.get(edge.from_node.as_str())?;
    let to = lookup.get(edge.to_node.as_str())?;
    Some((
        connection_point(&Rect::from(*from), edge.from_side),
        connection_point(&Rect::from(*to), edge.to_side),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Side;
    use serde_json::Map;

    fn node(id: &str, x: f64, y: f64, width: f64, height: f64) -> CanvasNode {
        CanvasNode {
            id: id.to_string(),
            kind: "text".to_string(),
            text: id.to_string(),
            x,
            y,
            width,
            height,
            color: None,
            explanation: None,
            extra: Map::new(),
        }
    }

    fn edge(from: &str, from_side: Side, to: &str, to_side: Side) -> CanvasEdge {
        CanvasEdge {
            id: format!("{}-{}", from, to),
            from_node: from.to_string(),
            from_side,
            to_node: to.to_string(),
            to_side,
            label: None,
            color: None,
            explanation: None,
            extra: Map::new(),
        }
    }

    #[test]
    fn test_overlapping_rectangles() {
        let nodes = vec![node("a", 0.0, 0.0, 10.0, 10.0), node("b", 5.0, 5.0, 10.0, 10.0)];
        assert_eq!(count_node_overlaps(&nodes), 1);
    }

    #[test]
    fn test_separated_rectangles() {
        let nodes = vec![node("a", 0.0, 0.0, 10.0, 10.0), node("b", 20.0, 20.0, 10.0, 10.0)];
        assert_eq!(count_node_overlaps(&nodes), 0);
    }

    #[test]
    fn test_touching_rectangles_overlap() {
        let nodes = vec![node("a", 0.0, 0.0, 10.0, 10.0), node("b", 10.0, 0.0, 10.0, 10.0)];
        assert_eq!(count_node_overlaps(&nodes), 1);
    }

    #[test]
    fn test_node_overlaps_order_independent() {
        let mut nodes = vec![
            node("a", 0.0, 0.0, 10.0, 10.0),
            node("b", 5.0, 5.0, 10.0, 10.0),
            node("c", 100.0, 0.0, 10.0, 10.0),
            node("d", 8.0, 0.0, 10.0, 10.0),
        ];
        let forward = count_node_overlaps(&nodes);
        nodes.reverse();
        assert_eq!(count_node_overlaps(&nodes), forward);
        assert_eq!(forward, 3);
    }

    #[test]
    fn test_edge_through_third_node() {
        let nodes = vec![
            node("a", 0.0, 0.0, 100.0, 50.0),
            node("b", 400.0, 0.0, 100.0, 50.0),
            node("blocker", 200.0, 0.0, 100.0, 50.0),
        ];
        let edges = vec![edge("a", Side::Right, "b", Side::Left)];
        assert_eq!(count_edge_node_overlaps(&edges, &nodes), 1);
    }

    #[test]
    fn test_edge_endpoints_not_counted() {
        let nodes = vec![node("a", 0.0, 0.0, 100.0, 50.0), node("b", 400.0, 0.0, 100.0, 50.0)];
        let edges = vec![edge("a", Side::Right, "b", Side::Left)];
        assert_eq!(count_edge_node_overlaps(&edges, &nodes), 0);
    }

    #[test]
    fn test_crossing_edges() {
        // a  b
        // c  d   with a->d and b->c crossing in the middle
        let nodes = vec![
            node("a", 0.0, 0.0, 100.0, 50.0),
            node("b", 400.0, 0.0, 100.0, 50.0),
            node("c", 0.0, 400.0, 100.0, 50.0),
            node("d", 400.0, 400.0, 100.0, 50.0),
        ];
        let edges = vec![
            edge("a", Side::Bottom, "d", Side::Top),
            edge("b", Side::Bottom, "c", Side::Top),
        ];
        assert_eq!(count_edge_edge_overlaps(&edges, &nodes), 1);
    }

    #[test]
    fn test_shared_attachment_is_not_a_crossing() {
        let nodes = vec![
            node("a", 0.0, 0.0, 100.0, 50.0),
            node("b", 400.0, 0.0, 100.0, 50.0),
            node("c", 400.0, 200.0, 100.0, 50.0),
        ];
        let edges = vec![
            edge("a", Side::Right, "b", Side::Left),
            edge("a", Side::Right, "c", Side::Left),
        ];
        assert_eq!(count_edge_edge_overlaps(&edges, &nodes), 0);
    }

    #[test]
    fn test_chained_edges_through_same_side_skipped() {
        let nodes = vec![
            node("a", 0.0, 0.0, 100.0, 50.0),
            node("b", 400.0, 0.0, 100.0, 50.0),
            node("c", 800.0, 0.0, 100.0, 50.0),
        ];
        // b receives on its left and emits from its left again
        let edges = vec![
            edge("a", Side::Right, "b", Side::Left),
            edge("b", Side::Left, "c", Side::Left),
        ];
        assert_eq!(count_edge_edge_overlaps(&edges, &nodes), 0);
    }

    #[test]
    fn test_same_point_different_nodes_still_counted() {
        // b's left midpoint and c's right midpoint coincide
        let nodes = vec![
            node("a", 0.0, 0.0, 100.0, 50.0),
            node("b", 400.0, 0.0, 100.0, 50.0),
            node("c", 300.0, 0.0, 100.0, 50.0),
            node("d", 400.0, 300.0, 100.0, 50.0),
        ];
        let edges = vec![
            edge("a", Side::Right, "b", Side::Left),
            edge("c", Side::Right, "d", Side::Top),
        ];
        assert_eq!(count_edge_edge_overlaps(&edges, &nodes), 1);
    }

    #[test]
    fn test_edges_with_missing_nodes_skipped() {
        let nodes = vec![node("a", 0.0, 0.0, 100.0, 50.0)];
        let edges = vec![edge("a", Side::Right, "ghost", Side::Left)];
        assert_eq!(count_edge_node_overlaps(&edges, &nodes), 0);
        assert_eq!(count_edge_edge_overlaps(&edges, &nodes), 0);
    }

    #[test]
    fn test_evaluate_weights() {
        let nodes = vec![
            node("a", 0.0, 0.0, 100.0, 50.0),
            node("b", 50.0, 0.0, 100.0, 50.0),
        ];
        let metrics = evaluate(&CanvasData {
            nodes,
            edges: vec![],
        });
        assert_eq!(metrics.node_overlaps, 1);
        assert_eq!(metrics.weighted_score, 10);
    }

    #[test]
    fn test_score_formula() {
        let metrics = QualityMetrics::new(2, 3, 4);
        assert_eq!(metrics.weighted_score, 20 + 9 + 4);
        assert_eq!(QualityMetrics::new(0, 0, 0).weighted_score, 0);
    }
}
