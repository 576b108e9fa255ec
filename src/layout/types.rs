//! Data structures shared by the layout phases.

use crate::canvas::{CanvasData, CanvasNode};

/// A point in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle, `(x, y)` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

impl From<&CanvasNode> for Rect {
    fn from(node: &CanvasNode) -> Self {
        Rect::new(node.x, node.y, node.width, node.height)
    }
}

/// Geometric quality of one realized layout. Lower `weighted_score` is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityMetrics {
    pub node_overlaps: usize,
    pub edge_node_overlaps: usize,
    pub edge_edge_overlaps: usize,
    pub weighted_score: usize,
}

impl QualityMetrics {
    pub const NODE_OVERLAP_WEIGHT: usize = 10;
    pub const EDGE_NODE_OVERLAP_WEIGHT: usize = 3;
    pub const EDGE_EDGE_OVERLAP_WEIGHT: usize = 1;

    pub fn new(node_overlaps: usize, edge_node_overlaps: usize, edge_edge_overlaps: usize) -> Self {
        Self {
            node_overlaps,
            edge_node_overlaps,
            edge_edge_overlaps,
            weighted_score: score(node_overlaps, edge_node_overlaps, edge_edge_overlaps),
        }
    }
}

pub fn score(node_overlaps: usize, edge_node_overlaps: usize, edge_edge_overlaps: usize) -> usize {
    node_overlaps * QualityMetrics::NODE_OVERLAP_WEIGHT
        + edge_node_overlaps * QualityMetrics::EDGE_NODE_OVERLAP_WEIGHT
        + edge_edge_overlaps * QualityMetrics::EDGE_EDGE_OVERLAP_WEIGHT
}

/// Best realized layout found for one algorithm.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutCandidate {
    pub snapshot: CanvasData,
    pub metrics: QualityMetrics,
    pub algorithm: String,
}
