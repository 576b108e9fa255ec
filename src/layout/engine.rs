//! One generation pass: raw positions in, nodes and edges on the canvas out.

use crate::canvas::{Canvas, EdgeRequest, NodeRequest};
use crate::config::{AlgorithmSpec, LayoutConfig, Settings};
use crate::ir::{ConceptGraph, NodeSize, Position};
use crate::measure::wrap_label;
use std::collections::HashMap;
use tracing::{debug, error, warn};

use super::colorizer::{level_color, node_levels};
use super::sides::NodeSideOptimizer;
use super::types::Point;

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum ProviderError {
    #[error("Unknown layout algorithm: {0}")]
    UnknownAlgorithm(String),
    #[error("Invalid parameter {name} for {algorithm}")]
    InvalidParameter { algorithm: String, name: String },
    #[error("{algorithm} layout failed: {reason}")]
    Failed { algorithm: String, reason: String },
}

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum LayoutError {
    #[error("Layout capability failed for {algorithm}")]
    Provider {
        algorithm: String,
        #[source]
        source: ProviderError,
    },
    #[error("{0} returned no node positions")]
    EmptyLayout(String),
    #[error("{algorithm} returned a non-finite position for {entity}")]
    NonFinitePosition { algorithm: String, entity: String },
    #[error("No node could be placed on the canvas for {0}")]
    NothingPlaced(String),
}

/// The external force-directed layout capability.
///
/// Returns one center position per entity id. The engine never looks at
/// the algorithm parameters itself.
pub trait LayoutProvider {
    fn compute_layout(
        &mut self,
        graph: &ConceptGraph,
        algorithm: &AlgorithmSpec,
    ) -> Result<HashMap<String, Point>, ProviderError>;
}

impl<F> LayoutProvider for F
where
    F: FnMut(&ConceptGraph, &AlgorithmSpec) -> Result<HashMap<String, Point>, ProviderError>,
{
    fn compute_layout(
        &mut self,
        graph: &ConceptGraph,
        algorithm: &AlgorithmSpec,
    ) -> Result<HashMap<String, Point>, ProviderError> {
        self(graph, algorithm)
    }
}

/// What one pass managed to put on the canvas.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationReport {
    /// Entity id -> canvas node id.
    pub nodes: HashMap<String, String>,
    pub edges_created: usize,
    pub edges_skipped: usize,
}

/// Layout generator configuration and computation.
pub struct LayoutEngine {
    pub(crate) config: LayoutConfig,
    pub(crate) colored_nodes: bool,
    pub(crate) colored_edges: bool,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(LayoutConfig::default(), &Settings::default())
    }
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig, settings: &Settings) -> Self {
        Self {
            config,
            colored_nodes: settings.colored_nodes,
            colored_edges: settings.colored_edges,
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Draw `graph` onto `canvas` using `algorithm`.
    ///
    /// Node and edge creation failures are logged and skipped. The pass fails
    /// when the layout capability fails, returns nothing usable, or not a
    /// single node ends up on the canvas.
    pub fn generate<C: Canvas + ?Sized, P: LayoutProvider + ?Sized>(
        &self,
        canvas: &mut C,
        provider: &mut P,
        sides: &mut NodeSideOptimizer,
        graph: &ConceptGraph,
        node_sizes: &HashMap<String, NodeSize>,
        algorithm: &AlgorithmSpec,
    ) -> Result<GenerationReport, LayoutError> {
        let default_size = canvas.default_node_size();

        // Phase 1: Raw positions from the layout capability
        let raw = provider
            .compute_layout(graph, algorithm)
            .map_err(|source| LayoutError::Provider {
                algorithm: algorithm.name.clone(),
                source,
            })?;
        if raw.is_empty() && !graph.entities.is_empty() {
            error!(algorithm = %algorithm.name, "layout capability returned no node positions");
            return Err(LayoutError::EmptyLayout(algorithm.name.clone()));
        }
        let non_finite = raw.iter().find(|(_, p)| !(p.x.is_finite() && p.y.is_finite()));
        if let Some((id, _)) = non_finite {
            error!(
                algorithm = %algorithm.name,
                node = %id,
                "layout capability returned a non-finite position"
            );
            return Err(LayoutError::NonFinitePosition {
                algorithm: algorithm.name.clone(),
                entity: id.clone(),
            });
        }

        // Phase 2: Center, convert to top-left, stretch and snap
        let positions = self.normalize_positions(&raw, node_sizes, default_size);

        // Phase 3: Nodes
        let levels = node_levels(graph);
        let mut report = GenerationReport::default();
        for entity in &graph.entities {
            let Some(&position) = positions.get(&entity.id) else {
                error!(entity = %entity.name, "no position found, node will not be created");
                continue;
            };
            let size = match node_sizes.get(&entity.id) {
                Some(size) => *size,
                None => {
                    warn!(entity = %entity.name, "no size found, using default node size");
                    default_size
                }
            };

            let request = NodeRequest {
                text: &entity.name,
                position,
                size,
            };
            let node_id = match canvas.create_text_node(request) {
                Ok(id) => id,
                Err(e) => {
                    error!(entity = %entity.name, error = %e, "failed to create node");
                    continue;
                }
            };

            if let Err(e) = canvas.attach_node_explanation(&node_id, &entity.explanation) {
                warn!(entity = %entity.name, error = %e, "failed to attach explanation");
            }
            if self.colored_nodes {
                let color = level_color(levels.get(&entity.id).copied());
                if let Err(e) = canvas.set_node_color(&node_id, color) {
                    warn!(entity = %entity.name, error = %e, "failed to color node");
                }
            }
            report.nodes.insert(entity.id.clone(), node_id);
        }
        if report.nodes.is_empty() && !graph.entities.is_empty() {
            error!(algorithm = %algorithm.name, "no node could be created");
            return Err(LayoutError::NothingPlaced(algorithm.name.clone()));
        }

        // Phase 4: Edges
        let snapshot = canvas.get_data();
        sides.rebuild(&snapshot);
        for rel in &graph.relationships {
            let endpoints = report
                .nodes
                .get(&rel.source_id)
                .zip(report.nodes.get(&rel.target_id));
            let Some((from_id, to_id)) = endpoints else {
                error!(
                    source_id = %rel.source_id,
                    target_id = %rel.target_id,
                    "could not find nodes for relationship"
                );
                report.edges_skipped += 1;
                continue;
            };
            let Some((from_node, to_node)) = snapshot.node(from_id).zip(snapshot.node(to_id)) else {
                error!(from = %from_id, to = %to_id, "cannot create edge, node not found");
                report.edges_skipped += 1;
                continue;
            };

            let (from_side, to_side) = sides.choose_sides(from_node, to_node);
            sides.record_edge(from_id, to_id, from_side, to_side);

            let label = (!rel.label.is_empty())
                .then(|| wrap_label(&rel.label, self.config.label_wrap_width));
            let explanation = (!rel.explanation.is_empty()).then(|| rel.explanation.clone());
            let request = EdgeRequest {
                from_node: from_id.clone(),
                from_side,
                to_node: to_id.clone(),
                to_side,
                label,
                color: self.colored_edges.then(|| self.config.edge_color.clone()),
                explanation,
            };
            match canvas.create_edge(request) {
                Ok(_) => report.edges_created += 1,
                Err(e) => {
                    error!(
                        source_id = %rel.source_id,
                        target_id = %rel.target_id,
                        error = %e,
                        "failed to create edge"
                    );
                    report.edges_skipped += 1;
                }
            }
        }

        debug!(
            algorithm = %algorithm.name,
            nodes = report.nodes.len(),
            edges = report.edges_created,
            skipped = report.edges_skipped,
            "generation pass finished"
        );
        Ok(report)
    }

    /// Turn raw center positions into grid-aligned top-left positions around the origin.
    pub fn normalize_positions(
        &self,
        raw: &HashMap<String, Point>,
        node_sizes: &HashMap<String, NodeSize>,
        default_size: NodeSize,
    ) -> HashMap<String, Position> {
        let Some(center) = bounding_box_center(raw.values()) else {
            return HashMap::new();
        };

        raw.iter()
            .map(|(id, point)| {
                let size = node_sizes.get(id).copied().unwrap_or_else(|| {
                    warn!(node = %id, "no size found, using default size for top-left conversion");
                    default_size
                });
                let centered_x = point.x - center.x;
                let centered_y = point.y - center.y;
                let x = (centered_x - size.width / 2.0) * self.config.horizontal_stretch;
                let y = centered_y - size.height / 2.0;
                let position = Position {
                    x: snap(x, self.config.grid_spacing),
                    y: snap(y, self.config.grid_spacing),
                };
                (id.clone(), position)
            })
            .collect()
    }
}

fn bounding_box_center<'a>(points: impl Iterator<Item = &'a Point>) -> Option<Point> {
    let mut bounds: Option<(f64, f64, f64, f64)> = None;
    for p in points {
        bounds = Some(match bounds {
            None => (p.x, p.y, p.x, p.y),
            Some((min_x, min_y, max_x, max_y)) => {
                (min_x.min(p.x), min_y.min(p.y), max_x.max(p.x), max_y.max(p.y))
            }
        });
    }
    bounds.map(|(min_x, min_y, max_x, max_y)| {
        Point::new((min_x + max_x) / 2.0, (min_y + max_y) / 2.0)
    })
}

/// Nearest grid multiple, halves rounding toward positive infinity.
fn snap(value: f64, spacing: f64) -> f64 {
    if spacing <= 0.0 {
        return value;
    }
    (value / spacing + 0.5).floor() * spacing
}
