//! Best-of-N search for a single algorithm.

use crate::canvas::Canvas;
use crate::config::AlgorithmSpec;
use crate::ir::{ConceptGraph, NodeSize};
use std::collections::HashMap;
use tracing::{debug, warn};

use super::engine::{LayoutEngine, LayoutError, LayoutProvider};
use super::evaluator::evaluate;
use super::sides::NodeSideOptimizer;
use super::types::LayoutCandidate;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SearchError {
    #[error("Failed to generate layout using {algorithm} algorithm after {iterations} iterations")]
    Exhausted {
        algorithm: String,
        iterations: usize,
        #[source]
        last_error: Option<LayoutError>,
    },
}

/// Everything one algorithm's search needs besides the collaborators.
#[derive(Debug, Clone, Copy)]
pub struct SearchRequest<'a> {
    pub graph: &'a ConceptGraph,
    pub node_sizes: &'a HashMap<String, NodeSize>,
    pub algorithm: &'a AlgorithmSpec,
    pub iterations: usize,
}

/// Clear, generate, snapshot and score `iterations` times; keep the lowest score.
///
/// Ties keep the earlier candidate. The canvas is left holding the last
/// iteration, not the winner.
pub fn search_best<C: Canvas + ?Sized, P: LayoutProvider + ?Sized>(
    engine: &LayoutEngine,
    canvas: &mut C,
    provider: &mut P,
    sides: &mut NodeSideOptimizer,
    request: SearchRequest<'_>,
) -> Result<LayoutCandidate, SearchError> {
    let algorithm = request.algorithm;
    debug!(
        algorithm = %algorithm.name,
        iterations = request.iterations,
        "layout generation"
    );

    let mut best: Option<LayoutCandidate> = None;
    let mut last_error = None;

    for i in 0..request.iterations {
        canvas.clear();
        if let Err(e) = engine.generate(
            canvas,
            provider,
            sides,
            request.graph,
            request.node_sizes,
            algorithm,
        ) {
            warn!(algorithm = %algorithm.name, iteration = i + 1, error = %e, "iteration failed");
            last_error = Some(e);
            continue;
        }

        let snapshot = canvas.get_data();
        let metrics = evaluate(&snapshot);
        debug!(
            iteration = i + 1,
            nodes = metrics.node_overlaps,
            nodes_edges = metrics.edge_node_overlaps,
            edges = metrics.edge_edge_overlaps,
            weighted_score = metrics.weighted_score,
            "iteration metrics"
        );

        let improved = best
            .as_ref()
            .is_none_or(|b| metrics.weighted_score < b.metrics.weighted_score);
        if improved {
            debug!(score = metrics.weighted_score, "new best result");
            best = Some(LayoutCandidate {
                snapshot,
                metrics,
                algorithm: algorithm.name.clone(),
            });
        }
    }

    best.ok_or_else(|| SearchError::Exhausted {
        algorithm: algorithm.name.clone(),
        iterations: request.iterations,
        last_error,
    })
}
