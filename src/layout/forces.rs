//! Built-in layout capability.
//!
//! Answers the same algorithm names the engine's registry uses: `cola` and
//! `cose-bilkent` run a spring-electrical simulation (Fruchterman-Reingold),
//! `dagre` places entities in ranks by hop distance from the central one.
//! All positions are node centers.

use crate::config::AlgorithmSpec;
use crate::ir::ConceptGraph;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::Value;
use std::collections::HashMap;
use std::f64::consts::PI;

use super::colorizer::node_levels;
use super::engine::{LayoutProvider, ProviderError};
use super::types::Point;

const MAX_SPRING_ITERATIONS: usize = 500;
const MIN_DISTANCE: f64 = 0.01;

/// Seeded force-directed and layered placement.
pub struct ForceLayout {
    rng: ChaCha8Rng,
}

impl ForceLayout {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl LayoutProvider for ForceLayout {
    fn compute_layout(
        &mut self,
        graph: &ConceptGraph,
        algorithm: &AlgorithmSpec,
    ) -> Result<HashMap<String, Point>, ProviderError> {
        match algorithm.name.as_str() {
            "cola" | "cose-bilkent" => self.spring(graph, algorithm),
            "dagre" => layered(graph, algorithm),
            other => Err(ProviderError::UnknownAlgorithm(other.to_string())),
        }
    }
}

impl ForceLayout {
    fn spring(
        &mut self,
        graph: &ConceptGraph,
        algorithm: &AlgorithmSpec,
    ) -> Result<HashMap<String, Point>, ProviderError> {
        let params = &algorithm.params;
        let edge_length =
            number_param(algorithm, &["edgeLength", "idealEdgeLength"])?.unwrap_or(100.0);
        let spacing = number_param(algorithm, &["nodeSpacing"])?.unwrap_or(0.0);
        let iterations = number_param(algorithm, &["unconstrIter", "numIter"])?
            .map(|n| n.max(1.0) as usize)
            .unwrap_or(300)
            .min(MAX_SPRING_ITERATIONS);
        let cooling = number_param(algorithm, &["coolingFactor"])?.unwrap_or(0.95);
        let randomize = match params.get("randomize") {
            None => true,
            Some(Value::Bool(b)) => *b,
            Some(_) => {
                return Err(ProviderError::InvalidParameter {
                    algorithm: algorithm.name.clone(),
                    name: "randomize".to_string(),
                });
            }
        };

        let n = graph.entities.len();
        if n == 0 {
            return Ok(HashMap::new());
        }

        let k = (edge_length + spacing).max(1.0);
        let extent = k * (n as f64).sqrt();
        // k * k is the repulsion numerator
        if !(k * k).is_finite() || !extent.is_finite() {
            let name = if (edge_length * edge_length).is_finite() {
                "nodeSpacing"
            } else {
                present_key(algorithm, &["edgeLength", "idealEdgeLength"])
            };
            return Err(ProviderError::InvalidParameter {
                algorithm: algorithm.name.clone(),
                name: name.to_string(),
            });
        }
        let index: HashMap<&str, usize> = graph
            .entities
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id.as_str(), i))
            .collect();
        let links: Vec<(usize, usize)> = graph
            .relationships
            .iter()
            .filter_map(|r| {
                let source = *index.get(r.source_id.as_str())?;
                let target = *index.get(r.target_id.as_str())?;
                Some((source, target))
            })
            .filter(|(a, b)| a != b)
            .collect();

        let mut positions: Vec<Point> = if randomize {
            (0..n)
                .map(|_| {
                    let x = self.rng.gen_range(0.0..extent);
                    let y = self.rng.gen_range(0.0..extent);
                    Point::new(x, y)
                })
                .collect()
        } else {
            let radius = (k * n as f64 / (2.0 * PI)).max(k);
            (0..n)
                .map(|i| {
                    let angle = 2.0 * PI * i as f64 / n as f64;
                    Point::new(radius * angle.cos(), radius * angle.sin())
                })
                .collect()
        };

        let mut temperature = extent / 4.0;
        for _ in 0..iterations {
            let mut forces = vec![(0.0_f64, 0.0_f64); n];

            for i in 0..n {
                for j in (i + 1)..n {
                    let dx = positions[j].x - positions[i].x;
                    let dy = positions[j].y - positions[i].y;
                    let dist = (dx * dx + dy * dy).sqrt().max(MIN_DISTANCE);
                    let repulsion = k * k / dist;
                    let (fx, fy) = (dx / dist * repulsion, dy / dist * repulsion);
                    forces[i].0 -= fx;
                    forces[i].1 -= fy;
                    forces[j].0 += fx;
                    forces[j].1 += fy;
                }
            }

            for &(i, j) in &links {
                let dx = positions[j].x - positions[i].x;
                let dy = positions[j].y - positions[i].y;
                let dist = (dx * dx + dy * dy).sqrt().max(MIN_DISTANCE);
                let attraction = dist * dist / k;
                let (fx, fy) = (dx / dist * attraction, dy / dist * attraction);
                forces[i].0 += fx;
                forces[i].1 += fy;
                forces[j].0 -= fx;
                forces[j].1 -= fy;
            }

            for (pos, (fx, fy)) in positions.iter_mut().zip(&forces) {
                let magnitude = (fx * fx + fy * fy).sqrt().max(MIN_DISTANCE);
                let displacement = magnitude.min(temperature);
                pos.x += fx / magnitude * displacement;
                pos.y += fy / magnitude * displacement;
            }

            temperature = (temperature * cooling).max(1.0);
        }

        Ok(graph
            .entities
            .iter()
            .zip(positions)
            .map(|(e, p)| (e.id.clone(), p))
            .collect())
    }
}

/// Ranks by hop distance from the central entity; unreachable entities share
/// one trailing rank.
fn layered(
    graph: &ConceptGraph,
    algorithm: &AlgorithmSpec,
) -> Result<HashMap<String, Point>, ProviderError> {
    let spacing_factor = number_param(algorithm, &["spacingFactor"])?.unwrap_or(1.0);
    let node_sep = number_param(algorithm, &["nodeSep"])?.unwrap_or(50.0) * spacing_factor;
    let rank_sep = number_param(algorithm, &["rankSep"])?.unwrap_or(50.0) * spacing_factor;
    let left_to_right = match algorithm.params.get("rankDir").and_then(Value::as_str) {
        None | Some("LR") | Some("RL") => true,
        Some("TB") | Some("BT") => false,
        Some(_) => {
            return Err(ProviderError::InvalidParameter {
                algorithm: algorithm.name.clone(),
                name: "rankDir".to_string(),
            });
        }
    };

    let levels = node_levels(graph);
    let trailing = levels.values().copied().max().map_or(0, |m| m + 1);
    let mut ranks: Vec<Vec<&str>> = vec![Vec::new(); trailing + 1];
    for entity in &graph.entities {
        let rank = levels.get(&entity.id).copied().unwrap_or(trailing);
        ranks[rank].push(entity.id.as_str());
    }

    let mut positions = HashMap::new();
    for (rank, members) in ranks.iter().enumerate() {
        let offset = (members.len() as f64 - 1.0) / 2.0;
        for (order, id) in members.iter().enumerate() {
            let along = rank as f64 * rank_sep;
            let across = (order as f64 - offset) * node_sep;
            let point = if left_to_right {
                Point::new(along, across)
            } else {
                Point::new(across, along)
            };
            positions.insert(id.to_string(), point);
        }
    }
    Ok(positions)
}

/// First of `keys` present in the parameters, or the first key.
fn present_key<'k>(algorithm: &AlgorithmSpec, keys: &[&'k str]) -> &'k str {
    keys.iter()
        .copied()
        .find(|key| algorithm.params.get(*key).is_some())
        .unwrap_or(keys[0])
}

/// First of `keys` present in the parameters, if any.
fn number_param(algorithm: &AlgorithmSpec, keys: &[&str]) -> Result<Option<f64>, ProviderError> {
    for key in keys {
        if let Some(value) = algorithm.params.get(*key) {
            return value
                .as_f64()
                .map(Some)
                .ok_or_else(|| ProviderError::InvalidParameter {
                    algorithm: algorithm.name.clone(),
                    name: key.to_string(),
                });
        }
    }
    Ok(None)
}
