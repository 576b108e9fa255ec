//! Generation requests, candidate retention and layout rotation.

use crate::canvas::Canvas;
use crate::config::{AlgorithmRegistry, AlgorithmSpec, LayoutConfig, Settings};
use crate::ir::{GraphError, NodeSize};
use crate::layout::engine::{LayoutEngine, LayoutProvider};
use crate::layout::search::{SearchError, SearchRequest, search_best};
use crate::layout::sides::NodeSideOptimizer;
use crate::layout::types::LayoutCandidate;
use crate::source::{GraphSource, SourceError};
use std::collections::HashMap;
use tracing::{debug, error};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum MapperError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("Invalid concept map data: {0}")]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error("Canvas should be empty to start a concept map creation")]
    CanvasNotEmpty,
    #[error("No alternate layouts available")]
    NoCandidates,
    #[error("Layouts were generated for a different canvas")]
    DocumentChanged,
}

/// Non-empty list of kept candidates with a cursor that always points inside it.
#[derive(Debug, Clone)]
pub struct CandidateRing {
    candidates: Vec<LayoutCandidate>,
    current: usize,
}

impl CandidateRing {
    pub fn new(candidates: Vec<LayoutCandidate>) -> Option<Self> {
        if candidates.is_empty() {
            None
        } else {
            Some(Self {
                candidates,
                current: 0,
            })
        }
    }

    pub fn current(&self) -> &LayoutCandidate {
        &self.candidates[self.current]
    }

    pub fn advance(&mut self) -> &LayoutCandidate {
        self.current = (self.current + 1) % self.candidates.len();
        self.current()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Always false, a ring holds at least one candidate.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> impl Iterator<Item = &LayoutCandidate> {
        self.candidates.iter()
    }
}

#[derive(Debug, Clone)]
enum LayoutResults {
    Idle,
    Ready {
        document: Option<String>,
        ring: CandidateRing,
    },
}

/// Drives generation for one canvas and keeps the winning layouts around.
pub struct ConceptMapper<C, P, S> {
    canvas: C,
    provider: P,
    source: S,
    settings: Settings,
    registry: AlgorithmRegistry,
    engine: LayoutEngine,
    sides: NodeSideOptimizer,
    node_size_overrides: HashMap<String, NodeSize>,
    results: LayoutResults,
}

impl<C: Canvas, P: LayoutProvider, S: GraphSource> ConceptMapper<C, P, S> {
    pub fn new(canvas: C, provider: P, source: S, settings: Settings) -> Self {
        Self::with_config(canvas, provider, source, settings, LayoutConfig::default())
    }

    pub fn with_config(
        canvas: C,
        provider: P,
        source: S,
        settings: Settings,
        config: LayoutConfig,
    ) -> Self {
        let engine = LayoutEngine::new(config, &settings);
        Self {
            canvas,
            provider,
            source,
            settings,
            registry: AlgorithmRegistry::default(),
            engine,
            sides: NodeSideOptimizer::new(),
            node_size_overrides: HashMap::new(),
            results: LayoutResults::Idle,
        }
    }

    pub fn with_registry(mut self, registry: AlgorithmRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_node_sizes(mut self, overrides: HashMap<String, NodeSize>) -> Self {
        self.node_size_overrides = overrides;
        self
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut C {
        &mut self.canvas
    }

    pub fn into_canvas(self) -> C {
        self.canvas
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Kept candidates, in request order. Empty until a generation succeeds.
    pub fn candidates(&self) -> Vec<&LayoutCandidate> {
        match &self.results {
            LayoutResults::Idle => Vec::new(),
            LayoutResults::Ready { ring, .. } => ring.iter().collect(),
        }
    }

    pub fn current_candidate(&self) -> Option<&LayoutCandidate> {
        match &self.results {
            LayoutResults::Idle => None,
            LayoutResults::Ready { ring, .. } => Some(ring.current()),
        }
    }

    /// Fetch a graph for `topic`, search layouts for every selected
    /// algorithm and apply the first one.
    pub fn generate(&mut self, topic: &str, text: &str) -> Result<(), MapperError> {
        if !self.canvas.get_data().is_empty() {
            return Err(MapperError::CanvasNotEmpty);
        }
        self.results = LayoutResults::Idle;

        let graph = self.source.fetch(topic, text)?;
        graph.validate()?;

        let document = self.canvas.document_id();
        let node_sizes =
            graph.node_sizes(self.canvas.default_node_size(), &self.node_size_overrides);
        let algorithms: Vec<AlgorithmSpec> = self
            .registry
            .selected(&self.settings)
            .into_iter()
            .cloned()
            .collect();

        let mut candidates = Vec::with_capacity(algorithms.len());
        for algorithm in &algorithms {
            let request = SearchRequest {
                graph: &graph,
                node_sizes: &node_sizes,
                algorithm,
                iterations: algorithm.effective_iterations(&self.settings),
            };
            match search_best(
                &self.engine,
                &mut self.canvas,
                &mut self.provider,
                &mut self.sides,
                request,
            ) {
                Ok(candidate) => candidates.push(candidate),
                Err(e) => {
                    error!(error = %e, "layout search failed");
                    self.canvas.clear();
                    return Err(e.into());
                }
            }
        }

        let ring = CandidateRing::new(candidates).ok_or(MapperError::NoCandidates)?;
        apply(&mut self.canvas, ring.current());
        self.results = LayoutResults::Ready { document, ring };
        Ok(())
    }

    /// True when the open document produced the kept layouts and there is
    /// more than one to rotate through.
    pub fn has_alternate_layouts(&self, document: Option<&str>) -> bool {
        match &self.results {
            LayoutResults::Idle => false,
            LayoutResults::Ready {
                document: generated_for,
                ring,
            } => generated_for.as_deref() == document && ring.len() > 1,
        }
    }

    /// Apply the next kept layout, wrapping after the last.
    pub fn rotate_layout(&mut self) -> Result<&LayoutCandidate, MapperError> {
        let open_document = self.canvas.document_id();
        let LayoutResults::Ready { document, ring } = &mut self.results else {
            return Err(MapperError::NoCandidates);
        };
        if *document != open_document {
            return Err(MapperError::DocumentChanged);
        }

        let candidate = ring.advance();
        apply(&mut self.canvas, candidate);
        debug!(algorithm = %candidate.algorithm, "switched layout");
        Ok(candidate)
    }
}

/// Replace the canvas contents with a kept snapshot.
fn apply<C: Canvas + ?Sized>(canvas: &mut C, candidate: &LayoutCandidate) {
    debug!(
        algorithm = %candidate.algorithm,
        nodes = candidate.metrics.node_overlaps,
        nodes_edges = candidate.metrics.edge_node_overlaps,
        edges = candidate.metrics.edge_edge_overlaps,
        "apply best generation"
    );
    canvas.clear();
    canvas.set_data(candidate.snapshot.clone());
    canvas.request_save();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{CanvasData, MemoryCanvas};
    use crate::config::AlgorithmSpec;
    use crate::ir::ConceptGraph;
    use crate::layout::engine::ProviderError;
    use crate::layout::forces::ForceLayout;
    use crate::layout::types::Point;
    use crate::source::JsonSource;
    use serde_json::json;

    const PAYLOAD: &str = r#"{
        "entities": [
            {"id": "c", "name": "Photosynthesis", "explanation": "Light to sugar"},
            {"id": "a", "name": "Chlorophyll", "explanation": "Green pigment"},
            {"id": "b", "name": "Glucose", "explanation": "A sugar"}
        ],
        "relationships": [
            {"source_id": "c", "target_id": "a", "label": "requires", "explanation": ""},
            {"source_id": "c", "target_id": "b", "label": "produces", "explanation": ""}
        ]
    }"#;

    type Positions = Result<HashMap<String, Point>, ProviderError>;
    type FixedFn = fn(&ConceptGraph, &AlgorithmSpec) -> Positions;

    fn star(_: &ConceptGraph, _: &AlgorithmSpec) -> Positions {
        Ok([
            ("c".to_string(), Point::new(0.0, 0.0)),
            ("a".to_string(), Point::new(800.0, 0.0)),
            ("b".to_string(), Point::new(0.0, 600.0)),
        ]
        .into_iter()
        .collect())
    }

    fn broken(_: &ConceptGraph, a: &AlgorithmSpec) -> Positions {
        Err(ProviderError::Failed {
            algorithm: a.name.clone(),
            reason: "no convergence".to_string(),
        })
    }

    fn no_grid() -> LayoutConfig {
        LayoutConfig {
            grid_spacing: 0.0,
            ..LayoutConfig::default()
        }
    }

    fn fixed_mapper(
        provider: FixedFn,
        settings: Settings,
    ) -> ConceptMapper<MemoryCanvas, FixedFn, JsonSource> {
        ConceptMapper::with_config(
            MemoryCanvas::new("biology.canvas"),
            provider,
            JsonSource::new(PAYLOAD),
            settings,
            no_grid(),
        )
    }

    fn single_pass() -> Settings {
        Settings {
            best_layout_selection: false,
            ..Settings::default()
        }
    }

    #[test]
    fn test_end_to_end_star() {
        let mut mapper = fixed_mapper(star, single_pass());
        mapper.generate("photosynthesis", "").unwrap();

        let data = mapper.canvas().get_data();
        assert_eq!(data.nodes.len(), 3);
        assert_eq!(data.edges.len(), 2);
        assert_ne!(data.edges[0].from_side, data.edges[1].from_side);
        assert_eq!(data.edges[0].from_node, data.edges[1].from_node);

        let candidate = mapper.current_candidate().unwrap();
        assert_eq!(candidate.algorithm, "cola");
        assert_eq!(candidate.metrics.weighted_score, 0);
        assert_eq!(candidate.snapshot, data);
        assert!(!mapper.has_alternate_layouts(Some("biology.canvas")));
    }

    #[test]
    fn test_multiple_algorithms_kept_in_order() {
        let settings = Settings {
            multiple_layout_algorithms: true,
            ..single_pass()
        };
        let mut mapper = ConceptMapper::new(
            MemoryCanvas::new("biology.canvas"),
            ForceLayout::new(11),
            JsonSource::new(PAYLOAD),
            settings,
        );
        mapper.generate("photosynthesis", "").unwrap();

        let names: Vec<&str> = mapper
            .candidates()
            .iter()
            .map(|c| c.algorithm.as_str())
            .collect();
        assert_eq!(names, vec!["cola", "cose-bilkent", "dagre"]);
        assert!(mapper.has_alternate_layouts(Some("biology.canvas")));
        assert!(!mapper.has_alternate_layouts(Some("other.canvas")));
        assert_eq!(mapper.canvas().get_data(), mapper.candidates()[0].snapshot);
    }

    #[test]
    fn test_rotation_wraps_and_reapplies() {
        let settings = Settings {
            multiple_layout_algorithms: true,
            ..single_pass()
        };
        let mut mapper = ConceptMapper::new(
            MemoryCanvas::new("biology.canvas"),
            ForceLayout::new(5),
            JsonSource::new(PAYLOAD),
            settings,
        );
        mapper.generate("photosynthesis", "").unwrap();

        let mut seen = Vec::new();
        for _ in 0..4 {
            let candidate = mapper.rotate_layout().unwrap().clone();
            assert_eq!(mapper.canvas().get_data(), candidate.snapshot);
            seen.push(candidate.algorithm);
        }
        assert_eq!(seen, vec!["cose-bilkent", "dagre", "cola", "cose-bilkent"]);
    }

    #[test]
    fn test_apply_requests_save() {
        let mut mapper = fixed_mapper(star, single_pass());
        mapper.generate("photosynthesis", "").unwrap();
        let saves = mapper.canvas().save_count();
        mapper.rotate_layout().unwrap();
        assert!(mapper.canvas().save_count() > saves);
    }

    #[test]
    fn test_rotate_without_results() {
        let mut mapper = fixed_mapper(star, single_pass());
        assert_eq!(mapper.rotate_layout().unwrap_err(), MapperError::NoCandidates);
    }

    #[test]
    fn test_rotate_after_switching_document() {
        let mut mapper = fixed_mapper(star, single_pass());
        mapper.generate("photosynthesis", "").unwrap();
        mapper.canvas_mut().open("elsewhere.canvas");
        assert_eq!(mapper.rotate_layout().unwrap_err(), MapperError::DocumentChanged);
    }

    #[test]
    fn test_malformed_payload_leaves_canvas_untouched() {
        let mut mapper = ConceptMapper::with_config(
            MemoryCanvas::new("biology.canvas"),
            star as FixedFn,
            JsonSource::new(r#"{"entities": []}"#),
            Settings::default(),
            no_grid(),
        );
        let err = mapper.generate("photosynthesis", "").unwrap_err();
        assert_eq!(err, MapperError::Source(SourceError::Incomplete("relationships")));
        assert!(mapper.canvas().get_data().is_empty());
        assert_eq!(mapper.canvas().save_count(), 0);
    }

    #[test]
    fn test_empty_graph_is_input_error() {
        let mut mapper = ConceptMapper::with_config(
            MemoryCanvas::new("biology.canvas"),
            star as FixedFn,
            JsonSource::new(r#"{"entities": [], "relationships": []}"#),
            Settings::default(),
            no_grid(),
        );
        assert_eq!(
            mapper.generate("photosynthesis", "").unwrap_err(),
            MapperError::Graph(GraphError::NoEntities)
        );
    }

    #[test]
    fn test_search_exhaustion_is_fatal() {
        let mut mapper = fixed_mapper(broken, Settings::default());
        let err = mapper.generate("photosynthesis", "").unwrap_err();
        match err {
            MapperError::Search(SearchError::Exhausted {
                algorithm,
                iterations,
                ..
            }) => {
                assert_eq!(algorithm, "cola");
                assert_eq!(iterations, 20);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(mapper.canvas().get_data().is_empty());
        assert!(mapper.candidates().is_empty());
    }

    #[test]
    fn test_new_request_invalidates_previous_results() {
        let mut mapper = ConceptMapper::new(
            MemoryCanvas::new("biology.canvas"),
            ForceLayout::new(1),
            JsonSource::new(PAYLOAD),
            Settings {
                multiple_layout_algorithms: true,
                ..single_pass()
            },
        );
        mapper.generate("photosynthesis", "").unwrap();
        assert!(mapper.has_alternate_layouts(Some("biology.canvas")));

        let registry = AlgorithmRegistry {
            primary: AlgorithmSpec::new("missing", json!({}), 3),
            secondary: Vec::new(),
        };
        let mut mapper = mapper.with_registry(registry);
        mapper.canvas_mut().set_data(CanvasData::default());
        assert!(mapper.generate("photosynthesis", "").is_err());
        assert!(!mapper.has_alternate_layouts(Some("biology.canvas")));
        assert!(mapper.current_candidate().is_none());
    }

    #[test]
    fn test_non_empty_canvas_rejected() {
        let mut mapper = fixed_mapper(star, single_pass());
        mapper.generate("photosynthesis", "").unwrap();
        assert_eq!(
            mapper.generate("photosynthesis", "").unwrap_err(),
            MapperError::CanvasNotEmpty
        );
    }

    #[test]
    fn test_best_selection_runs_configured_iterations() {
        let registry = AlgorithmRegistry {
            primary: AlgorithmSpec::new("cola", AlgorithmSpec::cola().params, 4),
            secondary: Vec::new(),
        };
        let mut mapper = ConceptMapper::new(
            MemoryCanvas::new("biology.canvas"),
            ForceLayout::new(9),
            JsonSource::new(PAYLOAD),
            Settings::default(),
        )
        .with_registry(registry);
        mapper.generate("photosynthesis", "").unwrap();

        let candidate = mapper.current_candidate().unwrap();
        assert_eq!(candidate.snapshot.nodes.len(), 3);
        // each iteration clears and saves, and the final apply saves twice more
        assert_eq!(mapper.canvas().save_count(), 4 + 2);
    }

    #[test]
    fn test_node_size_overrides_reach_canvas() {
        let mut overrides = HashMap::new();
        overrides.insert("c".to_string(), NodeSize::new(400.0, 120.0));
        let mut mapper = fixed_mapper(star, single_pass()).with_node_sizes(overrides);
        mapper.generate("photosynthesis", "").unwrap();
        let data = mapper.canvas().get_data();
        let central = data.nodes.iter().find(|n| n.text == "Photosynthesis").unwrap();
        assert_eq!((central.width, central.height), (400.0, 120.0));
    }
}
