//! Concept map layout: placement, side assignment, scoring and search.

pub mod colorizer;
pub mod engine;
pub mod evaluator;
pub mod forces;
pub mod geometry;
pub mod search;
pub mod sides;
pub mod types;

pub use engine::{GenerationReport, LayoutEngine, LayoutError, LayoutProvider, ProviderError};
pub use forces::ForceLayout;
pub use search::{SearchError, SearchRequest, search_best};
pub use sides::NodeSideOptimizer;
pub use types::{LayoutCandidate, Point, QualityMetrics, Rect};
