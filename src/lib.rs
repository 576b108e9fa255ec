pub mod canvas;
pub mod config;
pub mod ir;
pub mod layout;
pub mod mapper;
pub mod measure;
pub mod source;

use wasm_bindgen::prelude::*;

use canvas::{Canvas, MemoryCanvas};
use config::Settings;
use layout::ForceLayout;
use mapper::ConceptMapper;
use source::JsonSource;

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Lay out a concept graph (extraction-service JSON) and return a JSON Canvas document.
#[wasm_bindgen(js_name = "conceptMapToCanvas")]
pub fn concept_map_to_canvas(
    graph_json: &str,
    settings_json: Option<String>,
    seed: Option<f64>,
) -> Result<String, String> {
    let settings: Settings = match settings_json.as_deref() {
        Some(json) => serde_json::from_str(json).map_err(|e| e.to_string())?,
        None => Settings::default(),
    };
    let seed = seed.map(|s| s as u64).unwrap_or_else(default_seed);

    let mut mapper = ConceptMapper::new(
        MemoryCanvas::new("concept-map.canvas"),
        ForceLayout::new(seed),
        JsonSource::new(graph_json),
        settings,
    );
    mapper.generate("", "").map_err(|e| error_chain(&e))?;

    serde_json::to_string(&mapper.canvas().get_data()).map_err(|e| e.to_string())
}

/// `err` followed by each of its sources, colon separated.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(target_arch = "wasm32")]
fn default_seed() -> u64 {
    js_sys::Date::now() as u64
}

#[cfg(not(target_arch = "wasm32"))]
fn default_seed() -> u64 {
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRAPH: &str = r#"{
        "entities": [
            {"id": "1", "name": "Rust", "explanation": "A systems language"},
            {"id": "2", "name": "Ownership", "explanation": ""},
            {"id": "3", "name": "Borrowing", "explanation": ""}
        ],
        "relationships": [
            {"source_id": "1", "target_id": "2", "label": "is built around", "explanation": ""},
            {"source_id": "2", "target_id": "3", "label": "allows", "explanation": ""}
        ]
    }"#;

    #[test]
    fn test_concept_map_to_canvas() {
        let output = concept_map_to_canvas(GRAPH, None, Some(3.0)).unwrap();
        let data: canvas::CanvasData = serde_json::from_str(&output).unwrap();
        assert_eq!(data.nodes.len(), 3);
        assert_eq!(data.edges.len(), 2);
        assert_eq!(data.edges[0].label.as_deref(), Some("is built\naround"));
    }

    #[test]
    fn test_error_chain_lists_each_cause_once() {
        let err = layout::LayoutError::Provider {
            algorithm: "cola".to_string(),
            source: layout::ProviderError::UnknownAlgorithm("cola".to_string()),
        };
        assert_eq!(
            error_chain(&err),
            "Layout capability failed for cola: Unknown layout algorithm: cola"
        );
    }

    #[test]
    fn test_bad_settings_reported() {
        let err = concept_map_to_canvas(GRAPH, Some("{".to_string()), None).unwrap_err();
        assert!(!err.is_empty());
    }

    #[test]
    fn test_bad_graph_reported() {
        let err = concept_map_to_canvas("[]", None, None).unwrap_err();
        assert!(err.contains("Malformed"));
    }
}
