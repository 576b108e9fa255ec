//! Where concept graphs come from.
//!
//! The remote extraction service (HTTP transport, polling) lives outside
//! this crate. Anything that can hand over a resolved graph implements
//! [`GraphSource`].

use crate::ir::ConceptGraph;
use serde_json::Value;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SourceError {
    #[error("Malformed concept map data: {0}")]
    Malformed(String),
    #[error("Incomplete concept map data: missing {0}")]
    Incomplete(&'static str),
}

pub trait GraphSource {
    fn fetch(&mut self, topic: &str, text: &str) -> Result<ConceptGraph, SourceError>;
}

/// Serves a fixed JSON payload shaped like the extraction service's answer.
#[derive(Debug, Clone)]
pub struct JsonSource {
    payload: String,
}

impl JsonSource {
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
        }
    }
}

impl GraphSource for JsonSource {
    fn fetch(&mut self, _topic: &str, _text: &str) -> Result<ConceptGraph, SourceError> {
        parse_graph(&self.payload)
    }
}

/// Parse an extraction-service response body.
pub fn parse_graph(payload: &str) -> Result<ConceptGraph, SourceError> {
    let value: Value =
        serde_json::from_str(payload).map_err(|e| SourceError::Malformed(e.to_string()))?;
    let object = value
        .as_object()
        .ok_or_else(|| SourceError::Malformed("expected a JSON object".to_string()))?;
    for key in ["entities", "relationships"] {
        if !object.get(key).is_some_and(Value::is_array) {
            return Err(SourceError::Incomplete(key));
        }
    }
    serde_json::from_value(value).map_err(|e| SourceError::Malformed(e.to_string()))
}
