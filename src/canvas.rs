//! Host canvas contract and the JSON Canvas document model.
//!
//! The engine only ever talks to a [`Canvas`]: it reads node sizes back,
//! writes positions/sides/colors/labels, and swaps whole documents in and
//! out. [`MemoryCanvas`] is the in-process host used by the CLI, the wasm
//! entry point and the tests.

use crate::config::LayoutConfig;
use crate::ir::{NodeSize, Position};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CanvasError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),
    #[error("Canvas rejected the request: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Top, Side::Right, Side::Bottom, Side::Left];

    /// Outward direction in radians, y axis pointing down.
    pub fn angle(self) -> f64 {
        use std::f64::consts::PI;
        match self {
            Side::Right => 0.0,
            Side::Bottom => PI / 2.0,
            Side::Left => PI,
            Side::Top => 3.0 * PI / 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasNode {
    pub id: String,
    #[serde(rename = "type", default = "text_node_type")]
    pub kind: String,
    #[serde(default)]
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn text_node_type() -> String {
    "text".to_string()
}

impl CanvasNode {
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasEdge {
    pub id: String,
    pub from_node: String,
    pub from_side: Side,
    pub to_node: String,
    pub to_side: Side,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Full ordered document state. This is what gets stored as a layout candidate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanvasData {
    #[serde(default)]
    pub nodes: Vec<CanvasNode>,
    #[serde(default)]
    pub edges: Vec<CanvasEdge>,
}

impl CanvasData {
    pub fn node(&self, id: &str) -> Option<&CanvasNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut CanvasNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// Text node creation request.
#[derive(Debug, Clone)]
pub struct NodeRequest<'a> {
    pub text: &'a str,
    pub position: Position,
    pub size: NodeSize,
}

/// Edge creation request.
#[derive(Debug, Clone)]
pub struct EdgeRequest {
    pub from_node: String,
    pub from_side: Side,
    pub to_node: String,
    pub to_side: Side,
    pub label: Option<String>,
    pub color: Option<String>,
    pub explanation: Option<String>,
}

/// What the engine needs from the canvas it draws on.
pub trait Canvas {
    fn default_node_size(&self) -> NodeSize;

    /// Identity of the open document (its path), if any.
    fn document_id(&self) -> Option<String>;

    fn create_text_node(&mut self, request: NodeRequest<'_>) -> Result<String, CanvasError>;

    fn set_node_color(&mut self, id: &str, color: &str) -> Result<(), CanvasError>;

    fn create_edge(&mut self, request: EdgeRequest) -> Result<String, CanvasError>;

    fn get_data(&self) -> CanvasData;

    /// Replace the whole document in one step.
    fn set_data(&mut self, data: CanvasData);

    /// Fire-and-forget persistence.
    fn request_save(&mut self);

    fn clear(&mut self) {
        self.set_data(CanvasData::default());
        self.request_save();
    }

    /// Store an explanation on a node as an out-of-band field.
    fn attach_node_explanation(&mut self, id: &str, explanation: &str) -> Result<(), CanvasError> {
        let mut data = self.get_data();
        let node = data
            .node_mut(id)
            .ok_or_else(|| CanvasError::NodeNotFound(id.to_string()))?;
        node.explanation = Some(explanation.to_string());
        self.set_data(data);
        Ok(())
    }
}

/// In-memory host canvas.
#[derive(Debug, Clone)]
pub struct MemoryCanvas {
    data: CanvasData,
    path: Option<String>,
    default_size: NodeSize,
    next_id: u64,
    saves: usize,
}

impl Default for MemoryCanvas {
    fn default() -> Self {
        Self {
            data: CanvasData::default(),
            path: None,
            default_size: LayoutConfig::default().default_node_size,
            next_id: 0,
            saves: 0,
        }
    }
}

impl MemoryCanvas {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn with_default_size(mut self, size: NodeSize) -> Self {
        self.default_size = size;
        self
    }

    /// Pretend the user switched to another document.
    pub fn open(&mut self, path: impl Into<String>) {
        self.path = Some(path.into());
    }

    pub fn data(&self) -> &CanvasData {
        &self.data
    }

    pub fn save_count(&self) -> usize {
        self.saves
    }

    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        format!("{:016x}", self.next_id)
    }
}

impl Canvas for MemoryCanvas {
    fn default_node_size(&self) -> NodeSize {
        self.default_size
    }

    fn document_id(&self) -> Option<String> {
        self.path.clone()
    }

    fn create_text_node(&mut self, request: NodeRequest<'_>) -> Result<String, CanvasError> {
        if !(request.size.width > 0.0 && request.size.height > 0.0) {
            return Err(CanvasError::Rejected(format!(
                "node size must be positive, got {}x{}",
                request.size.width, request.size.height
            )));
        }
        if !request.position.x.is_finite() || !request.position.y.is_finite() {
            return Err(CanvasError::Rejected("node position is not finite".to_string()));
        }
        let id = self.allocate_id();
        self.data.nodes.push(CanvasNode {
            id: id.clone(),
            kind: text_node_type(),
            text: request.text.to_string(),
            x: request.position.x,
            y: request.position.y,
            width: request.size.width,
            height: request.size.height,
            color: None,
            explanation: None,
            extra: Map::new(),
        });
        Ok(id)
    }

    fn set_node_color(&mut self, id: &str, color: &str) -> Result<(), CanvasError> {
        let node = self
            .data
            .node_mut(id)
            .ok_or_else(|| CanvasError::NodeNotFound(id.to_string()))?;
        node.color = Some(color.to_string());
        Ok(())
    }

    fn create_edge(&mut self, request: EdgeRequest) -> Result<String, CanvasError> {
        for endpoint in [&request.from_node, &request.to_node] {
            if self.data.node(endpoint).is_none() {
                return Err(CanvasError::NodeNotFound(endpoint.clone()));
            }
        }
        let id = self.allocate_id();
        self.data.edges.push(CanvasEdge {
            id: id.clone(),
            from_node: request.from_node,
            from_side: request.from_side,
            to_node: request.to_node,
            to_side: request.to_side,
            label: request.label,
            color: request.color,
            explanation: request.explanation,
            extra: Map::new(),
        });
        Ok(id)
    }

    fn get_data(&self) -> CanvasData {
        self.data.clone()
    }

    fn set_data(&mut self, data: CanvasData) {
        self.data = data;
    }

    fn request_save(&mut self) {
        self.saves += 1;
    }
}
