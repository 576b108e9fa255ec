//! User settings, engine constants and the layout algorithm registry.

use crate::ir::NodeSize;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// User-facing toggles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub colored_nodes: bool,
    pub colored_edges: bool,
    /// Run several randomized iterations per algorithm and keep the best.
    pub best_layout_selection: bool,
    /// Also try the secondary algorithms so the user can rotate between them.
    pub multiple_layout_algorithms: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            colored_nodes: true,
            colored_edges: true,
            best_layout_selection: true,
            multiple_layout_algorithms: false,
        }
    }
}

/// Engine constants.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    /// Grid step for node alignment; `<= 0` disables snapping.
    pub grid_spacing: f64,
    /// Horizontal coordinate stretch applied after centering.
    pub horizontal_stretch: f64,
    /// Labels with spaces wider than this get line breaks.
    pub label_wrap_width: usize,
    pub edge_color: String,
    pub default_node_size: NodeSize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            grid_spacing: 200.0,
            horizontal_stretch: 1.25,
            label_wrap_width: 12,
            edge_color: "#5CD1FF".to_string(),
            default_node_size: NodeSize::new(250.0, 60.0),
        }
    }
}

/// A named layout algorithm with the tuning parameters handed to the
/// layout capability and the iteration count used for best-of-N search.
#[derive(Debug, Clone, PartialEq)]
pub struct AlgorithmSpec {
    pub name: String,
    pub params: Value,
    pub iterations: usize,
}

impl AlgorithmSpec {
    pub fn new(name: impl Into<String>, params: Value, iterations: usize) -> Self {
        Self {
            name: name.into(),
            params,
            iterations,
        }
    }

    /// Iterations to run given the current settings.
    pub fn effective_iterations(&self, settings: &Settings) -> usize {
        if settings.best_layout_selection {
            self.iterations.max(1)
        } else {
            1
        }
    }

    pub fn cola() -> Self {
        Self::new(
            "cola",
            json!({
                "nodeSpacing": 200,
                "edgeLength": 100,
                "avoidOverlap": true,
                "unconstrIter": 2000,
                "userConstIter": 2000,
                "allConstIter": 2000,
                "randomize": true
            }),
            20,
        )
    }

    pub fn cose_bilkent() -> Self {
        Self::new(
            "cose-bilkent",
            json!({
                "quality": "proof",
                "nodeRepulsion": 15000000,
                "idealEdgeLength": 220,
                "edgeElasticity": 0.45,
                "gravity": 0.4,
                "numIter": 2500,
                "initialTemp": 200,
                "coolingFactor": 0.95,
                "minTemp": 1,
                "randomize": true
            }),
            100,
        )
    }

    pub fn dagre() -> Self {
        Self::new(
            "dagre",
            json!({
                "rankDir": "LR",
                "nodeSep": 120,
                "rankSep": 250,
                "spacingFactor": 1.5
            }),
            1,
        )
    }
}

/// Algorithms to run for one generation request, primary first.
#[derive(Debug, Clone, PartialEq)]
pub struct AlgorithmRegistry {
    pub primary: AlgorithmSpec,
    pub secondary: Vec<AlgorithmSpec>,
}

impl Default for AlgorithmRegistry {
    fn default() -> Self {
        Self {
            primary: AlgorithmSpec::cola(),
            secondary: vec![AlgorithmSpec::cose_bilkent(), AlgorithmSpec::dagre()],
        }
    }
}

impl AlgorithmRegistry {
    pub fn selected(&self, settings: &Settings) -> Vec<&AlgorithmSpec> {
        let mut selected = vec![&self.primary];
        if settings.multiple_layout_algorithms {
            selected.extend(self.secondary.iter());
        }
        selected
    }
}
