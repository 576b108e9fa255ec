//! Entity/relationship graph as received from the extraction service.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum GraphError {
    #[error("Concept map has no entities")]
    NoEntities,
    #[error("Duplicate entity id: {0}")]
    DuplicateEntity(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub source_id: String,
    pub target_id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub explanation: String,
}

/// Entities and the labeled links between them. The first entity is the central one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConceptGraph {
    pub entities: Vec<Entity>,
    pub relationships: Vec<Relationship>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeSize {
    pub width: f64,
    pub height: f64,
}

impl NodeSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Top-left corner in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl ConceptGraph {
    pub fn new(entities: Vec<Entity>, relationships: Vec<Relationship>) -> Self {
        Self {
            entities,
            relationships,
        }
    }

    pub fn central(&self) -> Option<&Entity> {
        self.entities.first()
    }

    /// Reject graphs the generator cannot place at all.
    ///
    /// Relationships pointing at unknown entities are allowed through; the
    /// generator logs and skips them.
    pub fn validate(&self) -> Result<(), GraphError> {
        if self.entities.is_empty() {
            return Err(GraphError::NoEntities);
        }
        let mut seen = HashSet::new();
        for entity in &self.entities {
            if !seen.insert(entity.id.as_str()) {
                return Err(GraphError::DuplicateEntity(entity.id.clone()));
            }
        }
        Ok(())
    }

    /// Undirected adjacency, one entry per entity, neighbours in relationship order.
    pub fn undirected_adjacency(&self) -> HashMap<&str, Vec<&str>> {
        let mut adjacency: HashMap<&str, Vec<&str>> = self
            .entities
            .iter()
            .map(|e| (e.id.as_str(), Vec::new()))
            .collect();
        for rel in &self.relationships {
            adjacency
                .entry(rel.source_id.as_str())
                .or_default()
                .push(rel.target_id.as_str());
            adjacency
                .entry(rel.target_id.as_str())
                .or_default()
                .push(rel.source_id.as_str());
        }
        adjacency
    }

    /// Every entity gets `default` unless `overrides` names it.
    pub fn node_sizes(
        &self,
        default: NodeSize,
        overrides: &HashMap<String, NodeSize>,
    ) -> HashMap<String, NodeSize> {
        self.entities
            .iter()
            .map(|e| {
                let size = overrides.get(&e.id).copied().unwrap_or(default);
                (e.id.clone(), size)
            })
            .collect()
    }
}
