/// Model schemas: which attributes and relationships a record type has.
use serde::{Deserialize, Serialize};

/// Cardinality of a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    /// Single-valued reference to another record.
    BelongsTo,
    /// Collection of records. Not captured by the tracker.
    HasMany,
}

/// A named relationship on a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub name: String,
    pub kind: RelationshipKind,
}

/// Describes one record type held by a `MemoryStore`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSchema {
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<String>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl ModelSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            relationships: Vec::new(),
        }
    }

    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        self.attributes.push(name.into());
        self
    }

    pub fn belongs_to(mut self, name: impl Into<String>) -> Self {
        self.relationships.push(Relationship {
            name: name.into(),
            kind: RelationshipKind::BelongsTo,
        });
        self
    }

    pub fn has_many(mut self, name: impl Into<String>) -> Self {
        self.relationships.push(Relationship {
            name: name.into(),
            kind: RelationshipKind::HasMany,
        });
        self
    }

    /// Properties the tracker snapshots by default: every attribute, then
    /// every belongs-to relationship, in declaration order.
    pub fn tracked_properties(&self) -> Vec<String> {
        let relationships = self
            .relationships
            .iter()
            .filter(|r| r.kind == RelationshipKind::BelongsTo)
            .map(|r| r.name.clone());
        self.attributes.iter().cloned().chain(relationships).collect()
    }

    /// Whether `name` is an attribute or relationship of this model.
    pub fn has_property(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a == name)
            || self.relationships.iter().any(|r| r.name == name)
    }
}
