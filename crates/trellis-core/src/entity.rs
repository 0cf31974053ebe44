//! Entity (node) types and operations

use crate::workspace::WorkspaceId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ulid::Ulid;

/// Unique identifier for an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub Ulid);

impl EntityId {
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    pub fn from_string(s: &str) -> Result<Self, ulid::DecodeError> {
        Ok(Self(Ulid::from_string(s)?))
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// String-keyed property bag attached to entities and edges
pub type Properties = HashMap<String, serde_json::Value>;

/// An entity in the property graph (a node)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Unique identifier
    pub id: EntityId,

    /// Workspace this entity belongs to
    pub workspace_id: WorkspaceId,

    /// Entity type/category (e.g. "person", "document")
    pub entity_type: String,

    /// Arbitrary scalar properties
    #[serde(default)]
    pub properties: Properties,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,

    /// Tombstone marker; set entities are excluded from default reads
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Entity {
    /// Create a new live entity with fresh id and timestamps
    pub fn new(
        workspace_id: WorkspaceId,
        entity_type: impl Into<String>,
        properties: Properties,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::new(),
            workspace_id,
            entity_type: entity_type.into(),
            properties,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Whether this entity has been soft-deleted
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Replace the full properties map and refresh `updated_at`
    pub fn replace_properties(&mut self, properties: Properties) {
        self.properties = properties;
        self.updated_at = Utc::now();
    }

    /// Mark as deleted; refreshes `updated_at` to the same instant
    pub fn tombstone(&mut self) {
        let now = Utc::now();
        self.deleted_at = Some(now);
        self.updated_at = now;
    }
}

/// Data for creating a new entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewEntity {
    pub entity_type: String,
    pub properties: Properties,
}

impl Default for NewEntity {
    fn default() -> Self {
        Self {
            entity_type: String::new(),
            properties: Properties::new(),
        }
    }
}

impl NewEntity {
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            properties: Properties::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// One item of a bulk entity update: full property replacement by id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityUpdate {
    pub id: EntityId,
    #[serde(default)]
    pub properties: Properties,
}

impl EntityUpdate {
    pub fn new(id: EntityId, properties: Properties) -> Self {
        Self { id, properties }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_creation() {
        let ws = WorkspaceId::new();
        let entity = Entity::new(ws, "person", Properties::new());

        assert_eq!(entity.entity_type, "person");
        assert_eq!(entity.created_at, entity.updated_at);
        assert!(!entity.is_deleted());
    }

    #[test]
    fn test_replace_properties_refreshes_updated_at() {
        let ws = WorkspaceId::new();
        let mut entity = Entity::new(ws, "person", Properties::new());
        let created = entity.created_at;

        let mut props = Properties::new();
        props.insert("name".to_string(), "Ada".into());
        entity.replace_properties(props);

        assert_eq!(entity.properties["name"], "Ada");
        assert!(entity.updated_at >= created);
    }

    #[test]
    fn test_tombstone() {
        let ws = WorkspaceId::new();
        let mut entity = Entity::new(ws, "person", Properties::new());

        entity.tombstone();
        assert!(entity.is_deleted());
        assert_eq!(entity.deleted_at, Some(entity.updated_at));
    }

    #[test]
    fn test_new_entity_builder() {
        let new = NewEntity::new("document")
            .with_property("title", "Design notes")
            .with_property("pages", 12);

        assert_eq!(new.entity_type, "document");
        assert_eq!(new.properties["pages"], 12);
    }
}
