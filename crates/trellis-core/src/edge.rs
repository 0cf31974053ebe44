//! Edge (directed relationship) types and operations

use crate::entity::{EntityId, Properties};
use crate::workspace::WorkspaceId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unique identifier for an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub Ulid);

impl EdgeId {
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    pub fn from_string(s: &str) -> Result<Self, ulid::DecodeError> {
        Ok(Self(Ulid::from_string(s)?))
    }
}

impl Default for EdgeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A directed, typed edge between two entities
///
/// Direction runs source to target. Undirected traversal treats an
/// edge as bidirectional unless a direction filter is supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    /// Unique identifier
    pub id: EdgeId,

    /// Workspace this edge belongs to
    pub workspace_id: WorkspaceId,

    /// Edge type (e.g. "works_at", "links_to")
    pub edge_type: String,

    /// Source entity id
    pub source_id: EntityId,

    /// Target entity id
    pub target_id: EntityId,

    /// Arbitrary scalar properties
    #[serde(default)]
    pub properties: Properties,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,

    /// Tombstone marker; set when this edge or either endpoint is deleted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Edge {
    /// Create a new live edge with fresh id and timestamps
    pub fn new(
        workspace_id: WorkspaceId,
        edge_type: impl Into<String>,
        source_id: EntityId,
        target_id: EntityId,
        properties: Properties,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: EdgeId::new(),
            workspace_id,
            edge_type: edge_type.into(),
            source_id,
            target_id,
            properties,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Whether this edge has been soft-deleted
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Whether the given entity is the source or target of this edge
    pub fn touches(&self, entity_id: EntityId) -> bool {
        self.source_id == entity_id || self.target_id == entity_id
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

/// Data for creating a new edge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEdge {
    pub edge_type: String,
    pub source_id: EntityId,
    pub target_id: EntityId,
    #[serde(default)]
    pub properties: Properties,
}

impl NewEdge {
    pub fn new(
        edge_type: impl Into<String>,
        source_id: EntityId,
        target_id: EntityId,
    ) -> Self {
        Self {
            edge_type: edge_type.into(),
            source_id,
            target_id,
            properties: Properties::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}
