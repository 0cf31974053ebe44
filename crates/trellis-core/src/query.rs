//! Filter and option types for list, traversal, and path operations
//!
//! All option structs deserialize from a flat bag of named parameters
//! with defaults for everything; unrecognized fields are ignored, so
//! an outer routing layer can pass request parameters straight
//! through.

use crate::edge::EdgeId;
use crate::entity::EntityId;
use crate::limits::{
    DEFAULT_LIST_LIMIT, DEFAULT_PATH_DEPTH, DEFAULT_TRAVERSE_DEPTH, DEFAULT_TRAVERSE_LIMIT,
};
use serde::{Deserialize, Serialize};

/// Direction filter for edge-following operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Follow edges where the entity is the source
    Out,
    /// Follow edges where the entity is the target
    In,
    /// Follow edges in either direction
    #[default]
    Both,
}

/// Options for listing entities
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityFilter {
    /// Restrict to one entity type
    pub entity_type: Option<String>,
    /// Page size
    pub limit: usize,
    /// Page offset
    pub offset: usize,
    /// Include tombstoned entities
    pub include_deleted: bool,
}

impl Default for EntityFilter {
    fn default() -> Self {
        Self {
            entity_type: None,
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
            include_deleted: false,
        }
    }
}

impl EntityFilter {
    pub fn with_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self
    }

    pub fn with_page(mut self, limit: usize, offset: usize) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }

    pub fn include_deleted(mut self) -> Self {
        self.include_deleted = true;
        self
    }
}

/// Options for listing edges
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeFilter {
    /// Restrict to one edge type
    pub edge_type: Option<String>,
    /// Page size
    pub limit: usize,
    /// Page offset
    pub offset: usize,
    /// Include tombstoned edges
    pub include_deleted: bool,
}

impl Default for EdgeFilter {
    fn default() -> Self {
        Self {
            edge_type: None,
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
            include_deleted: false,
        }
    }
}

impl EdgeFilter {
    pub fn with_type(mut self, edge_type: impl Into<String>) -> Self {
        self.edge_type = Some(edge_type.into());
        self
    }

    pub fn with_page(mut self, limit: usize, offset: usize) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }

    pub fn include_deleted(mut self) -> Self {
        self.include_deleted = true;
        self
    }
}

/// Options for the one-hop neighbor query
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NeighborOptions {
    pub direction: Direction,
    /// Restrict to edges of one type
    pub edge_type: Option<String>,
}

impl NeighborOptions {
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_edge_type(mut self, edge_type: impl Into<String>) -> Self {
        self.edge_type = Some(edge_type.into());
        self
    }
}

/// Options for bounded reachability traversal
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TraverseOptions {
    /// Maximum hop count, must stay within `[1, 10]`
    pub max_depth: u32,
    /// Result cap; traversal stops collecting once reached
    pub limit: usize,
    pub direction: Direction,
    /// Restrict traversal to edges of one type
    pub edge_type: Option<String>,
}

impl Default for TraverseOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_TRAVERSE_DEPTH,
            limit: DEFAULT_TRAVERSE_LIMIT,
            direction: Direction::Both,
            edge_type: None,
        }
    }
}

impl TraverseOptions {
    pub fn with_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_edge_type(mut self, edge_type: impl Into<String>) -> Self {
        self.edge_type = Some(edge_type.into());
        self
    }
}

/// Default depth for shortest-path search, exposed for callers that
/// build their own request plumbing
pub fn default_path_depth() -> u32 {
    DEFAULT_PATH_DEPTH
}

/// A single path through the graph
///
/// `edges[i]` connects `nodes[i]` and `nodes[i + 1]`, in either
/// direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path {
    /// Ordered entity ids from source to target
    pub nodes: Vec<EntityId>,
    /// Edge ids connecting consecutive nodes
    pub edges: Vec<EdgeId>,
}

impl Path {
    /// Path length in hops (number of edges)
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}
