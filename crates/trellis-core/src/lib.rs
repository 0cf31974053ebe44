//! Trellis Core - Data model and traversal engine
//!
//! This crate provides the value types, error taxonomy, and the
//! snapshot-based graph traversal algorithms shared by every Trellis
//! storage backend.

pub mod edge;
pub mod entity;
pub mod error;
pub mod limits;
pub mod query;
pub mod schema;
pub mod traversal;
pub mod workspace;

pub use edge::{Edge, EdgeId, NewEdge};
pub use entity::{Entity, EntityId, EntityUpdate, NewEntity, Properties};
pub use error::{Error, Result, ValidationIssue};
pub use query::{
    Direction, EdgeFilter, EntityFilter, NeighborOptions, Path, TraverseOptions,
};
pub use schema::{PropertyDefinition, PropertyType, SchemaDefinition, SchemaInput, TypeDefinition};
pub use traversal::GraphSnapshot;
pub use workspace::WorkspaceId;
