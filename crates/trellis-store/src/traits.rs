//! The GraphStore backend trait

use crate::bulk::{BulkMode, BulkOutcome};
use crate::error::StoreResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use trellis_core::{
    EdgeFilter, Entity, EntityFilter, EntityId, EntityUpdate, NeighborOptions, NewEdge,
    NewEntity, Path, Properties, TraverseOptions, WorkspaceId,
};
use trellis_core::{Edge, EdgeId};

/// Result of a cascading entity soft-delete
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CascadeOutcome {
    /// The tombstoned entity
    pub entity: Entity,
    /// How many live incident edges were tombstoned along with it
    pub deleted_edge_count: usize,
}

/// Trait implemented by every graph storage backend
///
/// All operations are scoped to the supplied `workspace_id`; callers
/// hand in an already-authorized workspace and the store never lets a
/// read or write cross into another one. Soft-deleted records are
/// invisible to every operation unless `include_deleted` says
/// otherwise.
///
/// `find_paths` and `traverse` panic when `max_depth` is outside
/// `[1, 10]`; see [`trellis_core::limits::assert_depth`].
#[async_trait]
pub trait GraphStore: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Entity Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a new entity with a fresh id and timestamps
    async fn create_entity(
        &self,
        workspace_id: WorkspaceId,
        new: NewEntity,
    ) -> StoreResult<Entity>;

    /// Get an entity by id
    async fn get_entity(
        &self,
        workspace_id: WorkspaceId,
        id: EntityId,
        include_deleted: bool,
    ) -> StoreResult<Entity>;

    /// List entities, newest first
    async fn list_entities(
        &self,
        workspace_id: WorkspaceId,
        filter: &EntityFilter,
    ) -> StoreResult<Vec<Entity>>;

    /// Replace an entity's entire properties map
    async fn update_entity(
        &self,
        workspace_id: WorkspaceId,
        id: EntityId,
        properties: Properties,
    ) -> StoreResult<Entity>;

    /// Tombstone an entity and every live edge incident to it
    async fn soft_delete_entity(
        &self,
        workspace_id: WorkspaceId,
        id: EntityId,
    ) -> StoreResult<CascadeOutcome>;

    // ─────────────────────────────────────────────────────────────────────────
    // Edge Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Create an edge; both endpoints must be live entities in the
    /// same workspace (source checked before target)
    async fn create_edge(&self, workspace_id: WorkspaceId, new: NewEdge) -> StoreResult<Edge>;

    /// Get an edge by id
    async fn get_edge(
        &self,
        workspace_id: WorkspaceId,
        id: EdgeId,
        include_deleted: bool,
    ) -> StoreResult<Edge>;

    /// List edges, newest first
    async fn list_edges(
        &self,
        workspace_id: WorkspaceId,
        filter: &EdgeFilter,
    ) -> StoreResult<Vec<Edge>>;

    /// Replace an edge's entire properties map
    async fn update_edge(
        &self,
        workspace_id: WorkspaceId,
        id: EdgeId,
        properties: Properties,
    ) -> StoreResult<Edge>;

    /// Tombstone a single edge (no cascade)
    async fn soft_delete_edge(&self, workspace_id: WorkspaceId, id: EdgeId) -> StoreResult<Edge>;

    // ─────────────────────────────────────────────────────────────────────────
    // Graph Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Distinct entities exactly one live matching edge away
    async fn neighbors(
        &self,
        workspace_id: WorkspaceId,
        entity_id: EntityId,
        options: &NeighborOptions,
    ) -> StoreResult<Vec<Entity>>;

    /// All shortest undirected paths between two entities, up to
    /// `max_depth` hops; empty when unreachable
    async fn find_paths(
        &self,
        workspace_id: WorkspaceId,
        source_id: EntityId,
        target_id: EntityId,
        max_depth: u32,
    ) -> StoreResult<Vec<Path>>;

    /// Entities reachable within `max_depth` hops, start included
    async fn traverse(
        &self,
        workspace_id: WorkspaceId,
        start_id: EntityId,
        options: &TraverseOptions,
    ) -> StoreResult<Vec<Entity>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Bulk Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Create many entities in one call; every item succeeds
    async fn bulk_create_entities(
        &self,
        workspace_id: WorkspaceId,
        items: Vec<NewEntity>,
    ) -> StoreResult<Vec<Entity>>;

    /// Create many edges with atomic or partial failure semantics
    async fn bulk_create_edges(
        &self,
        workspace_id: WorkspaceId,
        items: Vec<NewEdge>,
        mode: BulkMode,
    ) -> StoreResult<BulkOutcome<Edge>>;

    /// Replace properties on many entities; unresolved ids are skipped
    async fn bulk_update_entities(
        &self,
        workspace_id: WorkspaceId,
        items: Vec<EntityUpdate>,
    ) -> StoreResult<Vec<Entity>>;

    /// Cascade soft-delete many entities; returns how many entities
    /// were actually tombstoned (unresolved ids are no-ops)
    async fn bulk_soft_delete_entities(
        &self,
        workspace_id: WorkspaceId,
        ids: &[EntityId],
    ) -> StoreResult<usize>;

    /// Fetch many entities by id; missing ids are absent from the map
    async fn batch_get_entities(
        &self,
        workspace_id: WorkspaceId,
        ids: &[EntityId],
    ) -> StoreResult<HashMap<EntityId, Entity>>;
}
