//! In-memory graph backend
//!
//! Useful for testing and light deployments; behaviorally equivalent
//! to the remote backend. Tables are `RwLock`-guarded maps keyed by
//! `(workspace_id, id)`. Operations that touch both tables take the
//! entities lock before the edges lock, so the soft-delete cascade is
//! atomic from any reader's point of view.

use crate::bulk::{atomic_rejection, BulkItemError, BulkMode, BulkOutcome, BulkReason};
use crate::error::{StoreError, StoreResult};
use crate::traits::{CascadeOutcome, GraphStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use trellis_core::limits::{assert_depth, check_batch_size};
use trellis_core::{
    Edge, EdgeFilter, EdgeId, Entity, EntityFilter, EntityId, EntityUpdate, Error,
    GraphSnapshot, NeighborOptions, NewEdge, NewEntity, Path, Properties, TraverseOptions,
    WorkspaceId,
};

type EntityTable = HashMap<(WorkspaceId, EntityId), Entity>;
type EdgeTable = HashMap<(WorkspaceId, EdgeId), Edge>;

/// In-process graph storage backend
pub struct MemoryGraphStore {
    entities: RwLock<EntityTable>,
    edges: RwLock<EdgeTable>,
}

fn lock_err<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Backend(format!("lock error: {}", e))
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self {
            entities: RwLock::new(HashMap::new()),
            edges: RwLock::new(HashMap::new()),
        }
    }

    /// Drop every record; test isolation hook
    pub fn reset(&self) -> StoreResult<()> {
        self.entities.write().map_err(lock_err)?.clear();
        self.edges.write().map_err(lock_err)?.clear();
        Ok(())
    }

    /// Point-in-time copy of one workspace's records; the snapshot
    /// constructor drops tombstones and dangling edges.
    fn snapshot(&self, workspace_id: WorkspaceId) -> StoreResult<GraphSnapshot> {
        let entities = self.entities.read().map_err(lock_err)?;
        let edges = self.edges.read().map_err(lock_err)?;
        let ws_entities = entities
            .iter()
            .filter(|((ws, _), _)| *ws == workspace_id)
            .map(|(_, e)| e.clone())
            .collect();
        let ws_edges = edges
            .iter()
            .filter(|((ws, _), _)| *ws == workspace_id)
            .map(|(_, e)| e.clone())
            .collect();
        Ok(GraphSnapshot::new(ws_entities, ws_edges))
    }

    /// Live-entity existence check against an already-held table guard
    fn is_live(table: &EntityTable, workspace_id: WorkspaceId, id: EntityId) -> bool {
        table
            .get(&(workspace_id, id))
            .map(|e| !e.is_deleted())
            .unwrap_or(false)
    }

    /// Validate one edge's endpoints, source first
    fn check_endpoints(
        table: &EntityTable,
        workspace_id: WorkspaceId,
        new: &NewEdge,
    ) -> Option<BulkReason> {
        if !Self::is_live(table, workspace_id, new.source_id) {
            Some(BulkReason::SourceNotFound)
        } else if !Self::is_live(table, workspace_id, new.target_id) {
            Some(BulkReason::TargetNotFound)
        } else {
            None
        }
    }

    /// Tombstone an entity and its live incident edges under both
    /// write guards; returns None when the entity is absent or
    /// already tombstoned.
    fn cascade_delete(
        entities: &mut EntityTable,
        edges: &mut EdgeTable,
        workspace_id: WorkspaceId,
        id: EntityId,
    ) -> Option<CascadeOutcome> {
        let entity = entities.get_mut(&(workspace_id, id))?;
        if entity.is_deleted() {
            return None;
        }
        entity.tombstone();
        let entity = entity.clone();

        let mut deleted_edge_count = 0;
        for ((ws, _), edge) in edges.iter_mut() {
            if *ws == workspace_id && !edge.is_deleted() && edge.touches(id) {
                edge.tombstone();
                deleted_edge_count += 1;
            }
        }
        tracing::debug!(
            workspace = %workspace_id,
            entity = %id,
            cascaded = deleted_edge_count,
            "soft-deleted entity"
        );
        Some(CascadeOutcome {
            entity,
            deleted_edge_count,
        })
    }
}

impl Default for MemoryGraphStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    // Entity operations

    async fn create_entity(
        &self,
        workspace_id: WorkspaceId,
        new: NewEntity,
    ) -> StoreResult<Entity> {
        let entity = Entity::new(workspace_id, new.entity_type, new.properties);
        let mut entities = self.entities.write().map_err(lock_err)?;
        entities.insert((workspace_id, entity.id), entity.clone());
        Ok(entity)
    }

    async fn get_entity(
        &self,
        workspace_id: WorkspaceId,
        id: EntityId,
        include_deleted: bool,
    ) -> StoreResult<Entity> {
        let entities = self.entities.read().map_err(lock_err)?;
        entities
            .get(&(workspace_id, id))
            .filter(|e| include_deleted || !e.is_deleted())
            .cloned()
            .ok_or_else(|| Error::EntityNotFound(id).into())
    }

    async fn list_entities(
        &self,
        workspace_id: WorkspaceId,
        filter: &EntityFilter,
    ) -> StoreResult<Vec<Entity>> {
        let entities = self.entities.read().map_err(lock_err)?;
        let mut matching: Vec<Entity> = entities
            .iter()
            .filter(|((ws, _), e)| {
                *ws == workspace_id
                    && (filter.include_deleted || !e.is_deleted())
                    && filter
                        .entity_type
                        .as_ref()
                        .map(|t| &e.entity_type == t)
                        .unwrap_or(true)
            })
            .map(|(_, e)| e.clone())
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(matching
            .into_iter()
            .skip(filter.offset)
            .take(filter.limit)
            .collect())
    }

    async fn update_entity(
        &self,
        workspace_id: WorkspaceId,
        id: EntityId,
        properties: Properties,
    ) -> StoreResult<Entity> {
        let mut entities = self.entities.write().map_err(lock_err)?;
        let entity = entities
            .get_mut(&(workspace_id, id))
            .filter(|e| !e.is_deleted())
            .ok_or(Error::EntityNotFound(id))?;
        entity.replace_properties(properties);
        Ok(entity.clone())
    }

    async fn soft_delete_entity(
        &self,
        workspace_id: WorkspaceId,
        id: EntityId,
    ) -> StoreResult<CascadeOutcome> {
        let mut entities = self.entities.write().map_err(lock_err)?;
        let mut edges = self.edges.write().map_err(lock_err)?;
        Self::cascade_delete(&mut entities, &mut edges, workspace_id, id)
            .ok_or_else(|| Error::EntityNotFound(id).into())
    }

    // Edge operations

    async fn create_edge(&self, workspace_id: WorkspaceId, new: NewEdge) -> StoreResult<Edge> {
        let entities = self.entities.read().map_err(lock_err)?;
        match Self::check_endpoints(&entities, workspace_id, &new) {
            Some(BulkReason::SourceNotFound) => {
                return Err(Error::SourceNotFound(new.source_id).into())
            }
            Some(BulkReason::TargetNotFound) => {
                return Err(Error::TargetNotFound(new.target_id).into())
            }
            None => {}
        }
        let edge = Edge::new(
            workspace_id,
            new.edge_type,
            new.source_id,
            new.target_id,
            new.properties,
        );
        let mut edges = self.edges.write().map_err(lock_err)?;
        edges.insert((workspace_id, edge.id), edge.clone());
        Ok(edge)
    }

    async fn get_edge(
        &self,
        workspace_id: WorkspaceId,
        id: EdgeId,
        include_deleted: bool,
    ) -> StoreResult<Edge> {
        let edges = self.edges.read().map_err(lock_err)?;
        edges
            .get(&(workspace_id, id))
            .filter(|e| include_deleted || !e.is_deleted())
            .cloned()
            .ok_or_else(|| Error::EdgeNotFound(id).into())
    }

    async fn list_edges(
        &self,
        workspace_id: WorkspaceId,
        filter: &EdgeFilter,
    ) -> StoreResult<Vec<Edge>> {
        let edges = self.edges.read().map_err(lock_err)?;
        let mut matching: Vec<Edge> = edges
            .iter()
            .filter(|((ws, _), e)| {
                *ws == workspace_id
                    && (filter.include_deleted || !e.is_deleted())
                    && filter
                        .edge_type
                        .as_ref()
                        .map(|t| &e.edge_type == t)
                        .unwrap_or(true)
            })
            .map(|(_, e)| e.clone())
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(matching
            .into_iter()
            .skip(filter.offset)
            .take(filter.limit)
            .collect())
    }

    async fn update_edge(
        &self,
        workspace_id: WorkspaceId,
        id: EdgeId,
        properties: Properties,
    ) -> StoreResult<Edge> {
        let mut edges = self.edges.write().map_err(lock_err)?;
        let edge = edges
            .get_mut(&(workspace_id, id))
            .filter(|e| !e.is_deleted())
            .ok_or(Error::EdgeNotFound(id))?;
        edge.replace_properties(properties);
        Ok(edge.clone())
    }

    async fn soft_delete_edge(&self, workspace_id: WorkspaceId, id: EdgeId) -> StoreResult<Edge> {
        let mut edges = self.edges.write().map_err(lock_err)?;
        let edge = edges
            .get_mut(&(workspace_id, id))
            .filter(|e| !e.is_deleted())
            .ok_or(Error::EdgeNotFound(id))?;
        edge.tombstone();
        Ok(edge.clone())
    }

    // Graph queries

    async fn neighbors(
        &self,
        workspace_id: WorkspaceId,
        entity_id: EntityId,
        options: &NeighborOptions,
    ) -> StoreResult<Vec<Entity>> {
        let snapshot = self.snapshot(workspace_id)?;
        if !snapshot.contains(entity_id) {
            return Err(Error::EntityNotFound(entity_id).into());
        }
        Ok(snapshot.neighbors(entity_id, options))
    }

    async fn find_paths(
        &self,
        workspace_id: WorkspaceId,
        source_id: EntityId,
        target_id: EntityId,
        max_depth: u32,
    ) -> StoreResult<Vec<Path>> {
        assert_depth(max_depth);
        let snapshot = self.snapshot(workspace_id)?;
        if !snapshot.contains(source_id) {
            return Err(Error::EntityNotFound(source_id).into());
        }
        if !snapshot.contains(target_id) {
            return Err(Error::EntityNotFound(target_id).into());
        }
        Ok(snapshot.shortest_paths(source_id, target_id, max_depth))
    }

    async fn traverse(
        &self,
        workspace_id: WorkspaceId,
        start_id: EntityId,
        options: &TraverseOptions,
    ) -> StoreResult<Vec<Entity>> {
        assert_depth(options.max_depth);
        let snapshot = self.snapshot(workspace_id)?;
        if !snapshot.contains(start_id) {
            return Err(Error::EntityNotFound(start_id).into());
        }
        Ok(snapshot.reachable(start_id, options))
    }

    // Bulk operations

    async fn bulk_create_entities(
        &self,
        workspace_id: WorkspaceId,
        items: Vec<NewEntity>,
    ) -> StoreResult<Vec<Entity>> {
        check_batch_size(items.len())?;
        let mut entities = self.entities.write().map_err(lock_err)?;
        let created: Vec<Entity> = items
            .into_iter()
            .map(|new| {
                let entity = Entity::new(workspace_id, new.entity_type, new.properties);
                entities.insert((workspace_id, entity.id), entity.clone());
                entity
            })
            .collect();
        tracing::debug!(workspace = %workspace_id, count = created.len(), "bulk-created entities");
        Ok(created)
    }

    async fn bulk_create_edges(
        &self,
        workspace_id: WorkspaceId,
        items: Vec<NewEdge>,
        mode: BulkMode,
    ) -> StoreResult<BulkOutcome<Edge>> {
        check_batch_size(items.len())?;
        let entities = self.entities.read().map_err(lock_err)?;
        let mut edges = self.edges.write().map_err(lock_err)?;

        let checked: Vec<(NewEdge, Option<BulkReason>)> = items
            .into_iter()
            .map(|new| {
                let reason = Self::check_endpoints(&entities, workspace_id, &new);
                (new, reason)
            })
            .collect();

        let errors: Vec<BulkItemError> = checked
            .iter()
            .enumerate()
            .filter_map(|(index, (_, reason))| reason.map(|r| BulkItemError::new(index, r)))
            .collect();

        if mode == BulkMode::Atomic && !errors.is_empty() {
            return Err(atomic_rejection(errors).into());
        }

        let created: Vec<Edge> = checked
            .into_iter()
            .filter(|(_, reason)| reason.is_none())
            .map(|(new, _)| {
                let edge = Edge::new(
                    workspace_id,
                    new.edge_type,
                    new.source_id,
                    new.target_id,
                    new.properties,
                );
                edges.insert((workspace_id, edge.id), edge.clone());
                edge
            })
            .collect();
        tracing::debug!(
            workspace = %workspace_id,
            created = created.len(),
            failed = errors.len(),
            "bulk-created edges"
        );
        Ok(BulkOutcome::from_parts(created, errors))
    }

    async fn bulk_update_entities(
        &self,
        workspace_id: WorkspaceId,
        items: Vec<EntityUpdate>,
    ) -> StoreResult<Vec<Entity>> {
        check_batch_size(items.len())?;
        let mut entities = self.entities.write().map_err(lock_err)?;
        let mut updated = Vec::new();
        for item in items {
            // Unresolved ids are skipped, not reported.
            if let Some(entity) = entities
                .get_mut(&(workspace_id, item.id))
                .filter(|e| !e.is_deleted())
            {
                entity.replace_properties(item.properties);
                updated.push(entity.clone());
            }
        }
        Ok(updated)
    }

    async fn bulk_soft_delete_entities(
        &self,
        workspace_id: WorkspaceId,
        ids: &[EntityId],
    ) -> StoreResult<usize> {
        check_batch_size(ids.len())?;
        let mut entities = self.entities.write().map_err(lock_err)?;
        let mut edges = self.edges.write().map_err(lock_err)?;
        let mut deleted = 0;
        for id in ids {
            if Self::cascade_delete(&mut entities, &mut edges, workspace_id, *id).is_some() {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    async fn batch_get_entities(
        &self,
        workspace_id: WorkspaceId,
        ids: &[EntityId],
    ) -> StoreResult<HashMap<EntityId, Entity>> {
        check_batch_size(ids.len())?;
        let entities = self.entities.read().map_err(lock_err)?;
        Ok(ids
            .iter()
            .filter_map(|id| {
                entities
                    .get(&(workspace_id, *id))
                    .filter(|e| !e.is_deleted())
                    .map(|e| (*id, e.clone()))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::Direction;

    async fn seed_pair(store: &MemoryGraphStore, ws: WorkspaceId) -> (Entity, Entity, Edge) {
        let a = store
            .create_entity(ws, NewEntity::new("person"))
            .await
            .unwrap();
        let b = store
            .create_entity(ws, NewEntity::new("company"))
            .await
            .unwrap();
        let edge = store
            .create_edge(ws, NewEdge::new("works_at", a.id, b.id))
            .await
            .unwrap();
        (a, b, edge)
    }

    #[tokio::test]
    async fn test_entity_crud_roundtrip() {
        let store = MemoryGraphStore::new();
        let ws = WorkspaceId::new();

        let created = store
            .create_entity(ws, NewEntity::new("person").with_property("name", "Ada"))
            .await
            .unwrap();
        let fetched = store.get_entity(ws, created.id, false).await.unwrap();
        assert_eq!(fetched.properties["name"], "Ada");

        let mut props = Properties::new();
        props.insert("name".to_string(), "Grace".into());
        let updated = store.update_entity(ws, created.id, props).await.unwrap();
        assert_eq!(updated.properties["name"], "Grace");
        assert!(updated.properties.len() == 1);

        let reread = store.get_entity(ws, created.id, false).await.unwrap();
        assert_eq!(reread.properties, updated.properties);
        assert!(reread.updated_at > reread.created_at);
    }

    #[tokio::test]
    async fn test_update_replaces_not_merges() {
        let store = MemoryGraphStore::new();
        let ws = WorkspaceId::new();
        let created = store
            .create_entity(
                ws,
                NewEntity::new("person")
                    .with_property("name", "Ada")
                    .with_property("age", 36),
            )
            .await
            .unwrap();

        let mut props = Properties::new();
        props.insert("role".to_string(), "engineer".into());
        let updated = store.update_entity(ws, created.id, props).await.unwrap();
        assert_eq!(updated.properties.len(), 1);
        assert!(!updated.properties.contains_key("name"));
    }

    #[tokio::test]
    async fn test_workspace_isolation() {
        let store = MemoryGraphStore::new();
        let ws_a = WorkspaceId::new();
        let ws_b = WorkspaceId::new();
        let (a, _, edge) = seed_pair(&store, ws_a).await;

        assert!(store.get_entity(ws_b, a.id, false).await.is_err());
        assert!(store.get_edge(ws_b, edge.id, false).await.is_err());
        assert!(store
            .list_entities(ws_b, &EntityFilter::default())
            .await
            .unwrap()
            .is_empty());
        assert!(store
            .neighbors(ws_b, a.id, &NeighborOptions::default())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_soft_delete_cascade() {
        let store = MemoryGraphStore::new();
        let ws = WorkspaceId::new();
        let (a, b, edge) = seed_pair(&store, ws).await;

        let outcome = store.soft_delete_entity(ws, a.id).await.unwrap();
        assert_eq!(outcome.deleted_edge_count, 1);
        assert!(outcome.entity.is_deleted());

        let err = store.get_edge(ws, edge.id, false).await.unwrap_err();
        assert!(err.is_not_found());
        // Tombstones stay readable on request.
        assert!(store.get_edge(ws, edge.id, true).await.unwrap().is_deleted());
        assert!(store.get_entity(ws, a.id, true).await.unwrap().is_deleted());
        // The other endpoint survives.
        assert!(!store.get_entity(ws, b.id, false).await.unwrap().is_deleted());

        // Deleting again is NotFound, not a double delete.
        assert!(store.soft_delete_entity(ws, a.id).await.is_err());
    }

    #[tokio::test]
    async fn test_create_edge_endpoint_errors_in_order() {
        let store = MemoryGraphStore::new();
        let ws = WorkspaceId::new();
        let a = store
            .create_entity(ws, NewEntity::new("person"))
            .await
            .unwrap();
        let ghost = EntityId::new();

        let err = store
            .create_edge(ws, NewEdge::new("knows", ghost, a.id))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(Error::SourceNotFound(id)) if id == ghost
        ));

        // Source missing wins even when both endpoints are missing.
        let other = EntityId::new();
        let err = store
            .create_edge(ws, NewEdge::new("knows", ghost, other))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Domain(Error::SourceNotFound(_))));

        let err = store
            .create_edge(ws, NewEdge::new("knows", a.id, ghost))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(Error::TargetNotFound(id)) if id == ghost
        ));

        // A tombstoned endpoint counts as missing.
        store.soft_delete_entity(ws, a.id).await.unwrap();
        let b = store
            .create_entity(ws, NewEntity::new("person"))
            .await
            .unwrap();
        let err = store
            .create_edge(ws, NewEdge::new("knows", a.id, b.id))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Domain(Error::SourceNotFound(_))));
    }

    #[tokio::test]
    async fn test_list_entities_order_and_paging() {
        let store = MemoryGraphStore::new();
        let ws = WorkspaceId::new();
        let mut ids = Vec::new();
        for i in 0..5 {
            let entity = store
                .create_entity(ws, NewEntity::new("doc").with_property("n", i))
                .await
                .unwrap();
            ids.push(entity.id);
        }

        let all = store.list_entities(ws, &EntityFilter::default()).await.unwrap();
        assert_eq!(all.len(), 5);
        // Newest first: creation order reversed.
        let listed: Vec<EntityId> = all.iter().map(|e| e.id).collect();
        let mut expected = ids.clone();
        expected.reverse();
        assert_eq!(listed, expected);

        let page = store
            .list_entities(ws, &EntityFilter::default().with_page(2, 1))
            .await
            .unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].id, expected[1]);

        let typed = store
            .list_entities(ws, &EntityFilter::default().with_type("other"))
            .await
            .unwrap();
        assert!(typed.is_empty());
    }

    #[tokio::test]
    async fn test_list_excludes_tombstones_by_default() {
        let store = MemoryGraphStore::new();
        let ws = WorkspaceId::new();
        let (a, _, _) = seed_pair(&store, ws).await;
        store.soft_delete_entity(ws, a.id).await.unwrap();

        let live = store.list_entities(ws, &EntityFilter::default()).await.unwrap();
        assert_eq!(live.len(), 1);
        let all = store
            .list_entities(ws, &EntityFilter::default().include_deleted())
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let live_edges = store.list_edges(ws, &EdgeFilter::default()).await.unwrap();
        assert!(live_edges.is_empty());
        let all_edges = store
            .list_edges(ws, &EdgeFilter::default().include_deleted())
            .await
            .unwrap();
        assert_eq!(all_edges.len(), 1);
    }

    #[tokio::test]
    async fn test_neighbors_and_traverse_through_store() {
        let store = MemoryGraphStore::new();
        let ws = WorkspaceId::new();
        let a = store.create_entity(ws, NewEntity::new("n")).await.unwrap();
        let b = store.create_entity(ws, NewEntity::new("n")).await.unwrap();
        let c = store.create_entity(ws, NewEntity::new("n")).await.unwrap();
        store
            .create_edge(ws, NewEdge::new("next", a.id, b.id))
            .await
            .unwrap();
        store
            .create_edge(ws, NewEdge::new("next", b.id, c.id))
            .await
            .unwrap();

        let neighbors = store
            .neighbors(ws, b.id, &NeighborOptions::default())
            .await
            .unwrap();
        assert_eq!(neighbors.len(), 2);

        let out_only = store
            .neighbors(
                ws,
                b.id,
                &NeighborOptions::default().with_direction(Direction::Out),
            )
            .await
            .unwrap();
        assert_eq!(out_only.len(), 1);
        assert_eq!(out_only[0].id, c.id);

        let reached = store
            .traverse(ws, a.id, &TraverseOptions::default().with_depth(1))
            .await
            .unwrap();
        assert_eq!(reached.len(), 2);

        let paths = store.find_paths(ws, a.id, c.id, 5).await.unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].nodes, vec![a.id, b.id, c.id]);
    }

    #[tokio::test]
    #[should_panic(expected = "outside [1, 10]")]
    async fn test_traverse_depth_precondition() {
        let store = MemoryGraphStore::new();
        let ws = WorkspaceId::new();
        let a = store.create_entity(ws, NewEntity::new("n")).await.unwrap();
        let _ = store
            .traverse(ws, a.id, &TraverseOptions::default().with_depth(11))
            .await;
    }

    #[tokio::test]
    async fn test_bulk_create_edges_atomic_vs_partial() {
        let store = MemoryGraphStore::new();
        let ws = WorkspaceId::new();
        let a = store.create_entity(ws, NewEntity::new("n")).await.unwrap();
        let b = store.create_entity(ws, NewEntity::new("n")).await.unwrap();
        let ghost = EntityId::new();

        let items = vec![
            NewEdge::new("next", a.id, b.id),
            NewEdge::new("next", a.id, ghost),
            NewEdge::new("next", b.id, a.id),
        ];

        // Atomic: nothing created, one error at index 1.
        let err = store
            .bulk_create_edges(ws, items.clone(), BulkMode::Atomic)
            .await
            .unwrap_err();
        match err {
            StoreError::Domain(Error::Validation(issues)) => {
                assert_eq!(issues.len(), 1);
                assert_eq!(issues[0].index, Some(1));
                assert_eq!(issues[0].message, "target_not_found");
            }
            other => panic!("expected validation error, got {other}"),
        }
        assert!(store.list_edges(ws, &EdgeFilter::default()).await.unwrap().is_empty());

        // Partial: first and third created, index 1 reported.
        let outcome = store
            .bulk_create_edges(ws, items, BulkMode::Partial)
            .await
            .unwrap();
        assert!(!outcome.is_complete());
        assert_eq!(outcome.created().len(), 2);
        assert_eq!(outcome.errors().len(), 1);
        assert_eq!(outcome.errors()[0].index, 1);
        assert_eq!(outcome.errors()[0].reason, BulkReason::TargetNotFound);

        // All-valid batch comes back complete.
        let outcome = store
            .bulk_create_edges(ws, vec![NewEdge::new("next", b.id, a.id)], BulkMode::Partial)
            .await
            .unwrap();
        assert!(outcome.is_complete());
    }

    #[tokio::test]
    async fn test_bulk_guards() {
        let store = MemoryGraphStore::new();
        let ws = WorkspaceId::new();

        let err = store.bulk_create_entities(ws, vec![]).await.unwrap_err();
        assert!(matches!(err, StoreError::Domain(Error::EmptyBatch)));

        let oversized: Vec<NewEntity> =
            (0..1001).map(|_| NewEntity::new("n")).collect();
        let err = store.bulk_create_entities(ws, oversized).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(Error::BatchTooLarge { len: 1001, max: 1000 })
        ));

        let err = store
            .bulk_create_edges(ws, vec![], BulkMode::Partial)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Domain(Error::EmptyBatch)));
    }

    #[tokio::test]
    async fn test_bulk_update_skips_unresolved() {
        let store = MemoryGraphStore::new();
        let ws = WorkspaceId::new();
        let a = store.create_entity(ws, NewEntity::new("n")).await.unwrap();
        let b = store.create_entity(ws, NewEntity::new("n")).await.unwrap();
        store.soft_delete_entity(ws, b.id).await.unwrap();

        let mut props = Properties::new();
        props.insert("k".to_string(), "v".into());
        let updates = vec![
            EntityUpdate::new(a.id, props.clone()),
            EntityUpdate::new(b.id, props.clone()),
            EntityUpdate::new(EntityId::new(), props),
        ];
        let updated = store.bulk_update_entities(ws, updates).await.unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].id, a.id);
    }

    #[tokio::test]
    async fn test_bulk_soft_delete_counts_and_batch_get() {
        let store = MemoryGraphStore::new();
        let ws = WorkspaceId::new();
        let (a, b, _) = seed_pair(&store, ws).await;
        let ghost = EntityId::new();

        let fetched = store
            .batch_get_entities(ws, &[a.id, b.id, ghost])
            .await
            .unwrap();
        assert_eq!(fetched.len(), 2);
        assert!(fetched.contains_key(&a.id));
        assert!(!fetched.contains_key(&ghost));

        let deleted = store
            .bulk_soft_delete_entities(ws, &[a.id, b.id, ghost])
            .await
            .unwrap();
        assert_eq!(deleted, 2);

        let fetched = store.batch_get_entities(ws, &[a.id, b.id]).await.unwrap();
        assert!(fetched.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_writers_same_entity() {
        use std::sync::Arc;

        let store = Arc::new(MemoryGraphStore::new());
        let ws = WorkspaceId::new();
        let entity = store.create_entity(ws, NewEntity::new("n")).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = Arc::clone(&store);
            let id = entity.id;
            handles.push(tokio::spawn(async move {
                let mut props = Properties::new();
                props.insert("writer".to_string(), i.into());
                store.update_entity(ws, id, props).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // One writer's full map won; no interleaved state.
        let final_state = store.get_entity(ws, entity.id, false).await.unwrap();
        assert_eq!(final_state.properties.len(), 1);
        assert!(final_state.properties.contains_key("writer"));
    }
}
