//! Remote graph backend over a [`GraphTransport`]
//!
//! Entities are `(:Entity)` nodes and edges are `[:EDGE]`
//! relationships; property bags travel as JSON text in a single
//! `properties` field and timestamps as RFC 3339 strings, so every
//! stored value is a plain scalar. Ids and timestamps are generated
//! client-side, which keeps this backend's observable behavior
//! identical to the in-process store.

use crate::bulk::{atomic_rejection, BulkItemError, BulkMode, BulkOutcome, BulkReason};
use crate::cypher::statement::Statement;
use crate::cypher::transport::{GraphTransport, Row};
use crate::error::{StoreError, StoreResult};
use crate::traits::{CascadeOutcome, GraphStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use trellis_core::limits::{assert_depth, check_batch_size};
use trellis_core::{
    Direction, Edge, EdgeFilter, EdgeId, Entity, EntityFilter, EntityId, EntityUpdate, Error,
    NeighborOptions, NewEdge, NewEntity, Path, Properties, TraverseOptions, WorkspaceId,
};

/// Graph store backed by an external graph database
pub struct RemoteGraphStore {
    transport: Arc<dyn GraphTransport>,
}

impl RemoteGraphStore {
    pub fn new(transport: Arc<dyn GraphTransport>) -> Self {
        Self { transport }
    }

    async fn execute(&self, statement: Statement) -> StoreResult<Vec<Row>> {
        tracing::debug!(query = statement.text(), "executing statement");
        self.transport.execute(statement).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Encoding and decoding
// ─────────────────────────────────────────────────────────────────────────────

fn malformed(detail: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(format!("malformed row: {}", detail))
}

fn str_field<'a>(value: &'a Value, field: &str) -> StoreResult<&'a str> {
    value
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| malformed(format!("missing string field `{}`", field)))
}

fn time_field(value: &Value, field: &str) -> StoreResult<DateTime<Utc>> {
    let raw = str_field(value, field)?;
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| malformed(format!("bad timestamp in `{}`: {}", field, e)))
}

fn opt_time_field(value: &Value, field: &str) -> StoreResult<Option<DateTime<Utc>>> {
    match value.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(_) => time_field(value, field).map(Some),
    }
}

fn props_field(value: &Value) -> StoreResult<Properties> {
    let raw = str_field(value, "properties")?;
    serde_json::from_str(raw).map_err(|e| malformed(format!("bad properties payload: {}", e)))
}

fn entity_from_value(value: &Value) -> StoreResult<Entity> {
    Ok(Entity {
        id: EntityId::from_string(str_field(value, "id")?)
            .map_err(|e| malformed(format!("bad entity id: {}", e)))?,
        workspace_id: WorkspaceId::from_string(str_field(value, "workspace_id")?)
            .map_err(|e| malformed(format!("bad workspace id: {}", e)))?,
        entity_type: str_field(value, "entity_type")?.to_string(),
        properties: props_field(value)?,
        created_at: time_field(value, "created_at")?,
        updated_at: time_field(value, "updated_at")?,
        deleted_at: opt_time_field(value, "deleted_at")?,
    })
}

fn edge_from_value(value: &Value) -> StoreResult<Edge> {
    Ok(Edge {
        id: EdgeId::from_string(str_field(value, "id")?)
            .map_err(|e| malformed(format!("bad edge id: {}", e)))?,
        workspace_id: WorkspaceId::from_string(str_field(value, "workspace_id")?)
            .map_err(|e| malformed(format!("bad workspace id: {}", e)))?,
        edge_type: str_field(value, "edge_type")?.to_string(),
        source_id: EntityId::from_string(str_field(value, "source_id")?)
            .map_err(|e| malformed(format!("bad source id: {}", e)))?,
        target_id: EntityId::from_string(str_field(value, "target_id")?)
            .map_err(|e| malformed(format!("bad target id: {}", e)))?,
        properties: props_field(value)?,
        created_at: time_field(value, "created_at")?,
        updated_at: time_field(value, "updated_at")?,
        deleted_at: opt_time_field(value, "deleted_at")?,
    })
}

fn column<'a>(row: &'a Row, name: &str) -> StoreResult<&'a Value> {
    row.get(name)
        .ok_or_else(|| malformed(format!("missing column `{}`", name)))
}

fn bool_column(row: &Row, name: &str) -> StoreResult<bool> {
    column(row, name)?
        .as_bool()
        .ok_or_else(|| malformed(format!("column `{}` is not a boolean", name)))
}

fn count_column(row: &Row, name: &str) -> StoreResult<usize> {
    column(row, name)?
        .as_u64()
        .map(|n| n as usize)
        .ok_or_else(|| malformed(format!("column `{}` is not a count", name)))
}

fn entity_rows(rows: &[Row]) -> StoreResult<Vec<Entity>> {
    let mut entities = Vec::new();
    for row in rows {
        match row.get("entity") {
            None | Some(Value::Null) => continue,
            Some(value) => entities.push(entity_from_value(value)?),
        }
    }
    Ok(entities)
}

fn edge_rows(rows: &[Row]) -> StoreResult<Vec<Edge>> {
    let mut edges = Vec::new();
    for row in rows {
        match row.get("edge") {
            None | Some(Value::Null) => continue,
            Some(value) => edges.push(edge_from_value(value)?),
        }
    }
    Ok(edges)
}

fn path_from_value(value: &Value) -> StoreResult<Option<Path>> {
    let nodes = match value.get("nodes") {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Array(nodes)) if nodes.is_empty() => return Ok(None),
        Some(Value::Array(nodes)) => nodes,
        Some(_) => return Err(malformed("path nodes is not a list")),
    };
    let edges = value
        .get("edges")
        .and_then(Value::as_array)
        .ok_or_else(|| malformed("path edges is not a list"))?;

    let mut node_ids = Vec::with_capacity(nodes.len());
    for node in nodes {
        let raw = node.as_str().ok_or_else(|| malformed("path node id is not a string"))?;
        node_ids.push(
            EntityId::from_string(raw).map_err(|e| malformed(format!("bad path node id: {}", e)))?,
        );
    }
    let mut edge_ids = Vec::with_capacity(edges.len());
    for edge in edges {
        let raw = edge.as_str().ok_or_else(|| malformed("path edge id is not a string"))?;
        edge_ids.push(
            EdgeId::from_string(raw).map_err(|e| malformed(format!("bad path edge id: {}", e)))?,
        );
    }
    Ok(Some(Path {
        nodes: node_ids,
        edges: edge_ids,
    }))
}

fn entity_row_value(workspace_id: WorkspaceId, entity: &Entity) -> StoreResult<Value> {
    Ok(json!({
        "id": entity.id.to_string(),
        "workspace_id": workspace_id.to_string(),
        "entity_type": entity.entity_type,
        "properties": serde_json::to_string(&entity.properties)?,
        "created_at": entity.created_at.to_rfc3339(),
        "updated_at": entity.updated_at.to_rfc3339(),
    }))
}

fn edge_row_value(workspace_id: WorkspaceId, edge: &Edge) -> StoreResult<Value> {
    Ok(json!({
        "id": edge.id.to_string(),
        "workspace_id": workspace_id.to_string(),
        "edge_type": edge.edge_type,
        "source_id": edge.source_id.to_string(),
        "target_id": edge.target_id.to_string(),
        "properties": serde_json::to_string(&edge.properties)?,
        "created_at": edge.created_at.to_rfc3339(),
        "updated_at": edge.updated_at.to_rfc3339(),
    }))
}

/// One-hop relationship pattern for the given direction filter
fn hop_pattern(direction: Direction) -> &'static str {
    match direction {
        Direction::Out => "-[r:EDGE]->",
        Direction::In => "<-[r:EDGE]-",
        Direction::Both => "-[r:EDGE]-",
    }
}

/// Variable-length pattern; the depth has passed `assert_depth`, so
/// splicing it into the text is a bound small integer, never data.
fn span_pattern(direction: Direction, depth: u32) -> String {
    match direction {
        Direction::Out => format!("-[rs:EDGE*1..{}]->", depth),
        Direction::In => format!("<-[rs:EDGE*1..{}]-", depth),
        Direction::Both => format!("-[rs:EDGE*1..{}]-", depth),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// GraphStore implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl GraphStore for RemoteGraphStore {
    async fn create_entity(
        &self,
        workspace_id: WorkspaceId,
        new: NewEntity,
    ) -> StoreResult<Entity> {
        let entity = Entity::new(workspace_id, new.entity_type, new.properties);
        let stmt = Statement::new(
            "CREATE (e:Entity {id: $id, workspace_id: $workspace_id, \
             entity_type: $entity_type, properties: $properties, \
             created_at: $created_at, updated_at: $updated_at})",
        )
        .bind("id", entity.id.to_string())
        .bind("workspace_id", workspace_id.to_string())
        .bind("entity_type", entity.entity_type.clone())
        .bind("properties", serde_json::to_string(&entity.properties)?)
        .bind("created_at", entity.created_at.to_rfc3339())
        .bind("updated_at", entity.updated_at.to_rfc3339());
        self.execute(stmt).await?;
        Ok(entity)
    }

    async fn get_entity(
        &self,
        workspace_id: WorkspaceId,
        id: EntityId,
        include_deleted: bool,
    ) -> StoreResult<Entity> {
        let stmt = Statement::new(
            "MATCH (e:Entity {workspace_id: $workspace_id, id: $id}) \
             WHERE $include_deleted OR e.deleted_at IS NULL \
             RETURN e { .* } AS entity",
        )
        .bind("workspace_id", workspace_id.to_string())
        .bind("id", id.to_string())
        .bind("include_deleted", include_deleted);
        let rows = self.execute(stmt).await?;
        entity_rows(&rows)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::EntityNotFound(id).into())
    }

    async fn list_entities(
        &self,
        workspace_id: WorkspaceId,
        filter: &EntityFilter,
    ) -> StoreResult<Vec<Entity>> {
        let mut text = String::from(
            "MATCH (e:Entity {workspace_id: $workspace_id}) \
             WHERE ($include_deleted OR e.deleted_at IS NULL)",
        );
        if filter.entity_type.is_some() {
            text.push_str(" AND e.entity_type = $entity_type");
        }
        text.push_str(
            " RETURN e { .* } AS entity \
             ORDER BY e.created_at DESC, e.id DESC \
             SKIP $offset LIMIT $limit",
        );
        let mut stmt = Statement::new(text)
            .bind("workspace_id", workspace_id.to_string())
            .bind("include_deleted", filter.include_deleted)
            .bind("offset", filter.offset)
            .bind("limit", filter.limit);
        if let Some(entity_type) = &filter.entity_type {
            stmt = stmt.bind("entity_type", entity_type.clone());
        }
        let rows = self.execute(stmt).await?;
        entity_rows(&rows)
    }

    async fn update_entity(
        &self,
        workspace_id: WorkspaceId,
        id: EntityId,
        properties: Properties,
    ) -> StoreResult<Entity> {
        let stmt = Statement::new(
            "MATCH (e:Entity {workspace_id: $workspace_id, id: $id}) \
             WHERE e.deleted_at IS NULL \
             SET e.properties = $properties, e.updated_at = $updated_at \
             RETURN e { .* } AS entity",
        )
        .bind("workspace_id", workspace_id.to_string())
        .bind("id", id.to_string())
        .bind("properties", serde_json::to_string(&properties)?)
        .bind("updated_at", Utc::now().to_rfc3339());
        let rows = self.execute(stmt).await?;
        entity_rows(&rows)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::EntityNotFound(id).into())
    }

    async fn soft_delete_entity(
        &self,
        workspace_id: WorkspaceId,
        id: EntityId,
    ) -> StoreResult<CascadeOutcome> {
        let stmt = Statement::new(
            "MATCH (e:Entity {workspace_id: $workspace_id, id: $id}) \
             WHERE e.deleted_at IS NULL \
             SET e.deleted_at = $now, e.updated_at = $now \
             WITH e \
             OPTIONAL MATCH (e)-[r:EDGE]-() \
             WHERE r.deleted_at IS NULL \
             SET r.deleted_at = $now, r.updated_at = $now \
             RETURN e { .* } AS entity, count(r) AS deleted_edges",
        )
        .bind("workspace_id", workspace_id.to_string())
        .bind("id", id.to_string())
        .bind("now", Utc::now().to_rfc3339());
        let rows = self.execute(stmt).await?;
        let row = rows
            .first()
            .ok_or(Error::EntityNotFound(id))?;
        Ok(CascadeOutcome {
            entity: entity_from_value(column(row, "entity")?)?,
            deleted_edge_count: count_column(row, "deleted_edges")?,
        })
    }

    async fn create_edge(&self, workspace_id: WorkspaceId, new: NewEdge) -> StoreResult<Edge> {
        let edge = Edge::new(
            workspace_id,
            new.edge_type,
            new.source_id,
            new.target_id,
            new.properties,
        );
        let stmt = Statement::new(
            "OPTIONAL MATCH (s:Entity {workspace_id: $workspace_id, id: $source_id}) \
             WHERE s.deleted_at IS NULL \
             OPTIONAL MATCH (t:Entity {workspace_id: $workspace_id, id: $target_id}) \
             WHERE t.deleted_at IS NULL \
             FOREACH (_ IN CASE WHEN s IS NOT NULL AND t IS NOT NULL THEN [1] ELSE [] END | \
               CREATE (s)-[:EDGE {id: $id, workspace_id: $workspace_id, edge_type: $edge_type, \
                 source_id: $source_id, target_id: $target_id, properties: $properties, \
                 created_at: $created_at, updated_at: $updated_at}]->(t)) \
             RETURN s IS NOT NULL AS source_ok, t IS NOT NULL AS target_ok",
        )
        .bind("workspace_id", workspace_id.to_string())
        .bind("id", edge.id.to_string())
        .bind("edge_type", edge.edge_type.clone())
        .bind("source_id", edge.source_id.to_string())
        .bind("target_id", edge.target_id.to_string())
        .bind("properties", serde_json::to_string(&edge.properties)?)
        .bind("created_at", edge.created_at.to_rfc3339())
        .bind("updated_at", edge.updated_at.to_rfc3339());
        let rows = self.execute(stmt).await?;
        let row = rows
            .first()
            .ok_or_else(|| malformed("endpoint check returned no rows"))?;
        if !bool_column(row, "source_ok")? {
            return Err(Error::SourceNotFound(edge.source_id).into());
        }
        if !bool_column(row, "target_ok")? {
            return Err(Error::TargetNotFound(edge.target_id).into());
        }
        Ok(edge)
    }

    async fn get_edge(
        &self,
        workspace_id: WorkspaceId,
        id: EdgeId,
        include_deleted: bool,
    ) -> StoreResult<Edge> {
        let stmt = Statement::new(
            "MATCH ()-[r:EDGE {workspace_id: $workspace_id, id: $id}]->() \
             WHERE $include_deleted OR r.deleted_at IS NULL \
             RETURN r { .* } AS edge",
        )
        .bind("workspace_id", workspace_id.to_string())
        .bind("id", id.to_string())
        .bind("include_deleted", include_deleted);
        let rows = self.execute(stmt).await?;
        edge_rows(&rows)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::EdgeNotFound(id).into())
    }

    async fn list_edges(
        &self,
        workspace_id: WorkspaceId,
        filter: &EdgeFilter,
    ) -> StoreResult<Vec<Edge>> {
        let mut text = String::from(
            "MATCH ()-[r:EDGE {workspace_id: $workspace_id}]->() \
             WHERE ($include_deleted OR r.deleted_at IS NULL)",
        );
        if filter.edge_type.is_some() {
            text.push_str(" AND r.edge_type = $edge_type");
        }
        text.push_str(
            " RETURN r { .* } AS edge \
             ORDER BY r.created_at DESC, r.id DESC \
             SKIP $offset LIMIT $limit",
        );
        let mut stmt = Statement::new(text)
            .bind("workspace_id", workspace_id.to_string())
            .bind("include_deleted", filter.include_deleted)
            .bind("offset", filter.offset)
            .bind("limit", filter.limit);
        if let Some(edge_type) = &filter.edge_type {
            stmt = stmt.bind("edge_type", edge_type.clone());
        }
        let rows = self.execute(stmt).await?;
        edge_rows(&rows)
    }

    async fn update_edge(
        &self,
        workspace_id: WorkspaceId,
        id: EdgeId,
        properties: Properties,
    ) -> StoreResult<Edge> {
        let stmt = Statement::new(
            "MATCH ()-[r:EDGE {workspace_id: $workspace_id, id: $id}]->() \
             WHERE r.deleted_at IS NULL \
             SET r.properties = $properties, r.updated_at = $updated_at \
             RETURN r { .* } AS edge",
        )
        .bind("workspace_id", workspace_id.to_string())
        .bind("id", id.to_string())
        .bind("properties", serde_json::to_string(&properties)?)
        .bind("updated_at", Utc::now().to_rfc3339());
        let rows = self.execute(stmt).await?;
        edge_rows(&rows)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::EdgeNotFound(id).into())
    }

    async fn soft_delete_edge(&self, workspace_id: WorkspaceId, id: EdgeId) -> StoreResult<Edge> {
        let stmt = Statement::new(
            "MATCH ()-[r:EDGE {workspace_id: $workspace_id, id: $id}]->() \
             WHERE r.deleted_at IS NULL \
             SET r.deleted_at = $now, r.updated_at = $now \
             RETURN r { .* } AS edge",
        )
        .bind("workspace_id", workspace_id.to_string())
        .bind("id", id.to_string())
        .bind("now", Utc::now().to_rfc3339());
        let rows = self.execute(stmt).await?;
        edge_rows(&rows)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::EdgeNotFound(id).into())
    }

    async fn neighbors(
        &self,
        workspace_id: WorkspaceId,
        entity_id: EntityId,
        options: &NeighborOptions,
    ) -> StoreResult<Vec<Entity>> {
        let text = format!(
            "MATCH (e:Entity {{workspace_id: $workspace_id, id: $id}}) \
             WHERE e.deleted_at IS NULL \
             OPTIONAL MATCH (e){}(n:Entity) \
             WHERE r.deleted_at IS NULL AND n.deleted_at IS NULL \
               AND ($edge_type IS NULL OR r.edge_type = $edge_type) \
             RETURN DISTINCT n {{ .* }} AS entity",
            hop_pattern(options.direction),
        );
        let stmt = Statement::new(text)
            .bind("workspace_id", workspace_id.to_string())
            .bind("id", entity_id.to_string())
            .bind("edge_type", options.edge_type.clone());
        let rows = self.execute(stmt).await?;
        if rows.is_empty() {
            // The origin match produced nothing; OPTIONAL MATCH would
            // otherwise have yielded at least one null-neighbor row.
            return Err(Error::EntityNotFound(entity_id).into());
        }
        entity_rows(&rows)
    }

    async fn find_paths(
        &self,
        workspace_id: WorkspaceId,
        source_id: EntityId,
        target_id: EntityId,
        max_depth: u32,
    ) -> StoreResult<Vec<Path>> {
        assert_depth(max_depth);
        if source_id == target_id {
            let entity = self.get_entity(workspace_id, source_id, false).await?;
            return Ok(vec![Path {
                nodes: vec![entity.id],
                edges: vec![],
            }]);
        }
        let text = format!(
            "OPTIONAL MATCH (s:Entity {{workspace_id: $workspace_id, id: $source_id}}) \
             WHERE s.deleted_at IS NULL \
             OPTIONAL MATCH (t:Entity {{workspace_id: $workspace_id, id: $target_id}}) \
             WHERE t.deleted_at IS NULL \
             OPTIONAL MATCH p = allShortestPaths((s)-[:EDGE*1..{}]-(t)) \
             WHERE all(r IN relationships(p) WHERE r.deleted_at IS NULL) \
               AND all(n IN nodes(p) WHERE n.deleted_at IS NULL) \
             RETURN s IS NOT NULL AS source_ok, t IS NOT NULL AS target_ok, \
               collect({{nodes: [n IN nodes(p) | n.id], edges: [r IN relationships(p) | r.id]}}) AS paths",
            max_depth,
        );
        let stmt = Statement::new(text)
            .bind("workspace_id", workspace_id.to_string())
            .bind("source_id", source_id.to_string())
            .bind("target_id", target_id.to_string());
        let rows = self.execute(stmt).await?;
        let row = rows
            .first()
            .ok_or_else(|| malformed("path query returned no rows"))?;
        if !bool_column(row, "source_ok")? {
            return Err(Error::EntityNotFound(source_id).into());
        }
        if !bool_column(row, "target_ok")? {
            return Err(Error::EntityNotFound(target_id).into());
        }
        let raw_paths = column(row, "paths")?
            .as_array()
            .ok_or_else(|| malformed("paths column is not a list"))?;
        let mut paths = Vec::new();
        for raw in raw_paths {
            if let Some(path) = path_from_value(raw)? {
                paths.push(path);
            }
        }
        paths.sort_by(|a, b| a.nodes.cmp(&b.nodes));
        Ok(paths)
    }

    async fn traverse(
        &self,
        workspace_id: WorkspaceId,
        start_id: EntityId,
        options: &TraverseOptions,
    ) -> StoreResult<Vec<Entity>> {
        assert_depth(options.max_depth);
        let text = format!(
            "MATCH (s:Entity {{workspace_id: $workspace_id, id: $id}}) \
             WHERE s.deleted_at IS NULL \
             OPTIONAL MATCH p = (s){}(n:Entity) \
             WHERE n.deleted_at IS NULL \
               AND all(r IN rs WHERE r.deleted_at IS NULL \
                 AND ($edge_type IS NULL OR r.edge_type = $edge_type)) \
               AND all(m IN nodes(p) WHERE m.deleted_at IS NULL) \
             RETURN s {{ .* }} AS start, collect(DISTINCT n {{ .* }}) AS found",
            span_pattern(options.direction, options.max_depth),
        );
        let stmt = Statement::new(text)
            .bind("workspace_id", workspace_id.to_string())
            .bind("id", start_id.to_string())
            .bind("edge_type", options.edge_type.clone());
        let rows = self.execute(stmt).await?;
        let row = rows
            .first()
            .ok_or(Error::EntityNotFound(start_id))?;

        let start = entity_from_value(column(row, "start")?)?;
        let found = column(row, "found")?
            .as_array()
            .ok_or_else(|| malformed("found column is not a list"))?;

        let mut seen = std::collections::HashSet::new();
        seen.insert(start.id);
        let mut result = vec![start];
        for raw in found {
            if result.len() >= options.limit {
                break;
            }
            if raw.is_null() {
                continue;
            }
            let entity = entity_from_value(raw)?;
            if seen.insert(entity.id) {
                result.push(entity);
            }
        }
        result.truncate(options.limit);
        Ok(result)
    }

    async fn bulk_create_entities(
        &self,
        workspace_id: WorkspaceId,
        items: Vec<NewEntity>,
    ) -> StoreResult<Vec<Entity>> {
        check_batch_size(items.len())?;
        let entities: Vec<Entity> = items
            .into_iter()
            .map(|new| Entity::new(workspace_id, new.entity_type, new.properties))
            .collect();
        let rows: Vec<Value> = entities
            .iter()
            .map(|e| entity_row_value(workspace_id, e))
            .collect::<StoreResult<_>>()?;
        let stmt = Statement::new(
            "UNWIND $rows AS row \
             CREATE (e:Entity {id: row.id, workspace_id: row.workspace_id, \
               entity_type: row.entity_type, properties: row.properties, \
               created_at: row.created_at, updated_at: row.updated_at})",
        )
        .bind("rows", Value::Array(rows));
        self.execute(stmt).await?;
        Ok(entities)
    }

    async fn bulk_create_edges(
        &self,
        workspace_id: WorkspaceId,
        items: Vec<NewEdge>,
        mode: BulkMode,
    ) -> StoreResult<BulkOutcome<Edge>> {
        check_batch_size(items.len())?;

        // Round-trip 1: batched endpoint validation.
        let check_rows: Vec<Value> = items
            .iter()
            .enumerate()
            .map(|(index, new)| {
                json!({
                    "index": index,
                    "source_id": new.source_id.to_string(),
                    "target_id": new.target_id.to_string(),
                })
            })
            .collect();
        let stmt = Statement::new(
            "UNWIND $rows AS row \
             OPTIONAL MATCH (s:Entity {workspace_id: $workspace_id, id: row.source_id}) \
             WHERE s.deleted_at IS NULL \
             OPTIONAL MATCH (t:Entity {workspace_id: $workspace_id, id: row.target_id}) \
             WHERE t.deleted_at IS NULL \
             RETURN row.index AS index, s IS NOT NULL AS source_ok, t IS NOT NULL AS target_ok",
        )
        .bind("workspace_id", workspace_id.to_string())
        .bind("rows", Value::Array(check_rows));
        let rows = self.execute(stmt).await?;

        let mut failed: HashMap<usize, BulkReason> = HashMap::new();
        for row in &rows {
            let index = count_column(row, "index")?;
            if !bool_column(row, "source_ok")? {
                failed.insert(index, BulkReason::SourceNotFound);
            } else if !bool_column(row, "target_ok")? {
                failed.insert(index, BulkReason::TargetNotFound);
            }
        }
        let mut errors: Vec<BulkItemError> = failed
            .iter()
            .map(|(index, reason)| BulkItemError::new(*index, *reason))
            .collect();
        errors.sort_by_key(|e| e.index);

        if mode == BulkMode::Atomic && !errors.is_empty() {
            return Err(atomic_rejection(errors).into());
        }

        let edges: Vec<Edge> = items
            .into_iter()
            .enumerate()
            .filter(|(index, _)| !failed.contains_key(index))
            .map(|(_, new)| {
                Edge::new(
                    workspace_id,
                    new.edge_type,
                    new.source_id,
                    new.target_id,
                    new.properties,
                )
            })
            .collect();

        if !edges.is_empty() {
            // Round-trip 2: batched creation of the validated items.
            let rows: Vec<Value> = edges
                .iter()
                .map(|e| edge_row_value(workspace_id, e))
                .collect::<StoreResult<_>>()?;
            let stmt = Statement::new(
                "UNWIND $rows AS row \
                 MATCH (s:Entity {workspace_id: $workspace_id, id: row.source_id}) \
                 MATCH (t:Entity {workspace_id: $workspace_id, id: row.target_id}) \
                 CREATE (s)-[:EDGE {id: row.id, workspace_id: row.workspace_id, \
                   edge_type: row.edge_type, source_id: row.source_id, target_id: row.target_id, \
                   properties: row.properties, created_at: row.created_at, \
                   updated_at: row.updated_at}]->(t)",
            )
            .bind("workspace_id", workspace_id.to_string())
            .bind("rows", Value::Array(rows));
            self.execute(stmt).await?;
        }

        Ok(BulkOutcome::from_parts(edges, errors))
    }

    async fn bulk_update_entities(
        &self,
        workspace_id: WorkspaceId,
        items: Vec<EntityUpdate>,
    ) -> StoreResult<Vec<Entity>> {
        check_batch_size(items.len())?;
        let rows: Vec<Value> = items
            .iter()
            .map(|item| {
                Ok(json!({
                    "id": item.id.to_string(),
                    "properties": serde_json::to_string(&item.properties)?,
                }))
            })
            .collect::<StoreResult<_>>()?;
        let stmt = Statement::new(
            "UNWIND $rows AS row \
             MATCH (e:Entity {workspace_id: $workspace_id, id: row.id}) \
             WHERE e.deleted_at IS NULL \
             SET e.properties = row.properties, e.updated_at = $updated_at \
             RETURN e { .* } AS entity",
        )
        .bind("workspace_id", workspace_id.to_string())
        .bind("rows", Value::Array(rows))
        .bind("updated_at", Utc::now().to_rfc3339());
        let rows = self.execute(stmt).await?;
        // Unresolved ids simply produce no row.
        entity_rows(&rows)
    }

    async fn bulk_soft_delete_entities(
        &self,
        workspace_id: WorkspaceId,
        ids: &[EntityId],
    ) -> StoreResult<usize> {
        check_batch_size(ids.len())?;
        let id_values: Vec<Value> = ids.iter().map(|id| Value::from(id.to_string())).collect();
        let stmt = Statement::new(
            "UNWIND $ids AS id \
             MATCH (e:Entity {workspace_id: $workspace_id, id: id}) \
             WHERE e.deleted_at IS NULL \
             SET e.deleted_at = $now, e.updated_at = $now \
             WITH DISTINCT e \
             OPTIONAL MATCH (e)-[r:EDGE]-() \
             WHERE r.deleted_at IS NULL \
             SET r.deleted_at = $now, r.updated_at = $now \
             RETURN count(DISTINCT e) AS deleted",
        )
        .bind("workspace_id", workspace_id.to_string())
        .bind("ids", Value::Array(id_values))
        .bind("now", Utc::now().to_rfc3339());
        let rows = self.execute(stmt).await?;
        match rows.first() {
            Some(row) => count_column(row, "deleted"),
            None => Ok(0),
        }
    }

    async fn batch_get_entities(
        &self,
        workspace_id: WorkspaceId,
        ids: &[EntityId],
    ) -> StoreResult<HashMap<EntityId, Entity>> {
        check_batch_size(ids.len())?;
        let id_values: Vec<Value> = ids.iter().map(|id| Value::from(id.to_string())).collect();
        let stmt = Statement::new(
            "UNWIND $ids AS id \
             MATCH (e:Entity {workspace_id: $workspace_id, id: id}) \
             WHERE e.deleted_at IS NULL \
             RETURN e { .* } AS entity",
        )
        .bind("workspace_id", workspace_id.to_string())
        .bind("ids", Value::Array(id_values));
        let rows = self.execute(stmt).await?;
        Ok(entity_rows(&rows)?
            .into_iter()
            .map(|e| (e.id, e))
            .collect())
    }
}
