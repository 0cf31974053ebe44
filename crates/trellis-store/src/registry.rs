//! Workspace schema registry with optimistic concurrency
//!
//! The registry owns the version discipline; backends only provide a
//! load plus a single conditional write. A successful upsert advances
//! the version by one, and a writer holding a version the store has
//! moved past gets `Stale` with the current version so it can re-read
//! and retry.

use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use trellis_core::{Error, SchemaDefinition, SchemaInput, WorkspaceId};

/// Persistence boundary for schema definitions
///
/// `store_if_version` is the whole concurrency story: it must apply
/// the write only when the stored version still equals `expected`
/// (`None` meaning "no schema exists yet"), as one atomic conditional
/// write.
#[async_trait]
pub trait SchemaBackend: Send + Sync {
    /// Load the schema for a workspace, if one is registered
    async fn load(&self, workspace_id: WorkspaceId) -> StoreResult<Option<SchemaDefinition>>;

    /// Store `schema` iff the current stored version matches `expected`
    ///
    /// Returns `false` without writing anything when the condition
    /// fails.
    async fn store_if_version(
        &self,
        schema: &SchemaDefinition,
        expected: Option<u64>,
    ) -> StoreResult<bool>;
}

/// Schema registry over a pluggable backend
pub struct SchemaRegistry<B> {
    backend: B,
}

impl<B: SchemaBackend> SchemaRegistry<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Fetch the registered schema for a workspace
    pub async fn get_schema(&self, workspace_id: WorkspaceId) -> StoreResult<SchemaDefinition> {
        self.backend
            .load(workspace_id)
            .await?
            .ok_or_else(|| Error::SchemaNotFound(workspace_id).into())
    }

    /// Create or replace the workspace schema
    ///
    /// First registration ignores any supplied version and stores the
    /// schema at version 1. Replacement requires `input.version` to
    /// match the current version exactly; on mismatch nothing is
    /// written and the error reports the version the store holds now.
    pub async fn upsert_schema(
        &self,
        workspace_id: WorkspaceId,
        input: SchemaInput,
    ) -> StoreResult<SchemaDefinition> {
        input.validate()?;

        let current = self.backend.load(workspace_id).await?;
        let (expected, next_version) = match &current {
            None => (None, 1),
            Some(existing) => {
                match input.version {
                    Some(v) if v == existing.version => {}
                    _ => {
                        return Err(Error::Stale {
                            current: existing.version,
                        }
                        .into());
                    }
                }
                (Some(existing.version), existing.version + 1)
            }
        };

        let schema = SchemaDefinition {
            workspace_id,
            entity_types: input.entity_types,
            edge_types: input.edge_types,
            version: next_version,
        };

        if self.backend.store_if_version(&schema, expected).await? {
            tracing::debug!(
                workspace_id = %workspace_id,
                version = schema.version,
                "schema upserted"
            );
            return Ok(schema);
        }

        // The conditional write lost a race; report whatever version
        // won so the caller can re-read and retry.
        let current = self
            .backend
            .load(workspace_id)
            .await?
            .map(|s| s.version)
            .unwrap_or(0);
        Err(Error::Stale { current }.into())
    }
}

/// In-process schema backend
#[derive(Default)]
pub struct MemorySchemaBackend {
    schemas: Mutex<HashMap<WorkspaceId, SchemaDefinition>>,
}

impl MemorySchemaBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, HashMap<WorkspaceId, SchemaDefinition>>> {
        self.schemas
            .lock()
            .map_err(|e| StoreError::Backend(format!("lock error: {e}")))
    }
}

#[async_trait]
impl SchemaBackend for MemorySchemaBackend {
    async fn load(&self, workspace_id: WorkspaceId) -> StoreResult<Option<SchemaDefinition>> {
        Ok(self.lock()?.get(&workspace_id).cloned())
    }

    async fn store_if_version(
        &self,
        schema: &SchemaDefinition,
        expected: Option<u64>,
    ) -> StoreResult<bool> {
        let mut schemas = self.lock()?;
        let matches = schemas.get(&schema.workspace_id).map(|s| s.version) == expected;
        if matches {
            schemas.insert(schema.workspace_id, schema.clone());
        }
        Ok(matches)
    }
}
