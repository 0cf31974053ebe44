//! SQLite-backed schema persistence
//!
//! A single `schemas` table keyed by workspace id. The type lists are
//! stored as JSON text; the conditional write is expressed directly in
//! SQL so the version check and the write are one statement.

use crate::error::{StoreError, StoreResult};
use crate::registry::SchemaBackend;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use trellis_core::{SchemaDefinition, TypeDefinition, WorkspaceId};

/// Schema backend persisting to a SQLite database
pub struct SqliteSchemaBackend {
    conn: Mutex<Connection>,
}

impl SqliteSchemaBackend {
    /// Open (or create) a database at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path).map_err(sqlite_err)?;
        Self::with_connection(conn)
    }

    /// Open a private in-memory database
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(sqlite_err)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS schemas (
                workspace_id TEXT PRIMARY KEY,
                entity_types TEXT NOT NULL,
                edge_types   TEXT NOT NULL,
                version      INTEGER NOT NULL
            )",
        )
        .map_err(sqlite_err)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Backend(format!("lock error: {e}")))
    }
}

fn sqlite_err(e: rusqlite::Error) -> StoreError {
    StoreError::Backend(format!("sqlite error: {e}"))
}

fn decode_types(raw: &str) -> StoreResult<Vec<TypeDefinition>> {
    serde_json::from_str(raw)
        .map_err(|e| StoreError::Backend(format!("corrupt schema row: {e}")))
}

#[async_trait]
impl SchemaBackend for SqliteSchemaBackend {
    async fn load(&self, workspace_id: WorkspaceId) -> StoreResult<Option<SchemaDefinition>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT entity_types, edge_types, version FROM schemas WHERE workspace_id = ?1",
                params![workspace_id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()
            .map_err(sqlite_err)?;

        match row {
            None => Ok(None),
            Some((entity_types, edge_types, version)) => Ok(Some(SchemaDefinition {
                workspace_id,
                entity_types: decode_types(&entity_types)?,
                edge_types: decode_types(&edge_types)?,
                version: version as u64,
            })),
        }
    }

    async fn store_if_version(
        &self,
        schema: &SchemaDefinition,
        expected: Option<u64>,
    ) -> StoreResult<bool> {
        let entity_types = serde_json::to_string(&schema.entity_types)?;
        let edge_types = serde_json::to_string(&schema.edge_types)?;
        let conn = self.lock()?;

        let affected = match expected {
            None => conn
                .execute(
                    "INSERT INTO schemas (workspace_id, entity_types, edge_types, version)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(workspace_id) DO NOTHING",
                    params![
                        schema.workspace_id.to_string(),
                        entity_types,
                        edge_types,
                        schema.version as i64,
                    ],
                )
                .map_err(sqlite_err)?,
            Some(version) => conn
                .execute(
                    "UPDATE schemas
                     SET entity_types = ?2, edge_types = ?3, version = ?4
                     WHERE workspace_id = ?1 AND version = ?5",
                    params![
                        schema.workspace_id.to_string(),
                        entity_types,
                        edge_types,
                        schema.version as i64,
                        version as i64,
                    ],
                )
                .map_err(sqlite_err)?,
        };
        Ok(affected == 1)
    }
}
