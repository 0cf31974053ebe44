//! Transport boundary for the remote backend

use crate::cypher::statement::Statement;
use crate::error::StoreResult;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

/// One result row: column name to value
pub type Row = HashMap<String, Value>;

/// Driver boundary for a backing graph database
///
/// Implementations wrap whatever client the deployment uses and map
/// driver failures to [`crate::StoreError::Backend`]. The store issues
/// exactly one `execute` per logical operation (bulk edge creation
/// adds one batched validation round-trip) and never retries; retry
/// policy belongs to callers.
#[async_trait]
pub trait GraphTransport: Send + Sync {
    /// Run one parameterized statement and return its rows
    async fn execute(&self, statement: Statement) -> StoreResult<Vec<Row>>;
}
