//! Trellis Store - Storage backends for the graph store
//!
//! One [`GraphStore`] trait, two interchangeable implementations: the
//! in-process [`MemoryGraphStore`] and the [`RemoteGraphStore`] that
//! speaks parameterized statements through a [`GraphTransport`].
//! The schema registry lives here too, over its own [`SchemaBackend`]
//! persistence boundary.

pub mod bulk;
pub mod cypher;
pub mod error;
pub mod memory;
pub mod registry;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use bulk::{BulkItemError, BulkMode, BulkOutcome, BulkReason};
pub use cypher::{GraphTransport, RemoteGraphStore, Row, Statement};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryGraphStore;
pub use registry::{MemorySchemaBackend, SchemaBackend, SchemaRegistry};
pub use traits::{CascadeOutcome, GraphStore};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteSchemaBackend;
