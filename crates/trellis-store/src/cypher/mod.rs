//! Remote graph backend
//!
//! Every logical operation becomes one parameterized statement
//! executed through the [`GraphTransport`] boundary; bulk operations
//! ride a single `UNWIND` round-trip. The concrete wire protocol
//! (Bolt, HTTP, whatever the deployment uses) lives behind the
//! transport trait and is not this crate's concern.

pub mod remote;
pub mod statement;
pub mod transport;

pub use remote::RemoteGraphStore;
pub use statement::Statement;
pub use transport::{GraphTransport, Row};
