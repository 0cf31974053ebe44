//! Workspace (tenancy) identifier

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unique identifier for a workspace
///
/// Every entity, edge, and schema definition is exclusively owned by
/// one workspace; no operation ever crosses workspace boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkspaceId(pub Ulid);

impl WorkspaceId {
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    pub fn from_string(s: &str) -> Result<Self, ulid::DecodeError> {
        Ok(Self(Ulid::from_string(s)?))
    }
}

impl Default for WorkspaceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_id_roundtrip() {
        let id = WorkspaceId::new();
        let parsed = WorkspaceId::from_string(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }
}
