//! Error taxonomy for Trellis Core

use crate::edge::EdgeId;
use crate::entity::EntityId;
use crate::workspace::WorkspaceId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using Trellis's Error
pub type Result<T> = std::result::Result<T, Error>;

/// One structured validation failure, optionally pinned to a field
/// and/or a batch index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            field: None,
            index: None,
            message: message.into(),
        }
    }

    pub fn for_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            index: None,
            message: message.into(),
        }
    }

    pub fn at_index(index: usize, message: impl Into<String>) -> Self {
        Self {
            field: None,
            index: Some(index),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.field, self.index) {
            (Some(field), Some(index)) => {
                write!(f, "[{}] {}: {}", index, field, self.message)
            }
            (Some(field), None) => write!(f, "{}: {}", field, self.message),
            (None, Some(index)) => write!(f, "[{}]: {}", index, self.message),
            (None, None) => write!(f, "{}", self.message),
        }
    }
}

/// Trellis error kinds
///
/// Expected conditions (not-found, validation, staleness, batch-size
/// violations) are returned as values; they are never panics.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    #[error("Edge not found: {0}")]
    EdgeNotFound(EdgeId),

    #[error("No schema registered for workspace: {0}")]
    SchemaNotFound(WorkspaceId),

    #[error("Edge source entity not found: {0}")]
    SourceNotFound(EntityId),

    #[error("Edge target entity not found: {0}")]
    TargetNotFound(EntityId),

    #[error("Validation failed: {}", format_issues(.0))]
    Validation(Vec<ValidationIssue>),

    #[error("Stale schema version: current version is {current}")]
    Stale { current: u64 },

    #[error("Batch is empty")]
    EmptyBatch,

    #[error("Batch too large: {len} items (max {max})")]
    BatchTooLarge { len: usize, max: usize },
}

impl Error {
    /// Whether this error is any of the not-found kinds
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::EntityNotFound(_)
                | Self::EdgeNotFound(_)
                | Self::SchemaNotFound(_)
                | Self::SourceNotFound(_)
                | Self::TargetNotFound(_)
        )
    }
}

fn format_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_issue_display() {
        let issue = ValidationIssue::at_index(1, "target_not_found");
        assert_eq!(issue.to_string(), "[1]: target_not_found");

        let issue = ValidationIssue::for_field("entity_types", "duplicate type name");
        assert_eq!(issue.to_string(), "entity_types: duplicate type name");
    }

    #[test]
    fn test_is_not_found() {
        assert!(Error::EntityNotFound(EntityId::new()).is_not_found());
        assert!(Error::SourceNotFound(EntityId::new()).is_not_found());
        assert!(!Error::EmptyBatch.is_not_found());
        assert!(!Error::Stale { current: 3 }.is_not_found());
    }
}
