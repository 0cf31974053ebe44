//! Bulk operation modes, per-item errors, and aggregate outcomes

use serde::{Deserialize, Serialize};
use trellis_core::{Error, ValidationIssue};

/// Failure policy for bulk edge creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkMode {
    /// Any invalid item rejects the whole batch; nothing is created
    #[default]
    Atomic,
    /// Invalid items are reported per index; valid items are created
    Partial,
}

/// Why one bulk item failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkReason {
    SourceNotFound,
    TargetNotFound,
}

impl std::fmt::Display for BulkReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SourceNotFound => write!(f, "source_not_found"),
            Self::TargetNotFound => write!(f, "target_not_found"),
        }
    }
}

/// One failed item in a partial-mode bulk result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkItemError {
    pub index: usize,
    pub reason: BulkReason,
}

impl BulkItemError {
    pub fn new(index: usize, reason: BulkReason) -> Self {
        Self { index, reason }
    }
}

/// Aggregate result of a partial-capable bulk operation
///
/// `Complete` carries a plain list so callers can answer
/// "fully created"; `Partial` splits created items from per-index
/// errors for a multi-status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BulkOutcome<T> {
    Complete(Vec<T>),
    Partial {
        created: Vec<T>,
        errors: Vec<BulkItemError>,
    },
}

impl<T> BulkOutcome<T> {
    /// Fold created items and errors into the right variant
    pub fn from_parts(created: Vec<T>, errors: Vec<BulkItemError>) -> Self {
        if errors.is_empty() {
            Self::Complete(created)
        } else {
            Self::Partial { created, errors }
        }
    }

    pub fn created(&self) -> &[T] {
        match self {
            Self::Complete(created) => created,
            Self::Partial { created, .. } => created,
        }
    }

    pub fn errors(&self) -> &[BulkItemError] {
        match self {
            Self::Complete(_) => &[],
            Self::Partial { errors, .. } => errors,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }
}

/// Convert per-item failures into the aggregate validation error used
/// by atomic mode.
pub fn atomic_rejection(errors: Vec<BulkItemError>) -> Error {
    Error::Validation(
        errors
            .into_iter()
            .map(|e| ValidationIssue::at_index(e.index, e.reason.to_string()))
            .collect(),
    )
}
