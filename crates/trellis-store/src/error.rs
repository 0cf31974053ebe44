//! Storage error types

use thiserror::Error;

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Store-level errors: the domain taxonomy from `trellis-core` plus
/// opaque backend failures.
///
/// Backend failures (connectivity, protocol, driver errors) pass
/// through unmodified; the store never interprets or retries them.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Domain(#[from] trellis_core::Error),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Whether this is one of the domain not-found kinds
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Domain(e) if e.is_not_found())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::{EntityId, Error};

    #[test]
    fn test_domain_errors_pass_through() {
        let err: StoreError = Error::EntityNotFound(EntityId::new()).into();
        assert!(err.is_not_found());
        assert!(!StoreError::Backend("connection reset".into()).is_not_found());
    }
}
