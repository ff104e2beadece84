use thiserror::Error;

use invoiceme_core::DomainError;

use crate::store::StoreError;

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Error surface of the ledger operations.
///
/// Every variant is deterministic and never retried internally; whatever the
/// variant, the failed operation committed nothing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Malformed or missing input.
    #[error("validation failed: {0}")]
    Validation(String),
    /// Entity missing or outside the caller's tenant.
    #[error("not found: {0}")]
    NotFound(String),
    /// Operation not permitted in the entity's current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Uniqueness violation or stale write at the persistence boundary.
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl LedgerError {
    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub(crate) fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

impl From<DomainError> for LedgerError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => LedgerError::Validation(msg),
            DomainError::InvalidId(msg) => LedgerError::Validation(msg),
            DomainError::InvalidState(msg) => LedgerError::InvalidState(msg),
            DomainError::NotFound(msg) => LedgerError::NotFound(msg),
            DomainError::Conflict(msg) => LedgerError::Conflict(msg),
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::UniqueViolation(msg) => LedgerError::Conflict(msg),
            StoreError::Concurrency(msg) => LedgerError::Conflict(msg),
            StoreError::Unavailable(msg) => LedgerError::Unavailable(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_conflicts_surface_as_conflict() {
        let err = LedgerError::from(StoreError::UniqueViolation("INV-1".to_string()));
        assert_eq!(err, LedgerError::Conflict("INV-1".to_string()));

        let err = LedgerError::from(StoreError::Concurrency("stale".to_string()));
        assert!(matches!(err, LedgerError::Conflict(_)));
    }

    #[test]
    fn invalid_ids_surface_as_validation() {
        let err = LedgerError::from(DomainError::invalid_id("not-a-uuid"));
        assert!(matches!(err, LedgerError::Validation(_)));
    }
}
