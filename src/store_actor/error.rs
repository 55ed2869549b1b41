use thiserror::Error;

use crate::domain::ProductStatus;

/// Errors reported by the store actor. A failed commit leaves every table
/// untouched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("{kind} already exists: {id}")]
    AlreadyExists { kind: &'static str, id: String },
    #[error("{kind} {id} was modified concurrently: expected version {expected}, found {found}")]
    VersionConflict {
        kind: &'static str,
        id: String,
        expected: u64,
        found: u64,
    },
    #[error("product {id} status changed concurrently: expected {expected}, found {found}")]
    StatusConflict {
        id: String,
        expected: ProductStatus,
        found: ProductStatus,
    },
    #[error("product {id} is still held by non-terminal rental {rental_id}")]
    StillReferenced { id: String, rental_id: String },
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl StoreError {
    /// True when the caller lost a race and may retry from a fresh read.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            StoreError::VersionConflict { .. } | StoreError::StatusConflict { .. }
        )
    }
}
