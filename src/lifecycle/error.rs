use thiserror::Error;

use crate::clients::ProductError;
use crate::directory::AuthError;
use crate::domain::UserId;
use crate::store_actor::StoreError;

/// Failures surfaced by the lifecycle engine and the command boundary.
///
/// Every variant names the entity it concerns and the rule that was broken.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RentalError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("{entity} {id}: {rule}")]
    InvalidState {
        entity: &'static str,
        id: String,
        rule: String,
    },
    #[error("user {caller} may not act on {entity} {id}: {rule}")]
    Forbidden {
        caller: UserId,
        entity: &'static str,
        id: String,
        rule: String,
    },
    #[error("{subject}: invalid {field}: {rule}")]
    Validation {
        subject: String,
        field: &'static str,
        rule: String,
    },
    /// Lost a race with another writer; safe to retry from a fresh read.
    #[error("{entity} {id} changed concurrently ({detail}); retry the operation")]
    Conflict {
        entity: &'static str,
        id: String,
        detail: String,
    },
    #[error("Authentication failed: {0}")]
    Unauthenticated(String),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl RentalError {
    pub fn invalid_state(entity: &'static str, id: impl ToString, rule: impl Into<String>) -> Self {
        RentalError::InvalidState {
            entity,
            id: id.to_string(),
            rule: rule.into(),
        }
    }

    pub fn validation(
        subject: impl ToString,
        field: &'static str,
        rule: impl Into<String>,
    ) -> Self {
        RentalError::Validation {
            subject: subject.to_string(),
            field,
            rule: rule.into(),
        }
    }

    pub fn is_retriable(&self) -> bool {
        matches!(self, RentalError::Conflict { .. })
    }
}

impl From<StoreError> for RentalError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { kind, id } => RentalError::NotFound { entity: kind, id },
            StoreError::AlreadyExists { kind, id } => RentalError::Conflict {
                entity: kind,
                id,
                detail: "record already exists".to_string(),
            },
            StoreError::VersionConflict {
                kind,
                id,
                expected,
                found,
            } => RentalError::Conflict {
                entity: kind,
                id,
                detail: format!("read version {expected}, stored version {found}"),
            },
            StoreError::StatusConflict { id, expected, found } => RentalError::Conflict {
                entity: "product",
                id,
                detail: format!("expected status {expected}, found {found}"),
            },
            StoreError::StillReferenced { id, rental_id } => RentalError::InvalidState {
                entity: "product",
                id,
                rule: format!("still held by rental {rental_id}"),
            },
            StoreError::ActorCommunicationError(msg) => RentalError::ActorCommunicationError(msg),
        }
    }
}

impl From<ProductError> for RentalError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::NotFound(id) => RentalError::NotFound {
                entity: "product",
                id,
            },
            ProductError::Forbidden { caller, id, rule } => RentalError::Forbidden {
                caller,
                entity: "product",
                id,
                rule: rule.to_string(),
            },
            ProductError::Validation { subject, field, rule } => {
                RentalError::Validation { subject, field, rule }
            }
            ProductError::InvalidState { id, rule } => RentalError::InvalidState {
                entity: "product",
                id,
                rule,
            },
            ProductError::Conflict { id, detail } => RentalError::Conflict {
                entity: "product",
                id,
                detail,
            },
            ProductError::ActorCommunicationError(msg) => RentalError::ActorCommunicationError(msg),
        }
    }
}

impl From<AuthError> for RentalError {
    fn from(err: AuthError) -> Self {
        RentalError::Unauthenticated(err.to_string())
    }
}
