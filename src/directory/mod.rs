//! Who is calling and what they may do.
//!
//! The engine only needs [`UserDirectory`]; [`InMemoryDirectory`] backs the
//! demo binary and the tests.

mod in_memory;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{CurrentUser, Role};

pub use in_memory::*;

/// Opaque bearer token issued by [`UserDirectory::authenticate`].
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Tokens never show up in logs.
impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("token is unknown or revoked")]
    InvalidToken,
    #[error("user not found: {0}")]
    UnknownUser(String),
    #[error("email already registered: {0}")]
    EmailTaken(String),
    #[error("invalid {field}: {rule}")]
    Validation { field: &'static str, rule: String },
    #[error("password hashing failed: {0}")]
    Hashing(String),
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> Result<AuthToken, AuthError>;

    async fn current_user(&self, token: &AuthToken) -> Result<CurrentUser, AuthError>;

    fn has_any_role(&self, user: &CurrentUser, roles: &[Role]) -> bool {
        roles.contains(&user.role)
    }
}
