use std::collections::HashMap;

use async_trait::async_trait;
use mockable::Clock;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::{CurrentUser, ReviewStatus, Role, User, UserId};
use crate::SharedClock;

use super::{AuthError, AuthToken, Credentials, UserDirectory};

const NAME_LEN: std::ops::RangeInclusive<usize> = 2..=120;
const PASSWORD_LEN: std::ops::RangeInclusive<usize> = 6..=128;

/// Registration payload.
#[derive(Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl NewUser {
    pub fn new(name: &str, email: &str, password: &str, role: Role) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role,
        }
    }
}

#[derive(Default)]
struct DirectoryState {
    users: HashMap<UserId, User>,
    by_email: HashMap<String, UserId>,
    tokens: HashMap<String, UserId>,
}

/// Process-local user directory with bcrypt password hashes and random
/// bearer tokens.
pub struct InMemoryDirectory {
    state: RwLock<DirectoryState>,
    clock: SharedClock,
    hash_cost: u32,
}

impl InMemoryDirectory {
    pub fn new(clock: SharedClock) -> Self {
        Self::with_hash_cost(clock, bcrypt::DEFAULT_COST)
    }

    /// `hash_cost` is the bcrypt work factor (4..=31).
    pub fn with_hash_cost(clock: SharedClock, hash_cost: u32) -> Self {
        Self {
            state: RwLock::new(DirectoryState::default()),
            clock,
            hash_cost,
        }
    }

    #[instrument(fields(email = %new_user.email, role = %new_user.role), skip(self, new_user))]
    pub async fn register(&self, new_user: NewUser) -> Result<User, AuthError> {
        let name = new_user.name.trim().to_string();
        if !NAME_LEN.contains(&name.chars().count()) {
            return Err(AuthError::Validation {
                field: "name",
                rule: "must be 2 to 120 characters".to_string(),
            });
        }
        let email = normalize_email(&new_user.email);
        if !looks_like_email(&email) {
            return Err(AuthError::Validation {
                field: "email",
                rule: format!("not an email address: {email}"),
            });
        }
        if !PASSWORD_LEN.contains(&new_user.password.chars().count()) {
            return Err(AuthError::Validation {
                field: "password",
                rule: "must be 6 to 128 characters".to_string(),
            });
        }

        if self.state.read().await.by_email.contains_key(&email) {
            warn!("Email already registered");
            return Err(AuthError::EmailTaken(email));
        }
        let password_hash = hash_password(new_user.password, self.hash_cost).await?;

        // Re-checked under the write lock; another registration may have won.
        let mut state = self.state.write().await;
        if state.by_email.contains_key(&email) {
            warn!("Email already registered");
            return Err(AuthError::EmailTaken(email));
        }

        let id = UserId::random();
        let user = User {
            id,
            name,
            password_hash,
            email: email.clone(),
            role: new_user.role,
            verification_status: ReviewStatus::None,
            kyc_status: ReviewStatus::None,
            profile_image: None,
            created_at: self.clock.utc(),
        };
        state.by_email.insert(email, id);
        state.users.insert(id, user.clone());

        info!(user_id = %id, "User registered");
        Ok(user)
    }

    pub async fn get_user(&self, id: UserId) -> Option<User> {
        self.state.read().await.users.get(&id).cloned()
    }

    /// Records the outcome of a vendor licence review.
    #[instrument(skip(self))]
    pub async fn set_verification_status(
        &self,
        id: UserId,
        status: ReviewStatus,
    ) -> Result<User, AuthError> {
        self.update_user(id, |user| user.verification_status = status).await
    }

    /// Records the outcome of a KYC document review.
    #[instrument(skip(self))]
    pub async fn set_kyc_status(
        &self,
        id: UserId,
        status: ReviewStatus,
    ) -> Result<User, AuthError> {
        self.update_user(id, |user| user.kyc_status = status).await
    }

    #[instrument(skip(self, token))]
    pub async fn revoke(&self, token: &AuthToken) -> bool {
        let removed = self.state.write().await.tokens.remove(token.as_str()).is_some();
        debug!(removed, "Token revoked");
        removed
    }

    async fn update_user(
        &self,
        id: UserId,
        change: impl FnOnce(&mut User),
    ) -> Result<User, AuthError> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| AuthError::UnknownUser(id.to_string()))?;
        change(user);
        Ok(user.clone())
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    #[instrument(fields(email = %credentials.email), skip(self, credentials))]
    async fn authenticate(&self, credentials: &Credentials) -> Result<AuthToken, AuthError> {
        let email = normalize_email(&credentials.email);
        let (user_id, password_hash) = {
            let state = self.state.read().await;
            state
                .by_email
                .get(&email)
                .and_then(|id| state.users.get(id))
                .map(|user| (user.id, user.password_hash.clone()))
                .ok_or(AuthError::InvalidCredentials)?
        };

        if !verify_password(credentials.password.clone(), password_hash).await? {
            warn!(user_id = %user_id, "Password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let token = Uuid::new_v4().simple().to_string();
        self.state.write().await.tokens.insert(token.clone(), user_id);

        info!(user_id = %user_id, "User authenticated");
        Ok(AuthToken::new(token))
    }

    async fn current_user(&self, token: &AuthToken) -> Result<CurrentUser, AuthError> {
        let state = self.state.read().await;
        state
            .tokens
            .get(token.as_str())
            .and_then(|id| state.users.get(id))
            .map(CurrentUser::from)
            .ok_or(AuthError::InvalidToken)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

/// bcrypt with a fresh random salt. Runs on the blocking pool.
async fn hash_password(password: String, cost: u32) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))?
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

async fn verify_password(password: String, hash: String) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))?
        .map_err(|e| AuthError::Hashing(e.to_string()))
}
