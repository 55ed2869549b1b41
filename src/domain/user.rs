use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Customer,
    Vendor,
    #[serde(rename = "SUPERADMIN")]
    SuperAdmin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Role::Customer => "CUSTOMER",
            Role::Vendor => "VENDOR",
            Role::SuperAdmin => "SUPERADMIN",
        };
        f.write_str(label)
    }
}

/// Review state of an uploaded document (vendor licence or KYC).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewStatus {
    #[default]
    None,
    Pending,
    Approved,
    Rejected,
}

/// Represents a registered user in the system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Stored lower-cased; uniqueness is case-insensitive.
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub verification_status: ReviewStatus,
    pub kyc_status: ReviewStatus,
    pub profile_image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The authenticated caller as seen by the engine: just enough for role checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: UserId,
    pub role: Role,
}

impl CurrentUser {
    pub fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::SuperAdmin
    }
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self::new(user.id, user.role)
    }
}
