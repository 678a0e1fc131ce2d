//! Account domain models
//!
//! - `User`: a persisted account record
//! - `Role`: coarse authorization tag attached to an account
//! - `NewUser` / `UserPatch`: inputs for creating and partially updating accounts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Authorization role of an account
///
/// - Admin: may manage every account
/// - User: authenticated, no management rights
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    /// Whether an account holding this role passes a route that requires `required`
    pub fn satisfies(&self, required: Role) -> bool {
        match (self, required) {
            (Role::Admin, _) => true,
            (Role::User, Role::User) => true,
            (Role::User, Role::Admin) => false,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Returned when a role tag is not one of the known roles
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("role must be one of: user, admin (got '{0}')")]
pub struct RoleParseError(pub String);

impl std::str::FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(RoleParseError(s.to_string())),
        }
    }
}

/// User account record
///
/// `id` is assigned by the store on insert and never changes. The password
/// hash is never serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,

    #[serde(rename = "fullname")]
    pub full_name: String,

    /// Unique login key
    pub username: String,

    /// Argon2id PHC string
    #[serde(default, skip_serializing)]
    pub password_hash: String,

    pub role: Role,

    pub created_at: DateTime<Utc>,

    /// Refreshed by the store on every update
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Account to insert; the store assigns `id` and both timestamps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub full_name: String,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

/// Partial update of an account
///
/// `None` and empty strings leave the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub full_name: Option<String>,
    /// Plaintext; re-hashed before it reaches the store
    pub password: Option<String>,
    pub role: Option<Role>,
}

impl UserPatch {
    /// Drop empty string fields so only populated values are applied
    pub fn normalized(self) -> Self {
        Self {
            full_name: self.full_name.filter(|v| !v.is_empty()),
            password: self.password.filter(|v| !v.is_empty()),
            role: self.role,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.password.is_none() && self.role.is_none()
    }
}
