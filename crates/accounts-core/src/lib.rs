//! Accounts Core - Domain models, store contract, and shared types
//!
//! This crate defines the core abstractions used by the accounts service:
//! - Account models (users, roles, partial updates)
//! - Common error types
//! - The credential store trait and its in-memory and PostgreSQL adapters
//! - Configuration management

pub mod config;
pub mod models;
pub mod postgres;
pub mod store;

pub use config::{
    AppConfig, AuthConfig, BootstrapAdmin, ConfigError, DatabaseConfig, LoggingConfig,
    PasswordHashConfig, ServerConfig, StoreBackend,
};
pub use models::{NewUser, Role, RoleParseError, User, UserPatch};
pub use postgres::PgUserStore;
pub use store::{MemoryUserStore, StoreError, UserStore};

use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Key used to look an account up, carried by `AccountError::NotFound`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserLookup {
    Id(String),
    Username(String),
}

impl std::fmt::Display for UserLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "ID {id}"),
            Self::Username(username) => write!(f, "username {username}"),
        }
    }
}

/// Account operation errors
///
/// The display strings are part of the wire format: handlers surface them
/// verbatim in the response envelope.
#[derive(Error, Debug)]
pub enum AccountError {
    /// Shared by unknown-username and wrong-password so callers cannot tell them apart
    #[error("username or password incorrect")]
    InvalidCredentials,

    #[error("user with {0} not found")]
    NotFound(UserLookup),

    #[error("username already exist")]
    DuplicateUsername(String),

    #[error("update failed")]
    UpdateFailed,

    #[error("delete failed")]
    DeleteFailed,

    #[error("{0}")]
    Validation(String),

    #[error("failed to hash password: {0}")]
    Hashing(String),

    #[error("failed to sign token: {0}")]
    Signing(String),

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("{0}")]
    Store(String),
}

impl AccountError {
    pub fn not_found_id(id: impl Into<String>) -> Self {
        Self::NotFound(UserLookup::Id(id.into()))
    }

    pub fn not_found_username(username: impl Into<String>) -> Self {
        Self::NotFound(UserLookup::Username(username.into()))
    }
}

impl From<StoreError> for AccountError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateUsername(username) => AccountError::DuplicateUsername(username),
            StoreError::Database(msg) => AccountError::Store(msg),
        }
    }
}

impl From<RoleParseError> for AccountError {
    fn from(err: RoleParseError) -> Self {
        AccountError::Validation(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AccountError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_carries_key() {
        let err = AccountError::not_found_id("42");
        assert_eq!(err.to_string(), "user with ID 42 not found");

        let err = AccountError::not_found_username("ariayu");
        assert_eq!(err.to_string(), "user with username ariayu not found");
    }

    #[test]
    fn test_invalid_credentials_message() {
        assert_eq!(
            AccountError::InvalidCredentials.to_string(),
            "username or password incorrect"
        );
    }

    #[test]
    fn test_store_error_conversion() {
        let err: AccountError = StoreError::DuplicateUsername("ariayu".to_string()).into();
        assert!(matches!(err, AccountError::DuplicateUsername(ref u) if u == "ariayu"));
        assert_eq!(err.to_string(), "username already exist");

        let err: AccountError = StoreError::Database("connection reset".to_string()).into();
        assert_eq!(err.to_string(), "connection reset");
    }
}
