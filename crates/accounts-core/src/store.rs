//! Credential store contract
//!
//! Every operation is a single atomic step; callers never need multi-step
//! transactions. The in-memory adapter lives here, the PostgreSQL adapter in
//! [`crate::postgres`].

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{NewUser, User};

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("username already exist")]
    DuplicateUsername(String),

    #[error("database error: {0}")]
    Database(String),
}

/// Persistence operations for user accounts
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fetch by id; `Ok(None)` when absent
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError>;

    /// Fetch by username; `Ok(None)` when absent
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// Insert a new account and return its generated id
    ///
    /// Sets `created_at` and `updated_at` to now. Fails with
    /// `StoreError::DuplicateUsername` if the username is taken.
    async fn insert(&self, user: NewUser) -> Result<String, StoreError>;

    /// Persist full name, password hash and role of `user`, refreshing `updated_at`
    ///
    /// Returns the number of modified records.
    async fn update(&self, user: &User) -> Result<u64, StoreError>;

    /// Remove an account, returning the number of deleted records
    async fn delete(&self, id: &str) -> Result<u64, StoreError>;

    /// All accounts, newest first
    async fn list_all(&self) -> Result<Vec<User>, StoreError>;

    /// Check that the backend is reachable
    async fn ping(&self) -> Result<(), StoreError>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// In-memory store for tests and single-process development runs
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<String, StoreError> {
        // Uniqueness check and insert happen under the same write lock
        let mut users = self.users.write().await;
        if users.values().any(|u| u.username == user.username) {
            return Err(StoreError::DuplicateUsername(user.username));
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        users.insert(
            id.clone(),
            User {
                id: id.clone(),
                full_name: user.full_name,
                username: user.username,
                password_hash: user.password_hash,
                role: user.role,
                created_at: now,
                updated_at: now,
            },
        );

        Ok(id)
    }

    async fn update(&self, user: &User) -> Result<u64, StoreError> {
        let mut users = self.users.write().await;
        match users.get_mut(&user.id) {
            Some(stored) => {
                stored.full_name = user.full_name.clone();
                stored.password_hash = user.password_hash.clone();
                stored.role = user.role;
                stored.updated_at = Utc::now();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete(&self, id: &str) -> Result<u64, StoreError> {
        Ok(self.users.write().await.remove(id).map_or(0, |_| 1))
    }

    async fn list_all(&self) -> Result<Vec<User>, StoreError> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
