//! Authentication service layer
//!
//! Business logic for login and account management. Persistence goes through
//! the [`UserStore`] trait, so the same service runs over PostgreSQL in
//! production and over the in-memory store in tests and the CLI.

use std::sync::Arc;

use accounts_core::{
    AccountError, AuthConfig, BootstrapAdmin, NewUser, PasswordHashConfig, Role, User, UserPatch,
    UserStore,
};
use tracing::{debug, info, warn};

use super::jwt::{JwtError, TokenIssuer};
use super::password::{hash_password_with_config, verify_password, PasswordError};
use crate::audit::{audit_log, AuditEvent, RequestContext};

type Result<T> = std::result::Result<T, AccountError>;

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    tokens: TokenIssuer,
    password_config: PasswordHashConfig,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn UserStore>,
        tokens: TokenIssuer,
        password_config: PasswordHashConfig,
    ) -> Self {
        Self {
            store,
            tokens,
            password_config,
        }
    }

    /// Build the service from the `auth` configuration section
    pub fn from_config(
        store: Arc<dyn UserStore>,
        config: &AuthConfig,
    ) -> std::result::Result<Self, JwtError> {
        let tokens = TokenIssuer::new(&config.jwt_secret)?;
        Ok(Self::new(store, tokens, config.password.clone()))
    }

    pub fn store(&self) -> &Arc<dyn UserStore> {
        &self.store
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Login with username and password
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - Signed bearer token for the account
    /// * `Err(AccountError::InvalidCredentials)` - Unknown username or wrong
    ///   password; both cases produce the same error
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        ctx: &RequestContext,
    ) -> Result<String> {
        let user = match self.store.find_by_username(username).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                self.login_failed(username, "unknown username", ctx);
                return Err(AccountError::InvalidCredentials);
            }
            Err(e) => {
                warn!(username = %username, error = %e, "Credential lookup failed during login");
                self.login_failed(username, "credential lookup failed", ctx);
                return Err(AccountError::InvalidCredentials);
            }
        };

        let password_valid = match self.verify(password, &user.password_hash).await {
            Ok(valid) => valid,
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "Stored password hash is unreadable");
                false
            }
        };

        if !password_valid {
            self.login_failed(username, "password mismatch", ctx);
            return Err(AccountError::InvalidCredentials);
        }

        let token = self
            .tokens
            .issue(&user.id)
            .map_err(|e| AccountError::Signing(e.to_string()))?;

        audit_log(&AuditEvent::LoginSuccess {
            user_id: user.id.clone(),
            username: user.username.clone(),
            ip_address: ctx.ip_address.clone(),
            user_agent: ctx.user_agent.clone(),
        });

        Ok(token)
    }

    /// Argon2id work runs on the blocking thread pool
    async fn hash(&self, password: &str) -> Result<String> {
        let password = password.to_string();
        let config = self.password_config.clone();

        tokio::task::spawn_blocking(move || hash_password_with_config(&password, &config))
            .await
            .map_err(|e| AccountError::Hashing(e.to_string()))?
            .map_err(|e| AccountError::Hashing(e.to_string()))
    }

    async fn verify(
        &self,
        password: &str,
        hash: &str,
    ) -> std::result::Result<bool, PasswordError> {
        let password = password.to_string();
        let hash = hash.to_string();

        tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| PasswordError::VerificationFailed(e.to_string()))?
    }

    fn login_failed(&self, username: &str, reason: &str, ctx: &RequestContext) {
        audit_log(&AuditEvent::LoginFailure {
            username: username.to_string(),
            reason: reason.to_string(),
            ip_address: ctx.ip_address.clone(),
            user_agent: ctx.user_agent.clone(),
        });
    }

    /// Resolve a bearer token to the account it was issued for
    ///
    /// Fails with `InvalidToken` when verification fails and with `NotFound`
    /// when the account no longer exists.
    pub async fn authenticate(&self, token: &str) -> Result<User> {
        let user_id = self
            .tokens
            .verify(token)
            .map_err(|e| AccountError::InvalidToken(e.to_string()))?;

        self.get_by_id(&user_id).await
    }

    /// Create a new account and return its id
    ///
    /// The role defaults to `Role::User`.
    pub async fn create_user(
        &self,
        full_name: &str,
        username: &str,
        password: &str,
        role: Option<Role>,
    ) -> Result<String> {
        if username.is_empty() || password.is_empty() {
            return Err(AccountError::Validation(
                "username and password are required".to_string(),
            ));
        }

        if self.store.find_by_username(username).await?.is_some() {
            return Err(AccountError::DuplicateUsername(username.to_string()));
        }

        let password_hash = self.hash(password).await?;
        let role = role.unwrap_or_default();

        let id = self
            .store
            .insert(NewUser {
                full_name: full_name.to_string(),
                username: username.to_string(),
                password_hash,
                role,
            })
            .await?;

        info!(user_id = %id, username = %username, role = %role, "User created");
        audit_log(&AuditEvent::UserCreated {
            user_id: id.clone(),
            username: username.to_string(),
            role: role.to_string(),
        });

        Ok(id)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<User> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AccountError::not_found_id(id))
    }

    pub async fn get_by_username(&self, username: &str) -> Result<User> {
        self.store
            .find_by_username(username)
            .await?
            .ok_or_else(|| AccountError::not_found_username(username))
    }

    /// Apply the populated fields of `patch` to an existing account
    ///
    /// Empty fields leave the stored values untouched. A new password is
    /// re-hashed before it is persisted.
    pub async fn update_user(&self, id: &str, patch: UserPatch) -> Result<bool> {
        let mut user = self.get_by_id(id).await?;
        let patch = patch.normalized();
        let password_changed = patch.password.is_some();

        if let Some(full_name) = patch.full_name {
            user.full_name = full_name;
        }
        if let Some(password) = patch.password {
            user.password_hash = self.hash(&password).await?;
        }
        if let Some(role) = patch.role {
            user.role = role;
        }

        let modified = self.store.update(&user).await?;
        if modified != 1 {
            warn!(user_id = %id, modified, "Update did not modify exactly one record");
            return Err(AccountError::UpdateFailed);
        }

        info!(user_id = %id, password_changed, "User updated");
        audit_log(&AuditEvent::UserUpdated {
            user_id: user.id.clone(),
            username: user.username.clone(),
            password_changed,
            role: user.role.to_string(),
        });

        Ok(true)
    }

    pub async fn delete_user(&self, id: &str) -> Result<bool> {
        let user = self.get_by_id(id).await?;

        let deleted = self.store.delete(id).await?;
        if deleted == 0 {
            warn!(user_id = %id, "Delete removed no records");
            return Err(AccountError::DeleteFailed);
        }

        info!(user_id = %id, "User deleted");
        audit_log(&AuditEvent::UserDeleted {
            user_id: user.id,
            username: user.username,
        });

        Ok(true)
    }

    /// All accounts, newest first
    pub async fn list_all(&self) -> Result<Vec<User>> {
        let users = self.store.list_all().await?;
        debug!(count = users.len(), "Listed users");
        Ok(users)
    }

    /// Seed an admin account unless one with the same username exists
    ///
    /// Returns the id of the created account, or `None` when it already existed.
    pub async fn ensure_bootstrap_admin(&self, admin: &BootstrapAdmin) -> Result<Option<String>> {
        if self.store.find_by_username(&admin.username).await?.is_some() {
            debug!(username = %admin.username, "Bootstrap admin already present");
            return Ok(None);
        }

        let id = self
            .create_user(
                &admin.full_name,
                &admin.username,
                &admin.password,
                Some(Role::Admin),
            )
            .await?;

        Ok(Some(id))
    }
}
