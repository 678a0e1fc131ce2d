//! Application state management

use std::sync::Arc;
use std::time::Instant;

use accounts_core::{AppConfig, UserStore};

use crate::auth::jwt::JwtError;
use crate::auth::AuthService;

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Login and account management
    pub auth: AuthService,
    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    /// Build the state over an already connected store
    ///
    /// Fails when the signing secret is missing.
    pub fn new(config: AppConfig, store: Arc<dyn UserStore>) -> Result<Self, JwtError> {
        let auth = AuthService::from_config(store, &config.auth)?;

        Ok(Self {
            config,
            auth,
            start_time: Instant::now(),
        })
    }

    pub fn store(&self) -> &Arc<dyn UserStore> {
        self.auth.store()
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
