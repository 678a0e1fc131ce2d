//! Accounts API - REST server for login and user management
//!
//! - `POST /api/v1/login` exchanges credentials for a bearer token
//! - `/api/v1/users` CRUD, admin only
//! - `/health`, `/ready`, Swagger UI and the OpenAPI document

pub mod audit;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod openapi;
pub mod response;
pub mod routes;
pub mod state;
pub mod validation;

use std::sync::Arc;
use std::time::Duration;

use accounts_core::{AppConfig, MemoryUserStore, PasswordHashConfig, StoreBackend};
use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::JwtError;
use crate::handlers::health;
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Build the full application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .nest("/api/v1", routes::api_routes(state.clone()))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// CORS policy for the configured origins; any origin when none are listed
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::ACCEPT, header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(300))
}

/// Router over an empty in-memory store with cheap password hashing
///
/// Returns the state too, so tests can seed accounts through `state.auth`.
pub fn create_router_for_testing() -> Result<(Router, Arc<AppState>), JwtError> {
    let mut config = AppConfig::default();
    config.database.backend = StoreBackend::Memory;
    config.auth.jwt_secret = "test-secret".to_string();
    config.auth.password = PasswordHashConfig {
        memory_cost: 1024,
        time_cost: 1,
        parallelism: 1,
    };

    let state = Arc::new(AppState::new(config, Arc::new(MemoryUserStore::new()))?);
    Ok((create_router(state.clone()), state))
}
