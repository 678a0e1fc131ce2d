//! API route definitions

use std::sync::Arc;

use accounts_core::Role;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::auth::{auth_middleware, require_role};
use crate::handlers::{auth, users};
use crate::state::AppState;

/// Create API v1 routes
///
/// The role check is layered inside the gate, so an unauthenticated caller
/// always gets 401 and never 403.
pub fn api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    // Public routes (no authentication required)
    let public_routes = Router::new().route("/login", post(auth::login_handler));

    // Admin-only user management
    let admin_routes = Router::new()
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/:id",
            get(users::get_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
        .route_layer(middleware::from_fn(require_role(Role::Admin)))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new().merge(public_routes).merge(admin_routes)
}
