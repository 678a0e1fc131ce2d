//! OpenAPI document served at `/api-docs/openapi.json`

use accounts_core::Role;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::handlers::{auth, health, users};
use crate::response::{
    CreatedEnvelope, CreatedUser, ErrorData, ErrorDetail, ErrorEnvelope, LoginData, LoginEnvelope,
    MessageEnvelope, ResponseStatus, UserEnvelope, UserListEnvelope, UserResponse,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        health::readiness_check,
        auth::login_handler,
        users::list_users,
        users::create_user,
        users::get_user,
        users::update_user,
        users::delete_user,
    ),
    components(schemas(
        auth::LoginRequest,
        users::CreateUserRequest,
        users::UpdateUserRequest,
        health::HealthResponse,
        health::ReadinessResponse,
        Role,
        ResponseStatus,
        LoginData,
        CreatedUser,
        UserResponse,
        ErrorData,
        ErrorDetail,
        LoginEnvelope,
        CreatedEnvelope,
        UserEnvelope,
        UserListEnvelope,
        MessageEnvelope,
        ErrorEnvelope,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Liveness and readiness probes"),
        (name = "auth", description = "Login"),
        (name = "users", description = "Admin-only account management"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by protected paths
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
