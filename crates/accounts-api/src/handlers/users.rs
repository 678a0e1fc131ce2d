//! User management handlers
//!
//! Every route here sits behind the authorization gate and the admin role
//! check; see [`crate::routes`].

use std::sync::Arc;

use accounts_core::{AccountError, Role, UserPatch};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::response::{ApiResponse, CreatedUser, UserResponse};
use crate::state::AppState;
use crate::validation::validated;

const CREATE_FAILED: &str = "create user failed";
const LIST_FAILED: &str = "get users failed";
const GET_FAILED: &str = "get user failed";
const UPDATE_FAILED: &str = "update user failed";
const DELETE_FAILED: &str = "delete user failed";

/// Create user request
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "fullname is required"))]
    pub fullname: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,

    /// `user` or `admin`; defaults to `user`
    #[serde(default)]
    pub role: Option<String>,
}

/// Partial update; omitted or empty fields keep their stored value
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub fullname: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default)]
    pub role: Option<String>,
}

/// Parse an optional role tag, treating an empty tag as absent
fn parse_role(role: Option<&str>) -> Result<Option<Role>, AccountError> {
    match role.map(str::trim) {
        None | Some("") => Ok(None),
        Some(tag) => Ok(Some(tag.parse::<Role>()?)),
    }
}

/// List all users, newest first
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "List of users", body = UserListEnvelope),
        (status = 401, description = "Missing or invalid token", body = ErrorEnvelope),
        (status = 403, description = "Caller is not an admin", body = ErrorEnvelope),
    )
)]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<ApiResponse<Vec<UserResponse>>, AppError> {
    let users = state
        .auth
        .list_all()
        .await
        .map_err(|e| AppError::from_account(LIST_FAILED, e))?;

    let users = users.into_iter().map(UserResponse::from).collect();
    Ok(ApiResponse::success(StatusCode::OK, "List of users", users))
}

/// Create a user
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = CreatedEnvelope),
        (status = 400, description = "Invalid body or duplicate username", body = ErrorEnvelope),
        (status = 401, description = "Missing or invalid token", body = ErrorEnvelope),
        (status = 403, description = "Caller is not an admin", body = ErrorEnvelope),
    )
)]
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<ApiResponse<CreatedUser>, AppError> {
    let request = validated(payload, CREATE_FAILED)?;
    let role = parse_role(request.role.as_deref())
        .map_err(|e| AppError::from_account(CREATE_FAILED, e))?;

    let id = state
        .auth
        .create_user(&request.fullname, &request.username, &request.password, role)
        .await
        .map_err(|e| AppError::from_account(CREATE_FAILED, e))?;

    info!(actor = %current.user().username, user_id = %id, "Account created via API");

    Ok(ApiResponse::success(
        StatusCode::CREATED,
        "User has been created",
        CreatedUser { id },
    ))
}

/// Get a user by id
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Data of user", body = UserEnvelope),
        (status = 400, description = "User not found", body = ErrorEnvelope),
        (status = 401, description = "Missing or invalid token", body = ErrorEnvelope),
        (status = 403, description = "Caller is not an admin", body = ErrorEnvelope),
    )
)]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<ApiResponse<UserResponse>, AppError> {
    let user = state
        .auth
        .get_by_id(&id)
        .await
        .map_err(|e| AppError::from_account(GET_FAILED, e))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Data of user",
        UserResponse::from(user),
    ))
}

/// Partially update a user
#[utoipa::path(
    patch,
    path = "/api/v1/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserEnvelope),
        (status = 400, description = "Invalid body, unknown user or failed update", body = ErrorEnvelope),
        (status = 401, description = "Missing or invalid token", body = ErrorEnvelope),
        (status = 403, description = "Caller is not an admin", body = ErrorEnvelope),
    )
)]
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<ApiResponse<UserResponse>, AppError> {
    let request = validated(payload, UPDATE_FAILED)?;
    let role = parse_role(request.role.as_deref())
        .map_err(|e| AppError::from_account(UPDATE_FAILED, e))?;

    let patch = UserPatch {
        full_name: request.fullname,
        password: request.password,
        role,
    };

    state
        .auth
        .update_user(&id, patch)
        .await
        .map_err(|e| AppError::from_account(UPDATE_FAILED, e))?;

    let user = state
        .auth
        .get_by_id(&id)
        .await
        .map_err(|e| AppError::from_account(UPDATE_FAILED, e))?;

    info!(actor = %current.user().username, user_id = %id, "Account updated via API");

    Ok(ApiResponse::success(
        StatusCode::OK,
        "update user success",
        UserResponse::from(user),
    ))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted", body = MessageEnvelope),
        (status = 400, description = "Unknown user or failed delete", body = ErrorEnvelope),
        (status = 401, description = "Missing or invalid token", body = ErrorEnvelope),
        (status = 403, description = "Caller is not an admin", body = ErrorEnvelope),
    )
)]
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<()>, AppError> {
    state
        .auth
        .delete_user(&id)
        .await
        .map_err(|e| AppError::from_account(DELETE_FAILED, e))?;

    info!(actor = %current.user().username, user_id = %id, "Account deleted via API");

    Ok(ApiResponse::message(StatusCode::OK, "User has been deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role() {
        assert_eq!(parse_role(None).unwrap(), None);
        assert_eq!(parse_role(Some("")).unwrap(), None);
        assert_eq!(parse_role(Some("admin")).unwrap(), Some(Role::Admin));
        assert_eq!(parse_role(Some(" User ")).unwrap(), Some(Role::User));
        assert!(matches!(
            parse_role(Some("root")),
            Err(AccountError::Validation(_))
        ));
    }

    #[test]
    fn test_create_request_missing_fields_fail_validation() {
        let request: CreateUserRequest = serde_json::from_str(r#"{"username":"ariayu"}"#).unwrap();
        let errors = request.validate().unwrap_err();

        let fields = errors.field_errors();
        assert!(fields.contains_key("fullname"));
        assert!(fields.contains_key("password"));
        assert!(!fields.contains_key("username"));
    }
}
