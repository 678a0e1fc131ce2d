//! Login handler

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::audit::RequestContext;
use crate::error::AppError;
use crate::response::{ApiResponse, LoginData};
use crate::state::AppState;
use crate::validation::validated;

const LOGIN_FAILED: &str = "login failed";

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// Login with username and password
///
/// Returns a bearer token valid for 24 hours. An unknown username and a wrong
/// password produce the same response.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginEnvelope),
        (status = 400, description = "Invalid body or credentials", body = ErrorEnvelope),
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<ApiResponse<LoginData>, AppError> {
    let request = validated(payload, LOGIN_FAILED)?;
    let ctx = RequestContext::from_headers(&headers);

    let token = state
        .auth
        .login(&request.username, &request.password, &ctx)
        .await
        .map_err(|e| AppError::from_account(LOGIN_FAILED, e))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "login success",
        LoginData { token },
    ))
}
