//! Uniform response envelope
//!
//! Every endpoint answers with `{code, status, message, data?}`. The payload
//! type is fixed per endpoint, and failures carry [`ErrorData`].

use accounts_core::{Role, User};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// Response envelope
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[aliases(
    LoginEnvelope = ApiResponse<LoginData>,
    CreatedEnvelope = ApiResponse<CreatedUser>,
    UserEnvelope = ApiResponse<UserResponse>,
    UserListEnvelope = ApiResponse<Vec<UserResponse>>,
    ErrorEnvelope = ApiResponse<ErrorData>
)]
pub struct ApiResponse<T> {
    /// HTTP status code, repeated in the body
    pub code: u16,
    pub status: ResponseStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(code: StatusCode, message: impl Into<String>, data: T) -> Self {
        Self {
            code: code.as_u16(),
            status: ResponseStatus::Success,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// Success envelope without a payload
    pub fn message(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code: code.as_u16(),
            status: ResponseStatus::Success,
            message: message.into(),
            data: None,
        }
    }
}

impl ApiResponse<ErrorData> {
    pub fn error(code: StatusCode, message: impl Into<String>, data: Option<ErrorData>) -> Self {
        Self {
            code: code.as_u16(),
            status: ResponseStatus::Error,
            message: message.into(),
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// Schema of the envelope built by [`ApiResponse::message`], which never carries `data`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageEnvelope {
    pub code: u16,
    pub status: ResponseStatus,
    pub message: String,
}

/// Failure payload: `{"errors": ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorData {
    pub errors: ErrorDetail,
}

/// A single reason, or one message per invalid field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum ErrorDetail {
    Reason(String),
    Fields(Vec<String>),
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginData {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatedUser {
    pub id: String,
}

/// Public view of an account; never carries the password hash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: String,
    pub fullname: String,
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            fullname: user.full_name,
            username: user.username,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
