//! API error handling
//!
//! Every failure is converted to the response envelope here; nothing escapes
//! a handler as an unhandled fault.

use accounts_core::AccountError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::response::{ApiResponse, ErrorData, ErrorDetail};

/// Application error type
///
/// `message` is the operation-level summary shown in the envelope
/// (for example `"create user failed"`).
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed body or invalid fields; one entry per problem
    #[error("{message}: {}", .errors.join(", "))]
    Validation {
        message: &'static str,
        errors: Vec<String>,
    },

    /// Lookup misses, duplicates and persistence failures
    #[error("{message}: {reason}")]
    BadRequest {
        message: &'static str,
        reason: String,
    },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("{message}: {reason}")]
    Internal {
        message: &'static str,
        reason: String,
    },
}

impl AppError {
    /// Map a service error onto the HTTP taxonomy
    ///
    /// Not-found, duplicate and store failures stay 400 for wire
    /// compatibility with existing clients.
    pub fn from_account(message: &'static str, err: AccountError) -> Self {
        match err {
            AccountError::Validation(reason) => AppError::Validation {
                message,
                errors: vec![reason],
            },
            AccountError::InvalidToken(_) => AppError::Unauthorized,
            AccountError::Hashing(_) | AccountError::Signing(_) => AppError::Internal {
                message,
                reason: err.to_string(),
            },
            AccountError::InvalidCredentials
            | AccountError::NotFound(_)
            | AccountError::DuplicateUsername(_)
            | AccountError::UpdateFailed
            | AccountError::DeleteFailed
            | AccountError::Store(_) => AppError::BadRequest {
                message,
                reason: err.to_string(),
            },
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match self {
            AppError::Validation { message, errors } => ApiResponse::error(
                status,
                message,
                Some(ErrorData {
                    errors: ErrorDetail::Fields(errors),
                }),
            ),
            AppError::BadRequest { message, reason } => ApiResponse::error(
                status,
                message,
                Some(ErrorData {
                    errors: ErrorDetail::Reason(reason),
                }),
            ),
            AppError::Unauthorized => ApiResponse::error(status, "Unauthorized", None),
            AppError::Forbidden => ApiResponse::error(status, "forbidden", None),
            AppError::Internal { message, reason } => {
                tracing::error!(error = %reason, "{message}");
                ApiResponse::error(
                    status,
                    message,
                    Some(ErrorData {
                        errors: ErrorDetail::Reason("internal server error".to_string()),
                    }),
                )
            }
        };

        body.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_error_mapping() {
        let err = AppError::from_account("get user failed", AccountError::not_found_id("42"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "get user failed: user with ID 42 not found");

        let err = AppError::from_account(
            "create user failed",
            AccountError::DuplicateUsername("ariayu".to_string()),
        );
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = AppError::from_account(
            "create user failed",
            AccountError::Validation("role must be one of: user, admin (got 'root')".to_string()),
        );
        assert!(matches!(err, AppError::Validation { ref errors, .. } if errors.len() == 1));

        let err = AppError::from_account("login failed", AccountError::Signing("boom".to_string()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = AppError::from_account("x", AccountError::InvalidToken("expired".to_string()));
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_auth_errors_render_fixed_messages() {
        assert_eq!(AppError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::Forbidden.to_string(), "forbidden");
    }
}
