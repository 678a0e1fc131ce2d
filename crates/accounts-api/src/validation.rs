//! Request body validation
//!
//! Handlers take `Result<Json<T>, JsonRejection>` so that a malformed body is
//! reported through the envelope instead of axum's plain-text rejection.

use axum::extract::rejection::JsonRejection;
use axum::Json;
use validator::{Validate, ValidationErrors};

use crate::error::AppError;

/// Unwrap a JSON body and run its `validator` rules
pub fn validated<T: Validate>(
    payload: Result<Json<T>, JsonRejection>,
    message: &'static str,
) -> Result<T, AppError> {
    let Json(body) = payload.map_err(|rejection| AppError::Validation {
        message,
        errors: vec![rejection.body_text()],
    })?;

    body.validate().map_err(|errors| AppError::Validation {
        message,
        errors: validation_messages(&errors),
    })?;

    Ok(body)
}

/// Flatten field errors into sorted human-readable messages
pub fn validation_messages(errors: &ValidationErrors) -> Vec<String> {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, field_errors)| {
            field_errors.iter().map(move |e| match &e.message {
                Some(message) => message.to_string(),
                None => format!("{field} is invalid"),
            })
        })
        .collect();

    messages.sort();
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct Credentials {
        #[serde(default)]
        #[validate(length(min = 1, message = "username is required"))]
        username: String,
        #[serde(default)]
        #[validate(length(min = 1, message = "password is required"))]
        password: String,
    }

    #[test]
    fn test_valid_body_passes() {
        let body = Credentials {
            username: "ariayu".to_string(),
            password: "secret".to_string(),
        };

        let parsed = validated(Ok(Json(body)), "login failed").unwrap();
        assert_eq!(parsed.username, "ariayu");
    }

    #[test]
    fn test_every_invalid_field_is_reported() {
        let body = Credentials {
            username: String::new(),
            password: String::new(),
        };

        match validated(Ok(Json(body)), "login failed") {
            Err(AppError::Validation { message, errors }) => {
                assert_eq!(message, "login failed");
                assert_eq!(
                    errors,
                    vec![
                        "password is required".to_string(),
                        "username is required".to_string()
                    ]
                );
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
