/// Authorization gate for protected routes
///
/// Extracts the bearer token from the Authorization header, verifies it and
/// resolves its subject to a stored account. On success the account is added
/// to the request extensions as [`CurrentUser`]. Any failure ends the request
/// with 401 before a handler runs.
use std::sync::Arc;

use accounts_core::{Role, User};
use axum::{
    body::Body,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::audit::{audit_log, AuditEvent, RequestContext};
use crate::error::AppError;
use crate::state::AppState;

/// Account resolved from the bearer token
///
/// Added to request extensions by [`auth_middleware`]; handlers take it as an
/// extractor.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn user(&self) -> &User {
        &self.0
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

/// Token carried by an Authorization header value
///
/// Returns `None` when the value does not mention the `Bearer` scheme. A value
/// that does not split into exactly two parts yields an empty token, which
/// then fails verification like any other bad token.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    if !header_value.contains("Bearer") {
        return None;
    }

    let parts: Vec<&str> = header_value.split_whitespace().collect();
    match parts.as_slice() {
        [_, token] => Some(*token),
        _ => Some(""),
    }
}

/// Authentication middleware that requires a valid bearer token
///
/// # Usage
///
/// ```ignore
/// use axum::{middleware, routing::get, Router};
///
/// let app = Router::new()
///     .route("/protected", get(handler))
///     .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
///     .with_state(state);
/// ```
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let ctx = RequestContext::from_headers(request.headers());

    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .ok_or_else(|| {
            reject_token(&ctx, "missing or malformed Authorization header".to_string())
        })?;

    let user = state
        .auth
        .authenticate(token)
        .await
        .map_err(|e| reject_token(&ctx, e.to_string()))?;

    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}

fn reject_token(ctx: &RequestContext, reason: String) -> AppError {
    audit_log(&AuditEvent::InvalidToken {
        ip_address: ctx.ip_address.clone(),
        user_agent: ctx.user_agent.clone(),
        reason,
    });
    AppError::Unauthorized
}

type RoleMiddlewareFuture =
    std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AppError>> + Send>>;

/// Middleware factory for role-based access control
///
/// Must be layered inside [`auth_middleware`]: a request without a resolved
/// identity is rejected with 401, a resolved identity lacking `required`
/// with 403.
///
/// ```ignore
/// let admin = Router::new()
///     .route("/users", get(list_users))
///     .route_layer(middleware::from_fn(require_role(Role::Admin)))
///     .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));
/// ```
pub fn require_role(
    required: Role,
) -> impl Fn(Request<Body>, Next) -> RoleMiddlewareFuture + Clone {
    move |request: Request<Body>, next: Next| {
        Box::pin(async move {
            let user = request
                .extensions()
                .get::<CurrentUser>()
                .ok_or(AppError::Unauthorized)?
                .user()
                .clone();

            if !user.role.satisfies(required) {
                let ctx = RequestContext::from_headers(request.headers());
                audit_log(&AuditEvent::AccessDenied {
                    user_id: Some(user.id),
                    username: Some(user.username),
                    resource: request.uri().path().to_string(),
                    required_role: Some(required.to_string()),
                    ip_address: ctx.ip_address,
                    user_agent: ctx.user_agent,
                });

                return Err(AppError::Forbidden);
            }

            Ok(next.run(request).await)
        })
    }
}
