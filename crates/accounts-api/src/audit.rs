//! Security audit logging
//!
//! Structured logging of authentication and account-management events.
//! Every event goes to the `audit` tracing target so it can be filtered and
//! routed separately from application logs:
//!
//! ```text
//! RUST_LOG=audit=info,accounts_api=debug
//! ```
//!
//! Passwords and tokens are never part of an event.

use axum::http::{header, HeaderMap};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Security audit event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    /// Credentials verified and a token was issued
    LoginSuccess {
        user_id: String,
        username: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Unknown username, wrong password or unreadable stored hash
    LoginFailure {
        username: String,
        reason: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Missing, malformed, expired or forged bearer token
    InvalidToken {
        ip_address: Option<String>,
        user_agent: Option<String>,
        reason: String,
    },

    /// Authenticated caller without the role a route requires
    AccessDenied {
        user_id: Option<String>,
        username: Option<String>,
        resource: String,
        required_role: Option<String>,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    UserCreated {
        user_id: String,
        username: String,
        role: String,
    },

    UserUpdated {
        user_id: String,
        username: String,
        password_changed: bool,
        role: String,
    },

    UserDeleted {
        user_id: String,
        username: String,
    },
}

/// Client details attached to audit events
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestContext {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            ip_address: extract_ip_address(headers),
            user_agent: extract_user_agent(headers),
        }
    }
}

/// Log a security audit event with structured fields
///
/// The event is also serialized to JSON so log aggregators receive the full
/// record in one field:
///
/// ```json
/// {"event_type":"login_failure","username":"ariayu","reason":"password mismatch","ip_address":"203.0.113.1","user_agent":null}
/// ```
pub fn audit_log(event: &AuditEvent) {
    let timestamp = Utc::now();

    let event_json = serde_json::to_string(event)
        .unwrap_or_else(|e| format!("{{\"error\":\"Failed to serialize audit event: {e}\"}}"));

    match event {
        AuditEvent::LoginSuccess {
            user_id,
            username,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                username = %username,
                ip_address = ?ip_address,
                "Login successful"
            );
        }
        AuditEvent::LoginFailure {
            username,
            reason,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                username = %username,
                reason = %reason,
                ip_address = ?ip_address,
                "Login failed"
            );
        }
        AuditEvent::InvalidToken {
            ip_address, reason, ..
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                ip_address = ?ip_address,
                reason = %reason,
                "Invalid token"
            );
        }
        AuditEvent::AccessDenied {
            user_id,
            username,
            resource,
            required_role,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = ?user_id,
                username = ?username,
                resource = %resource,
                required_role = ?required_role,
                ip_address = ?ip_address,
                "Access denied"
            );
        }
        AuditEvent::UserCreated {
            user_id,
            username,
            role,
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                username = %username,
                role = %role,
                "User created"
            );
        }
        AuditEvent::UserUpdated {
            user_id,
            username,
            password_changed,
            role,
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                username = %username,
                password_changed = %password_changed,
                role = %role,
                "User updated"
            );
        }
        AuditEvent::UserDeleted { user_id, username } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                username = %username,
                "User deleted"
            );
        }
    }
}

/// Extract the client IP address from proxy headers
///
/// Checks `X-Forwarded-For` (first hop) and then `X-Real-IP`.
pub fn extract_ip_address(headers: &HeaderMap) -> Option<String> {
    if let Some(xff) = headers.get("x-forwarded-for") {
        if let Ok(xff_str) = xff.to_str() {
            if let Some(first_ip) = xff_str.split(',').next() {
                return Some(first_ip.trim().to_string());
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            return Some(ip_str.to_string());
        }
    }

    None
}

pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|ua| ua.to_str().ok())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_event_serialization() {
        let event = AuditEvent::LoginFailure {
            username: "ariayu".to_string(),
            reason: "password mismatch".to_string(),
            ip_address: Some("192.168.1.1".to_string()),
            user_agent: None,
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""event_type":"login_failure""#));
        assert!(json.contains("ariayu"));
    }

    #[test]
    fn test_audit_log_does_not_panic() {
        audit_log(&AuditEvent::LoginSuccess {
            user_id: "id-1".to_string(),
            username: "ariayu".to_string(),
            ip_address: Some("192.168.1.1".to_string()),
            user_agent: Some("Test Agent".to_string()),
        });
        audit_log(&AuditEvent::AccessDenied {
            user_id: Some("id-2".to_string()),
            username: Some("budi".to_string()),
            resource: "/api/v1/users".to_string(),
            required_role: Some("admin".to_string()),
            ip_address: None,
            user_agent: None,
        });
        audit_log(&AuditEvent::UserDeleted {
            user_id: "id-2".to_string(),
            username: "budi".to_string(),
        });
    }

    #[test]
    fn test_extract_ip_from_x_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            "203.0.113.1, 198.51.100.1".parse().unwrap(),
        );

        assert_eq!(
            extract_ip_address(&headers),
            Some("203.0.113.1".to_string())
        );
    }

    #[test]
    fn test_extract_ip_from_x_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "203.0.113.1".parse().unwrap());

        assert_eq!(
            extract_ip_address(&headers),
            Some("203.0.113.1".to_string())
        );
    }

    #[test]
    fn test_request_context_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, "curl/8.0".parse().unwrap());

        let ctx = RequestContext::from_headers(&headers);
        assert_eq!(ctx.ip_address, None);
        assert_eq!(ctx.user_agent.as_deref(), Some("curl/8.0"));
        assert_eq!(RequestContext::from_headers(&HeaderMap::new()), RequestContext::default());
    }
}
