//! Authentication and authorization module
//!
//! - Argon2id password hashing
//! - Signed bearer tokens with a fixed 24 hour validity
//! - Login and account management service
//! - Authorization gate and role checks for protected routes

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod service;

pub use jwt::{Claims, JwtError, TokenIssuer, TOKEN_VALIDITY_SECS};
pub use middleware::{auth_middleware, require_role, CurrentUser};
pub use password::{hash_password, hash_password_with_config, verify_password, PasswordError};
pub use service::AuthService;
