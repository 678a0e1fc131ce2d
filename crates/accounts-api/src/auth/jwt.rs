//! JWT token generation and validation
//!
//! Bearer tokens are HMAC-SHA256 signed and carry only the subject (user id)
//! and a fixed 24 hour validity window. Tokens are self-contained: there is no
//! server-side session table, so a token cannot be revoked before it expires.

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Lifetime of an issued token in seconds
pub const TOKEN_VALIDITY_SECS: u64 = 24 * 60 * 60;

/// Algorithms accepted on verification; anything outside the HMAC family is rejected
const ACCEPTED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// JWT claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user ID
    pub sub: String,
    /// Issued at timestamp (Unix epoch)
    pub iat: u64,
    /// Expiration timestamp (Unix epoch)
    pub exp: u64,
}

/// JWT token generation and validation errors
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Token signing secret is not configured")]
    MissingSecret,

    #[error("Failed to encode JWT: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid token format")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Unexpected token signing algorithm")]
    InvalidAlgorithm,

    #[error("System time error: {0}")]
    SystemTimeError(#[from] std::time::SystemTimeError),
}

/// Issues and verifies signed bearer tokens with a process-wide secret
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer").finish_non_exhaustive()
    }
}

fn now_secs() -> Result<u64, JwtError> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

impl TokenIssuer {
    /// Create an issuer for the given HMAC secret
    ///
    /// Fails with `JwtError::MissingSecret` when the secret is empty.
    pub fn new(secret: &str) -> Result<Self, JwtError> {
        if secret.trim().is_empty() {
            return Err(JwtError::MissingSecret);
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        })
    }

    /// Issue a token for `subject` that expires 24 hours from now
    ///
    /// # Example
    ///
    /// ```
    /// use accounts_api::auth::jwt::TokenIssuer;
    ///
    /// let issuer = TokenIssuer::new("change-me").unwrap();
    /// let token = issuer.issue("user-42").unwrap();
    /// assert_eq!(issuer.verify(&token).unwrap(), "user-42");
    /// ```
    pub fn issue(&self, subject: &str) -> Result<String, JwtError> {
        self.issue_at(subject, now_secs()?)
    }

    /// Issue a token as if the current time were `issued_at`
    pub fn issue_at(&self, subject: &str, issued_at: u64) -> Result<String, JwtError> {
        let claims = Claims {
            sub: subject.to_string(),
            iat: issued_at,
            exp: issued_at + TOKEN_VALIDITY_SECS,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Verify a token and return its subject
    pub fn verify(&self, token: &str) -> Result<String, JwtError> {
        self.verify_at(token, now_secs()?).map(|claims| claims.sub)
    }

    /// Verify a token against the clock value `now` and return its claims
    ///
    /// Rejects a bad signature, an algorithm outside the HMAC family, a
    /// malformed token, an empty subject and any `now >= exp`.
    pub fn verify_at(&self, token: &str, now: u64) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();
        validation.set_required_spec_claims(&["exp", "sub"]);
        // Expiry is checked below against the caller's clock, without leeway
        validation.validate_exp = false;

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                ErrorKind::InvalidAlgorithm => JwtError::InvalidAlgorithm,
                _ => JwtError::InvalidToken,
            })?;

        let claims = token_data.claims;
        if now >= claims.exp {
            return Err(JwtError::ExpiredToken);
        }
        if claims.sub.is_empty() {
            return Err(JwtError::InvalidToken);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use proptest::prelude::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("test-secret").unwrap()
    }

    #[test]
    fn test_issue_and_verify() {
        let issuer = issuer();
        let token = issuer.issue("user-1").unwrap();

        assert!(!token.is_empty());
        assert_eq!(issuer.verify(&token).unwrap(), "user-1");
    }

    #[test]
    fn test_expiry_is_24_hours() {
        let issuer = issuer();
        let issued_at = 1_700_000_000;
        let token = issuer.issue_at("user-1", issued_at).unwrap();

        let claims = issuer.verify_at(&token, issued_at).unwrap();
        assert_eq!(claims.exp - claims.iat, TOKEN_VALIDITY_SECS);

        // Still valid one second before expiry
        assert!(issuer
            .verify_at(&token, issued_at + TOKEN_VALIDITY_SECS - 1)
            .is_ok());

        // Rejected from the expiry instant on
        assert!(matches!(
            issuer.verify_at(&token, issued_at + TOKEN_VALIDITY_SECS),
            Err(JwtError::ExpiredToken)
        ));
    }

    #[test]
    fn test_expired_token_rejected_by_wall_clock() {
        let issuer = issuer();
        let now = now_secs().unwrap();
        let token = issuer
            .issue_at("user-1", now - TOKEN_VALIDITY_SECS - 60)
            .unwrap();

        assert!(matches!(issuer.verify(&token), Err(JwtError::ExpiredToken)));
    }

    #[test]
    fn test_wrong_secret() {
        let token = TokenIssuer::new("secret1").unwrap().issue("user-1").unwrap();
        let result = TokenIssuer::new("secret2").unwrap().verify(&token);

        assert!(matches!(result, Err(JwtError::InvalidSignature)));
    }

    #[test]
    fn test_missing_secret() {
        assert!(matches!(TokenIssuer::new(""), Err(JwtError::MissingSecret)));
        assert!(matches!(TokenIssuer::new("   "), Err(JwtError::MissingSecret)));
    }

    #[test]
    fn test_malformed_tokens() {
        let issuer = issuer();
        for token in ["", "invalid.token.here", "not-a-jwt", "a.b"] {
            assert!(
                matches!(issuer.verify(token), Err(JwtError::InvalidToken)),
                "token {token:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_other_hmac_algorithms_accepted() {
        let now = now_secs().unwrap();
        let claims = Claims {
            sub: "user-1".to_string(),
            iat: now,
            exp: now + 60,
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert_eq!(issuer().verify(&token).unwrap(), "user-1");
    }

    #[test]
    fn test_non_hmac_algorithm_rejected() {
        let issuer = issuer();
        let valid = issuer.issue("user-1").unwrap();
        let mut parts = valid.split('.');
        let _header = parts.next().unwrap();
        let payload = parts.next().unwrap();
        let signature = parts.next().unwrap();

        let rs256_header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#);
        let forged = format!("{rs256_header}.{payload}.{signature}");
        assert!(matches!(
            issuer.verify(&forged),
            Err(JwtError::InvalidAlgorithm)
        ));

        let none_header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
        let unsigned = format!("{none_header}.{payload}.");
        assert!(issuer.verify(&unsigned).is_err());
    }

    #[test]
    fn test_empty_subject_rejected() {
        let issuer = issuer();
        let token = issuer.issue("").unwrap();
        assert!(matches!(issuer.verify(&token), Err(JwtError::InvalidToken)));
    }

    proptest! {
        #[test]
        fn prop_verify_returns_issued_subject(subject in "[A-Za-z0-9_-]{1,64}") {
            let issuer = issuer();
            let token = issuer.issue(&subject).unwrap();
            prop_assert_eq!(issuer.verify(&token).unwrap(), subject);
        }
    }
}
