/// Password hashing and verification using Argon2id
///
/// Passwords are stored as PHC strings (algorithm, parameters, salt and
/// digest in one value), so no separate salt column is needed:
/// - Algorithm: Argon2id (memory-hard, resistant to GPU attacks)
/// - Salt: 16 bytes from the OS RNG
/// - Cost: configurable through `PasswordHashConfig`
use accounts_core::PasswordHashConfig;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params,
};
use thiserror::Error;

/// Password hashing and verification errors
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashingFailed(String),

    #[error("Failed to verify password: {0}")]
    VerificationFailed(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

fn argon2_for(config: &PasswordHashConfig) -> Result<Argon2<'static>, PasswordError> {
    let params = Params::new(
        config.memory_cost,
        config.time_cost,
        config.parallelism,
        Some(32),
    )
    .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

    Ok(Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        params,
    ))
}

/// Hash a plaintext password with the default cost parameters
///
/// # Example
///
/// ```no_run
/// use accounts_api::auth::password::hash_password;
///
/// let hash = hash_password("secret").expect("Failed to hash password");
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    hash_password_with_config(password, &PasswordHashConfig::default())
}

/// Hash a password with custom cost parameters
///
/// # Returns
///
/// * `Ok(String)` - PHC string format hash
/// * `Err(PasswordError)` - If the parameters are invalid or hashing fails
pub fn hash_password_with_config(
    password: &str,
    config: &PasswordHashConfig,
) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = argon2_for(config)?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

    Ok(password_hash.to_string())
}

/// Verify a plaintext password against a stored hash
///
/// The cost parameters are read from the PHC string itself, so hashes made
/// with older settings keep verifying after the configuration changes.
///
/// # Returns
///
/// * `Ok(true)` - Password matches
/// * `Ok(false)` - Password does not match
/// * `Err(PasswordError)` - The stored hash could not be parsed
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHashFormat)?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerificationFailed(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn light_config() -> PasswordHashConfig {
        PasswordHashConfig {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password_with_config("secret", &light_config()).unwrap();

        assert!(verify_password("secret", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn test_same_password_produces_different_hashes() {
        let config = light_config();
        let hash1 = hash_password_with_config("secret", &config).unwrap();
        let hash2 = hash_password_with_config("secret", &config).unwrap();

        // Random salt per hash
        assert_ne!(hash1, hash2);
        assert!(verify_password("secret", &hash1).unwrap());
        assert!(verify_password("secret", &hash2).unwrap());
    }

    #[test]
    fn test_hash_never_contains_plaintext() {
        let hash = hash_password_with_config("plaintext-marker", &light_config()).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("plaintext-marker"));
    }

    #[test]
    fn test_invalid_hash_format() {
        let result = verify_password("password", "invalid-hash-format");
        assert!(matches!(result, Err(PasswordError::InvalidHashFormat)));
    }

    #[test]
    fn test_custom_config_is_encoded() {
        let config = PasswordHashConfig {
            memory_cost: 2048,
            time_cost: 2,
            parallelism: 2,
        };
        let hash = hash_password_with_config("secret", &config).unwrap();

        assert!(hash.contains("m=2048"));
        assert!(hash.contains("t=2"));
        assert!(hash.contains("p=2"));
        assert!(verify_password("secret", &hash).unwrap());
    }

    #[test]
    fn test_invalid_params_fail_hashing() {
        let config = PasswordHashConfig {
            memory_cost: 1,
            time_cost: 0,
            parallelism: 0,
        };
        let result = hash_password_with_config("secret", &config);
        assert!(matches!(result, Err(PasswordError::HashingFailed(_))));
    }
}
