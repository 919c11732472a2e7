//! Password hashing and verification using Argon2.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Argon2,
};
use once_cell::sync::Lazy;
use rand::rngs::OsRng;

/// Hash checked when no account matches, so both login failures cost one Argon2 verify
static DUMMY_HASH: Lazy<Option<String>> =
    Lazy::new(|| PasswordHasher::new().hash_password("share-me-no-such-account").ok());

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    HashingFailed(String),

    #[error("stored password hash is malformed")]
    InvalidHash,
}

/// Password hasher using Argon2 with default parameters.
#[derive(Clone, Default)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash a password into a PHC string suitable for storage.
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// Returns `Ok(false)` on mismatch; `Err` only when the stored hash is unreadable.
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHash)?;

        Ok(self
            .argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Spend the same work as `verify_password` for a login with no matching account
    pub fn verify_dummy(&self, password: &str) {
        match DUMMY_HASH.as_deref() {
            Some(hash) => {
                let _ = self.verify_password(password, hash);
            }
            None => tracing::warn!("Dummy password hash unavailable"),
        }
    }
}
