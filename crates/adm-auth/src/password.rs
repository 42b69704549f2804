//! Password hashing
//!
//! New hashes are Argon2id PHC strings. Databases carried over from the
//! earlier backend hold bcrypt hashes (`$2a$`, `$2b$`, `$2y$`); those still
//! verify and are reported by [`PasswordHasher::needs_rehash`] so callers can
//! upgrade them after a successful login.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

const BCRYPT_PREFIXES: [&str; 3] = ["$2a$", "$2b$", "$2y$"];

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hash(String),
}

/// Hashes and verifies user passwords
#[derive(Default)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash a plaintext password
    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        use argon2::password_hash::PasswordHasher as _;

        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::Hash(e.to_string()))
    }

    /// Verify a plaintext password against a stored hash
    ///
    /// A stored value that is neither a PHC string nor a bcrypt hash never
    /// matches.
    pub fn verify(&self, plaintext: &str, stored_hash: &str) -> bool {
        if is_bcrypt(stored_hash) {
            return bcrypt::verify(plaintext, stored_hash).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Stored bcrypt hash is malformed");
                false
            });
        }

        match PasswordHash::new(stored_hash) {
            Ok(parsed) => self
                .argon2
                .verify_password(plaintext.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => {
                tracing::warn!("Stored password hash is malformed");
                false
            }
        }
    }

    /// Whether a stored hash should be replaced with a fresh Argon2id hash
    pub fn needs_rehash(&self, stored_hash: &str) -> bool {
        is_bcrypt(stored_hash)
    }
}

fn is_bcrypt(stored_hash: &str) -> bool {
    BCRYPT_PREFIXES
        .iter()
        .any(|prefix| stored_hash.starts_with(prefix))
}
