//! Shared-password authentication.
//!
//! The gateway is protected by a single password. It is held only as an
//! Argon2id PHC string; a plain-text password from configuration is hashed
//! once at startup and then dropped.

use argon2::{
    Argon2, PasswordHash,
    password_hash::{PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

/// Password handling errors.
#[derive(Debug, Error)]
pub enum PasswordError {
    /// Hashing failed.
    #[error("failed to hash password: {0}")]
    HashError(String),

    /// Verification failed for a reason other than a mismatch.
    #[error("failed to verify password: {0}")]
    VerifyError(String),

    /// Not a PHC hash string.
    #[error("invalid password hash format")]
    InvalidHash,
}

/// The shared login password.
#[derive(Clone)]
pub struct SharedPassword {
    hash: String,
}

impl SharedPassword {
    /// Hash a plain-text password with a fresh salt.
    ///
    /// # Errors
    ///
    /// Returns `PasswordError::HashError` if hashing fails.
    ///
    /// # Example
    ///
    /// ```
    /// use imagegate_core::auth::SharedPassword;
    ///
    /// let password = SharedPassword::from_plain("gateway_password").unwrap();
    /// assert!(password.phc().starts_with("$argon2id$"));
    /// assert!(password.verify("gateway_password").unwrap());
    /// ```
    pub fn from_plain(password: &str) -> Result<Self, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashError(e.to_string()))?
            .to_string();
        Ok(Self { hash })
    }

    /// Use a hash produced elsewhere.
    ///
    /// # Errors
    ///
    /// Returns `PasswordError::InvalidHash` if `hash` is not a PHC string.
    pub fn from_hash(hash: &str) -> Result<Self, PasswordError> {
        PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHash)?;
        Ok(Self {
            hash: hash.to_string(),
        })
    }

    /// The PHC string.
    #[must_use]
    pub fn phc(&self) -> &str {
        &self.hash
    }

    /// Check a login attempt. A wrong password is `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Returns an error only when verification itself breaks.
    pub fn verify(&self, candidate: &str) -> Result<bool, PasswordError> {
        let parsed = PasswordHash::new(&self.hash).map_err(|_| PasswordError::InvalidHash)?;
        match Argon2::default().verify_password(candidate.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordError::VerifyError(e.to_string())),
        }
    }
}

impl std::fmt::Debug for SharedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedPassword").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_plain_verifies() {
        let password = SharedPassword::from_plain("open sesame").unwrap();
        assert!(password.verify("open sesame").unwrap());
        assert!(!password.verify("open barley").unwrap());
        assert!(!password.verify("").unwrap());
    }

    #[test]
    fn test_salt_differs_per_hash() {
        let a = SharedPassword::from_plain("shared").unwrap();
        let b = SharedPassword::from_plain("shared").unwrap();
        assert_ne!(a.phc(), b.phc());
    }

    #[test]
    fn test_from_hash_round_trip() {
        let original = SharedPassword::from_plain("letmein").unwrap();
        let restored = SharedPassword::from_hash(original.phc()).unwrap();
        assert!(restored.verify("letmein").unwrap());
    }

    #[test]
    fn test_from_hash_rejects_plain_text() {
        assert!(matches!(
            SharedPassword::from_hash("plain-text"),
            Err(PasswordError::InvalidHash)
        ));
    }

    #[test]
    fn test_debug_hides_hash() {
        let password = SharedPassword::from_plain("secret").unwrap();
        assert!(!format!("{password:?}").contains("argon2"));
    }
}
