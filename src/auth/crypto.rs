//! Password hashing and policy validation.
//!
//! Passwords are only ever stored as salted Argon2id hashes. An earlier
//! incarnation of the application compared plain SHA-256 digests; that
//! path is a defect and has no equivalent here.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use serde::{Deserialize, Serialize};

use crate::error::{codes, ServiceError, ServiceResult};

/// Password requirements configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordPolicy {
    #[serde(default = "default_min_length")]
    pub min_length: usize,
    #[serde(default)]
    pub require_uppercase: bool,
    #[serde(default)]
    pub require_number: bool,
}

fn default_min_length() -> usize {
    8
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: default_min_length(),
            require_uppercase: false,
            require_number: false,
        }
    }
}

impl PasswordPolicy {
    /// Validate a candidate password against this policy.
    pub fn validate(&self, password: &str) -> ServiceResult<()> {
        if password.len() < self.min_length {
            return Err(ServiceError::validation(
                codes::WEAK_PASSWORD,
                format!("password must be at least {} characters", self.min_length),
            ));
        }
        if self.require_uppercase && !password.chars().any(|c| c.is_uppercase()) {
            return Err(ServiceError::validation(
                codes::WEAK_PASSWORD,
                "password must contain an uppercase letter",
            ));
        }
        if self.require_number && !password.chars().any(|c| c.is_numeric()) {
            return Err(ServiceError::validation(
                codes::WEAK_PASSWORD,
                "password must contain a number",
            ));
        }
        Ok(())
    }
}

/// Hash a password using Argon2id with a fresh per-hash salt.
pub fn hash_password(password: &str) -> ServiceResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| ServiceError::hashing_failed())
}

/// Verify a password against its stored hash.
///
/// The comparison inside the argon2 crate is constant-time.
pub fn verify_password(password: &str, hash: &str) -> ServiceResult<bool> {
    let parsed = PasswordHash::new(hash).map_err(|_| ServiceError::invalid_credentials())?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Burn roughly one verification's worth of work.
///
/// Called when a login names an unknown user, so the response time does
/// not reveal whether the username exists.
pub fn dummy_verify() {
    let _ = hash_password("dummy-password-for-timing");
}
