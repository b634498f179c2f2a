//! Password hashing with argon2id.
//!
//! Raw passwords exist only transiently in request handling; the store
//! only ever sees the PHC-format hash string.

use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use rand::rngs::OsRng;

use crate::domain::error::JournalError;

pub fn hash_password(password: &str) -> Result<String, JournalError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default());
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| JournalError::validation("password", e.to_string()))?;
    Ok(hash.to_string())
}

pub fn verify_password(stored: &str, password: &str) -> bool {
    let parsed = match PasswordHash::new(stored) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Burn one argon2 evaluation against a fixed salt.
///
/// Called on login for unknown emails so that the unknown-email and
/// wrong-password paths take comparable time.
pub fn equalize_timing(password: &str) {
    if let Ok(salt) = SaltString::from_b64("AAAAAAAAAAAAAAAAAAAAAA") {
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default());
        let _ = argon2.hash_password(password.as_bytes(), &salt);
    }
}
