//! Password hashing and verification with Argon2id.
//!
//! Hashes are PHC-format strings (`$argon2id$v=19$...`) stored in the
//! `password_hash` column. Both operations are CPU-heavy, so they run on the
//! blocking thread pool.

use crate::error::{AppError, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a password using Argon2id. Returns a PHC-format string.
pub async fn hash_password(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Generic(format!("Failed to hash password: {}", e)))
    })
    .await
    .map_err(|e| AppError::Generic(format!("Password hashing task failed: {}", e)))?
}

/// Verify a password against a PHC-format hash string.
///
/// Returns `Ok(false)` on mismatch and an error only if the stored hash is
/// malformed.
pub async fn verify_password(password: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&hash)
            .map_err(|e| AppError::Generic(format!("Invalid password hash: {}", e)))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .map_err(|e| AppError::Generic(format!("Password verification task failed: {}", e)))?
}
