//! Password hashing
//!
//! Argon2id with a random salt per hash. Hashing is deliberately slow, so
//! both operations run on the blocking thread pool.

use std::sync::OnceLock;

use argon2::password_hash::{
    Error as PasswordHashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use rand::rngs::OsRng;

use crate::error::AppError;

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 6;

/// Hash used to spend comparable time when the account does not exist
static DUMMY_HASH: OnceLock<String> = OnceLock::new();

fn hash_blocking(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

fn verify_blocking(password: &str, stored_hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| AppError::Internal(format!("Stored password hash is malformed: {e}")))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(PasswordHashError::Password) => Ok(false),
        Err(other) => Err(AppError::Internal(format!(
            "Password verification failed: {other}"
        ))),
    }
}

/// Hash a plaintext password into a PHC string
pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || hash_blocking(&password))
        .await
        .map_err(|e| AppError::Internal(format!("Hashing task failed: {e}")))?
}

/// Check a plaintext password against a stored PHC string
pub async fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AppError> {
    let password = password.to_owned();
    let stored_hash = stored_hash.to_owned();
    tokio::task::spawn_blocking(move || verify_blocking(&password, &stored_hash))
        .await
        .map_err(|e| AppError::Internal(format!("Verification task failed: {e}")))?
}

/// Burn one verification so a lookup miss costs about as much as a mismatch.
pub async fn verify_against_dummy(password: &str) -> Result<(), AppError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || {
        let hash = match DUMMY_HASH.get() {
            Some(hash) => hash.clone(),
            None => {
                let hash = hash_blocking("dummy-password-for-timing")?;
                DUMMY_HASH.get_or_init(|| hash).clone()
            }
        };
        verify_blocking(&password, &hash).map(|_| ())
    })
    .await
    .map_err(|e| AppError::Internal(format!("Verification task failed: {e}")))?
}
