use argon2::{
    password_hash::{PasswordHasher, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::error::{AppError, AppResult};

/// Argon2id PHC string for a user's plain password. The plain value is not
/// kept anywhere after this returns.
pub fn derive_password_hash(plain: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|phc| phc.to_string())
        .map_err(|e| {
            error!(error = %e, "could not derive user password hash");
            AppError::Internal(anyhow::anyhow!("derive password hash: {e}"))
        })
}

/// Whether `plain` matches a stored PHC string. A malformed hash never matches.
#[cfg(test)]
pub fn password_matches(plain: &str, stored: &str) -> bool {
    use argon2::password_hash::{PasswordHash, PasswordVerifier};

    PasswordHash::new(stored)
        .map(|parsed| Argon2::default().verify_password(plain.as_bytes(), &parsed).is_ok())
        .unwrap_or(false)
}
