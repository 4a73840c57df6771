//! Password hashing. Only argon2 PHC strings ever reach the database.

use anyhow::anyhow;
use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use rand_core::OsRng;

/// Hashes a password with a fresh random salt, producing a PHC string
pub fn hash(password: &str) -> Result<String, anyhow::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hashed = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow!("hashing password: {err}"))?;

    Ok(hashed.to_string())
}

/// Checks a password against a PHC string previously produced by [hash]. A stored
/// value that isn't a valid PHC string is an error rather than a mismatch.
pub fn verify(password: &str, stored_hash: &str) -> Result<bool, anyhow::Error> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|err| anyhow!("stored password hash is malformed: {err}"))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Runs [hash] on the blocking thread pool so argon2 doesn't stall the async runtime
pub async fn hash_off_thread(password: String) -> Result<String, anyhow::Error> {
    tokio::task::spawn_blocking(move || hash(&password))
        .await
        .map_err(|err| anyhow!("password hashing task failed: {err}"))?
}

/// Runs [verify] on the blocking thread pool
pub async fn verify_off_thread(password: String, stored_hash: String) -> Result<bool, anyhow::Error> {
    tokio::task::spawn_blocking(move || verify(&password, &stored_hash))
        .await
        .map_err(|err| anyhow!("password verification task failed: {err}"))?
}
