//! Authentication is delegated to an `Identity` provider. A provider turns credentials into a user
//! ID and knows nothing about the user's records.

mod memory;

pub use memory::MemoryIdentity;

use crate::error::Res;
use anyhow::{anyhow, ensure};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

/// Passwords shorter than this are rejected at registration.
pub const MIN_PASSWORD_LEN: usize = 6;

#[async_trait::async_trait]
pub trait Identity: Send + Sync {
    /// Creates an account and returns the new user's ID.
    async fn register(&self, email: &str, password: &str) -> Res<String>;

    /// Checks the credentials and returns the user's ID.
    async fn login(&self, email: &str, password: &str) -> Res<String>;

    async fn logout(&self) -> Res<()>;
}

/// Trims and lowercases an email address so that lookups are case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Rejects obviously malformed credentials before they reach a provider.
pub fn validate_credentials(email: &str, password: &str) -> Res<()> {
    let email = email.trim();
    ensure!(!email.is_empty(), "An email address is required");
    ensure!(
        email.contains('@') && !email.starts_with('@') && !email.ends_with('@'),
        "'{email}' is not a valid email address"
    );
    ensure!(!password.is_empty(), "A password is required");
    ensure!(
        password.chars().count() >= MIN_PASSWORD_LEN,
        "The password must be at least {MIN_PASSWORD_LEN} characters long"
    );
    Ok(())
}

pub(crate) fn hash_password(password: &str) -> Res<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("Unable to hash the password: {e}"))?;
    Ok(hash.to_string())
}

pub(crate) fn verify_password(hash: &str, password: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(parsed) => parsed,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
