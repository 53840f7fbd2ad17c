//! Password hashing and verification (Argon2id, PHC strings at rest).

use std::str::FromStr;
use std::sync::LazyLock;

use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHashString, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

static HASHER: LazyLock<Argon2<'static>> = LazyLock::new(Argon2::default);

/// Verified against when the account does not exist, so unknown usernames cost
/// the same as wrong passwords.
static DUMMY_HASH: LazyLock<Option<PasswordHash>> = LazyLock::new(|| hash("").ok());

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("stored value is not a PHC string")]
    InvalidPhc,
}

/// A salted password hash.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PasswordHash(PasswordHashString);

impl PasswordHash {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for PasswordHash {
    type Err = PasswordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PasswordHashString::new(s)
            .map(PasswordHash)
            .map_err(|_| PasswordError::InvalidPhc)
    }
}

/// Hash a cleartext password with a fresh random salt.
pub fn hash(password: &str) -> Result<PasswordHash, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let hashed = HASHER
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::Hash(e.to_string()))?;
    Ok(PasswordHash(hashed.serialize()))
}

/// Check `password` against `stored`; with `None` a dummy hash is verified instead.
pub fn verify(password: &str, stored: Option<&PasswordHash>) -> bool {
    let Some(hash) = stored.or(DUMMY_HASH.as_ref()) else {
        return false;
    };
    let matched = HASHER
        .verify_password(password.as_bytes(), &hash.0.password_hash())
        .is_ok();
    matched && stored.is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let h = hash("Secret1!").unwrap();
        assert!(h.as_str().starts_with("$argon2id$"));
        assert!(verify("Secret1!", Some(&h)));
        assert!(!verify("secret1!", Some(&h)));
    }

    #[test]
    fn missing_account_never_verifies() {
        assert!(!verify("", None));
        assert!(!verify("anything", None));
    }

    #[test]
    fn parses_stored_phc() {
        let h = hash("Secret1!").unwrap();
        let parsed: PasswordHash = h.as_str().parse().unwrap();
        assert!(verify("Secret1!", Some(&parsed)));
        assert_eq!("plain".parse::<PasswordHash>(), Err(PasswordError::InvalidPhc));
    }
}
