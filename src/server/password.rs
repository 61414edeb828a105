//! Argon2 password hashing for stored users.

use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use rand::RngCore;

use crate::error::Error;

/// Hash `password` into a PHC string with a fresh random salt.
pub fn hash(password: &str) -> Result<String, Error> {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);
    let salt =
        SaltString::encode_b64(&salt).map_err(|e| Error::Password(format!("salt: {e}")))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| Error::Password(format!("failed to hash password: {e}")))
}

/// Check `password` against a stored PHC string.
pub fn verify(password: &str, stored: &str) -> Result<bool, Error> {
    let parsed = PasswordHash::new(stored)
        .map_err(|e| Error::Password(format!("invalid stored hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let stored = hash("abcdef").unwrap();
        assert!(stored.starts_with("$argon2"));
        assert!(verify("abcdef", &stored).unwrap());
        assert!(!verify("abcdeg", &stored).unwrap());
    }

    #[test]
    fn salts_differ() {
        assert_ne!(hash("abcdef").unwrap(), hash("abcdef").unwrap());
    }

    #[test]
    fn garbage_hash_is_an_error() {
        assert!(verify("abcdef", "not-a-hash").is_err());
    }
}
