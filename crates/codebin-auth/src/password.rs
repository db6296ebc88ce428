//! Password hashing
//!
//! Argon2id with the crate's default parameters (19 MiB, 2 passes, 1 lane)
//! and a fresh OS-random salt per hash. Hashes are stored as PHC strings.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::AuthError;

/// A well-formed hash that no password matches
///
/// Verified against when a login names an unknown account, so both
/// failure paths cost one full Argon2 computation.
pub const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$Y29kZWJpbi1sb2dpbi1kdW1teS1zYWx0$gS60OEVhbW6a2DA2LA6OSg95sLjYVYuYfpITa96jTTc";

/// Hash a plaintext password
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::PasswordHash(e.to_string()))
}

/// Verify a plaintext password against a stored hash
///
/// A malformed or foreign-format hash is reported as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("secret123").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("secret123", &hash));
        assert!(!verify_password("secret124", &hash));
    }

    #[test]
    fn test_hash_is_salted() {
        let hash1 = hash_password("secret123").unwrap();
        let hash2 = hash_password("secret123").unwrap();

        assert_ne!(hash1, hash2);
        assert!(verify_password("secret123", &hash1));
        assert!(verify_password("secret123", &hash2));
    }

    #[test]
    fn test_hash_never_contains_plaintext() {
        let hash = hash_password("plain-text-marker").unwrap();
        assert!(!hash.contains("plain-text-marker"));
    }

    #[test]
    fn test_malformed_hash_is_mismatch() {
        assert!(!verify_password("secret123", ""));
        assert!(!verify_password("secret123", "not-a-hash"));
        assert!(!verify_password("secret123", "$2b$12$R9h/cIPz0gi.URNNX3kh2OPST9/PgBkqquzi.Ss7KIUgO2t0jWMUW"));
    }

    #[test]
    fn test_dummy_hash_matches_nothing() {
        assert!(PasswordHash::new(DUMMY_HASH).is_ok());
        assert!(!verify_password("", DUMMY_HASH));
        assert!(!verify_password("admin", DUMMY_HASH));
    }
}
