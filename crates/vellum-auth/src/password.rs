//! Password hashing using Argon2id.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::{AuthError, AuthResult};

/// Hash a password with Argon2id, producing a PHC-format string.
///
/// A fresh random salt is generated per call, so hashing the same password
/// twice yields different strings.
pub fn hash_password(password: &str) -> AuthResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored PHC-format hash.
///
/// Returns `Ok(false)` on mismatch. A stored hash that does not parse as a
/// PHC string, or parses without a hash output, is reported as
/// `CorruptHash`, never as a mismatch, so callers can tell "wrong password"
/// apart from "damaged credential row".
pub fn verify_password(password: &str, hash: &str) -> AuthResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AuthError::CorruptHash(e.to_string()))?;
    // A truncated row can still parse as PHC with only salt and params.
    if parsed_hash.hash.is_none() {
        return Err(AuthError::CorruptHash(
            "PHC string has no hash output".to_string(),
        ));
    }
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &hash).unwrap());
    }

    #[test]
    fn test_verify_wrong_password() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(!verify_password("incorrect horse", &hash).unwrap());
    }

    #[test]
    fn test_hash_is_phc_format() {
        let hash = hash_password("secret").unwrap();
        assert!(hash.starts_with("$argon2id$"));
    }

    #[test]
    fn test_same_password_different_hashes() {
        let hash1 = hash_password("secret").unwrap();
        let hash2 = hash_password("secret").unwrap();
        // Random salts mean the strings differ even for equal passwords
        assert_ne!(hash1, hash2);
        assert!(verify_password("secret", &hash1).unwrap());
        assert!(verify_password("secret", &hash2).unwrap());
    }

    #[test]
    fn test_verify_corrupt_hash() {
        let result = verify_password("secret", "not-a-phc-string");
        assert!(matches!(result, Err(AuthError::CorruptHash(_))));
    }

    #[test]
    fn test_verify_truncated_hash() {
        let hash = hash_password("secret").unwrap();
        let truncated = &hash[..hash.len() / 2];
        assert!(matches!(
            verify_password("secret", truncated),
            Err(AuthError::CorruptHash(_))
        ));
    }

    #[test]
    fn test_verify_hash_without_output_is_corrupt() {
        // Parses as PHC (algorithm, params, salt) but carries no hash output.
        let salt_only = "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA";
        assert!(matches!(
            verify_password("secret", salt_only),
            Err(AuthError::CorruptHash(_))
        ));
    }

    #[test]
    fn test_empty_password_round_trip() {
        let hash = hash_password("").unwrap();
        assert!(verify_password("", &hash).unwrap());
        assert!(!verify_password("nonempty", &hash).unwrap());
    }
}
