use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// Hash a plaintext password into a salted argon2id PHC string. The
/// plaintext is never stored anywhere.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Constant-style verification against a stored PHC string. An unparsable
/// hash verifies as false rather than erroring, so login failure stays
/// uniform.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Minimum strength policy: at least 8 characters including one letter and
/// one digit.
pub fn check_strength(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < 8 {
        return Err("password must be at least 8 characters long");
    }
    if !password.chars().any(|c| c.is_alphabetic()) {
        return Err("password must contain at least one letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("password must contain at least one digit");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let hash = hash_password("Abcd1234!").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("Abcd1234!", &hash));
        assert!(!verify_password("Abcd1234?", &hash));
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("Abcd1234!").unwrap();
        let b = hash_password("Abcd1234!").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn garbage_stored_hash_never_verifies() {
        assert!(!verify_password("Abcd1234!", "not-a-phc-string"));
        assert!(!verify_password("Abcd1234!", ""));
    }

    #[test]
    fn strength_policy() {
        assert!(check_strength("Abcd1234").is_ok());
        assert!(check_strength("short1").is_err());
        assert!(check_strength("12345678").is_err());
        assert!(check_strength("abcdefgh").is_err());
    }
}
