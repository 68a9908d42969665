use argon2::{
    Argon2,
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

/// Argon2id with a random salt, stored as a PHC string.
pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Malformed stored hashes never verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifies_only_the_matching_password() {
        let stored = hash_password("scrum-half").unwrap();
        assert!(verify_password("scrum-half", &stored));
        assert!(!verify_password("fly-half", &stored));
        assert!(!verify_password("scrum-half", "not-a-phc-string"));
    }

    #[test]
    fn salts_differ_between_hashes() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }

    #[test]
    fn stores_argon2id_phc_strings() {
        let stored = hash_password("loosehead").unwrap();
        assert!(stored.starts_with("$argon2id$"));
        assert!(!stored.contains("loosehead"));
    }
}
