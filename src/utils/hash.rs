use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use crate::{config::ConfigError, error::AppError};

/// Argon2id hasher with configurable cost.
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    pub fn new(memory_kib: u32, iterations: u32) -> Result<Self, ConfigError> {
        let params =
            Params::new(memory_kib, iterations, 1, None).map_err(|e| ConfigError::Invalid {
                var: "PASSWORD_HASH_MEMORY_KIB/PASSWORD_HASH_ITERATIONS",
                reason: e.to_string(),
            })?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Produces a salted PHC string for `password`.
    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(e.to_string()))?
            .to_string();

        Ok(password_hash)
    }

    /// Checks `password` against a stored PHC string.
    ///
    /// The cost parameters are read from the stored hash, so hashes made under an
    /// older configuration still verify. An unparsable hash is a mismatch.
    pub fn verify(&self, password: &str, password_hash: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(password_hash) else {
            tracing::warn!("Stored password hash could not be parsed");
            return false;
        };

        self.argon2()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> PasswordHasher {
        PasswordHasher::new(1024, 1).unwrap()
    }

    #[test]
    fn hash_then_verify() {
        let hasher = cheap();
        let hash = hasher.hash("secret1").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("secret1", &hash));
        assert!(!hasher.verify("secret2", &hash));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let hasher = cheap();
        let a = hasher.hash("secret1").unwrap();
        let b = hasher.hash("secret1").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_hash_is_a_mismatch() {
        assert!(!cheap().verify("secret1", "not-a-phc-string"));
        assert!(!cheap().verify("secret1", ""));
    }

    #[test]
    fn hash_made_with_other_cost_still_verifies() {
        let old = PasswordHasher::new(2048, 2).unwrap();
        let hash = old.hash("secret1").unwrap();
        assert!(cheap().verify("secret1", &hash));
    }

    #[test]
    fn rejects_invalid_cost() {
        assert!(PasswordHasher::new(1, 0).is_err());
    }
}
