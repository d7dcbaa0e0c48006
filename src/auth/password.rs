// Password hashing and verification service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use std::sync::Arc;
use tracing::debug;

use crate::auth::error::AuthError;
use crate::config::HashingConfig;

/// Password service for hashing and verification (Argon2id)
///
/// Each hash embeds its own random salt and parameters in PHC string format, so
/// hashing the same password twice yields different strings that both verify.
#[derive(Clone)]
pub struct PasswordService {
    argon2: Argon2<'static>,
    /// Hash of a throwaway password, made with this service's parameters
    dummy_hash: Arc<str>,
}

const DUMMY_PASSWORD: &str = "kudos-unknown-account";

impl PasswordService {
    /// Create a PasswordService with the given work factor
    pub fn new(config: HashingConfig) -> Result<Self, AuthError> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|e| AuthError::PasswordHash(e.to_string()))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let dummy_hash = hash_with(&argon2, DUMMY_PASSWORD)?;
        Ok(Self {
            argon2,
            dummy_hash: Arc::from(dummy_hash),
        })
    }

    /// Hash a password using Argon2id with a fresh random salt
    pub fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        hash_with(&self.argon2, password)
    }

    /// Verify a password against a stored hash
    ///
    /// Never fails: an unparseable hash or a mismatch both yield `false`.
    /// Parameters are read from the stored hash, not from this service.
    pub fn verify_password(&self, password: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("Stored password hash is not a valid PHC string: {}", e);
                return false;
            }
        };
        self.argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    /// Spend the same work as verifying a real account, for logins with no account
    ///
    /// Always `false`.
    pub fn verify_without_account(&self, password: &str) -> bool {
        std::hint::black_box(self.verify_password(password, &self.dummy_hash));
        false
    }
}

fn hash_with(argon2: &Argon2<'_>, password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::PasswordHash(e.to_string()))
}

#[cfg(test)]
pub(crate) fn test_password_service() -> PasswordService {
    // Minimum-cost parameters keep the test suite fast
    PasswordService::new(HashingConfig {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    })
    .expect("valid test params")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_hash_then_verify() {
        let service = test_password_service();
        let hash = service.hash_password("Passw0rd!").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert_ne!(hash, "Passw0rd!");
        assert!(service.verify_password("Passw0rd!", &hash));
        assert!(!service.verify_password("passw0rd!", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        let service = test_password_service();
        let first = service.hash_password("Passw0rd!").unwrap();
        let second = service.hash_password("Passw0rd!").unwrap();

        assert_ne!(first, second);
        assert!(service.verify_password("Passw0rd!", &first));
        assert!(service.verify_password("Passw0rd!", &second));
    }

    #[test]
    fn test_verify_malformed_hash_returns_false() {
        let service = test_password_service();
        assert!(!service.verify_password("Passw0rd!", ""));
        assert!(!service.verify_password("Passw0rd!", "not-a-hash"));
        assert!(!service.verify_password("Passw0rd!", "$argon2id$v=19$broken"));
    }

    #[test]
    fn test_hash_from_other_params_still_verifies() {
        let strong = PasswordService::new(HashingConfig {
            memory_kib: 2048,
            iterations: 2,
            parallelism: 1,
        })
        .unwrap();
        let hash = strong.hash_password("Passw0rd!").unwrap();

        assert!(test_password_service().verify_password("Passw0rd!", &hash));
    }

    #[test]
    fn test_dummy_hash_uses_configured_params() {
        let service = test_password_service();
        assert!(service.dummy_hash.starts_with("$argon2id$v=19$m=1024,t=1,p=1$"));
        assert!(!service.verify_without_account("Passw0rd!"));
        assert!(!service.verify_without_account(DUMMY_PASSWORD));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let result = PasswordService::new(HashingConfig {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        });
        assert!(matches!(result, Err(AuthError::PasswordHash(_))));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_hash_round_trip(password in "\\PC{1,40}") {
            let service = test_password_service();
            let hash = service.hash_password(&password).unwrap();
            prop_assert!(service.verify_password(&password, &hash));
        }

        #[test]
        fn prop_different_password_rejected(password in "[a-zA-Z0-9]{8,20}") {
            let service = test_password_service();
            let hash = service.hash_password(&password).unwrap();
            let other = format!("{}x", password);
            prop_assert!(!service.verify_password(&other, &hash));
        }
    }
}
