use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::error::ApiError;

/// Argon2id work factor, OWASP's recommended minimum for interactive logins.
/// Raise `M_COST_KIB` first when hardware allows; the values travel inside
/// each PHC hash string, so old hashes keep verifying after a bump.
const M_COST_KIB: u32 = 19 * 1024;
const T_COST: u32 = 2;
const P_COST: u32 = 1;

fn crypto<E: std::fmt::Display>(e: E) -> ApiError {
    error!(error = %e, "argon2 failure");
    ApiError::Crypto(e.to_string())
}

/// Hash a plaintext password with a fresh random salt. Deliberately slow;
/// call it through `spawn_blocking` on request paths.
pub fn hash_password(plain: &str) -> Result<String, ApiError> {
    let params = Params::new(M_COST_KIB, T_COST, P_COST, None).map_err(crypto)?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(crypto)?
        .to_string();
    Ok(hash)
}

/// Check a plaintext password against a stored PHC hash string. A mismatch
/// is `Ok(false)`; only a hash we cannot even parse or process is an error.
pub fn verify_password(plain: &str, hash: &str) -> Result<bool, ApiError> {
    let parsed = PasswordHash::new(hash).map_err(crypto)?;
    // Verification params come from the hash string itself.
    match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(crypto(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let password = "Secur3P@ssw0rd!";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(verify_password(password, &hash).expect("verify should succeed"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let password = "correct-horse-battery-staple";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(!verify_password("wrong-password", &hash).expect("verify should not error"));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = verify_password("anything", "not-a-valid-hash").unwrap_err();
        assert!(matches!(err, ApiError::Crypto(_)));
    }

    #[test]
    fn same_password_hashes_differently() {
        let password = "repeat-after-me";
        let first = hash_password(password).unwrap();
        let second = hash_password(password).unwrap();
        assert_ne!(first, second);
        assert!(verify_password(password, &first).unwrap());
        assert!(verify_password(password, &second).unwrap());
    }

    #[test]
    fn hash_records_algorithm_and_params() {
        let hash = hash_password("whatever-this-is").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("m=19456,t=2,p=1"));
    }
}
