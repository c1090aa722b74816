//! Password policy and salted key derivation.
//!
//! Hashes are raw Argon2id output over the UTF-8 password with a random
//! per-account salt. Comparison is constant-time.

use crate::config::SecurityConfig;
use crate::error::PasswordError;
use crate::types::{HASH_LEN, SALT_LEN};
use crate::{Error, Result};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::{rngs::OsRng, RngCore};

/// Minimum password length
pub const MIN_PASSWORD_LEN: usize = 8;

/// The accepted special characters
pub const PASSWORD_SYMBOLS: &str = "!@#?";

/// Check a candidate password against the strength policy.
///
/// Rules are checked in a fixed order and the first violation is reported.
pub fn check_strength(password: &str) -> std::result::Result<(), PasswordError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PasswordError::TooShort {
            min: MIN_PASSWORD_LEN,
        });
    }
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    if !has_upper || !has_lower {
        return Err(PasswordError::MissingCase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(PasswordError::MissingDigit);
    }
    if !password.chars().any(|c| PASSWORD_SYMBOLS.contains(c)) {
        return Err(PasswordError::MissingSymbol {
            symbols: PASSWORD_SYMBOLS,
        });
    }
    Ok(())
}

/// Generate a fresh random salt from the OS RNG
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Derives and verifies credential hashes with fixed Argon2id costs
#[derive(Clone, Debug)]
pub struct CredentialHasher {
    params: Params,
}

impl CredentialHasher {
    /// Build a hasher from configured cost parameters
    pub fn new(security: &SecurityConfig) -> Result<Self> {
        let params = Params::new(
            security.memory_kib,
            security.iterations,
            security.parallelism,
            Some(HASH_LEN),
        )
        .map_err(|e| Error::Config(format!("Invalid Argon2 params: {e}")))?;
        Ok(Self { params })
    }

    /// Derive the hash of `password` under `salt`
    pub fn derive(&self, password: &str, salt: &[u8; SALT_LEN]) -> Result<[u8; HASH_LEN]> {
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());
        let mut out = [0u8; HASH_LEN];
        argon2
            .hash_password_into(password.as_bytes(), salt, &mut out)
            .map_err(|e| Error::KeyDerivation(e.to_string()))?;
        Ok(out)
    }

    /// Recompute and compare against a stored hash
    pub fn verify(
        &self,
        password: &str,
        salt: &[u8; SALT_LEN],
        expected: &[u8; HASH_LEN],
    ) -> Result<bool> {
        let actual = self.derive(password, salt)?;
        Ok(constant_time_eq(&actual, expected))
    }
}

// Constant-time compare; length is public.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
pub(crate) fn test_hasher() -> CredentialHasher {
    CredentialHasher::new(&SecurityConfig {
        memory_kib: 64,
        iterations: 1,
        parallelism: 1,
    })
    .unwrap()
}
