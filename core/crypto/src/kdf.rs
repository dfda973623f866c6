//! Key derivation from the master password.
//!
//! Two separate derivations are made from the same password and salt:
//! - PBKDF2-HMAC-SHA256 produces the symmetric key used for every payload
//!   and for the manifest.
//! - Argon2id produces the login hash stored in the vault config.
//!
//! The two algorithms have different cost profiles so that recovering one
//! output does not make brute-forcing the other any cheaper.

use argon2::{Algorithm, Argon2, Params, Version};
use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::keys::{EncryptionKey, LoginHash, Salt, KEY_LENGTH};
use hideaway_common::{Error, Result};

/// PBKDF2 iteration count for the encryption key.
pub const PBKDF2_ITERATIONS: u32 = 10_000;

/// Length of the Argon2id login hash in bytes.
pub const LOGIN_HASH_LENGTH: usize = 32;

/// Parameters for the Argon2id login hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginHashParams {
    /// Memory cost in KiB (e.g., 65536 = 64 MiB).
    pub memory_cost: u32,
    /// Number of iterations.
    pub time_cost: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
}

impl LoginHashParams {
    /// Parameters every vault on disk is created with.
    ///
    /// Changing these invalidates existing login hashes.
    pub fn standard() -> Self {
        Self {
            memory_cost: 65536, // 64 MiB
            time_cost: 1,
            parallelism: 4,
        }
    }

    /// Minimal cost, for tests only.
    pub fn testing() -> Self {
        Self {
            memory_cost: 256,
            time_cost: 1,
            parallelism: 1,
        }
    }
}

impl Default for LoginHashParams {
    fn default() -> Self {
        Self::standard()
    }
}

/// Derive the symmetric encryption key from a password and salt.
///
/// # Preconditions
/// - `salt` must be at least MIN_SALT_LENGTH bytes
///
/// # Postconditions
/// - Returns a 32-byte key that zeroizes on drop
/// - The key is deterministic given the same inputs
///
/// # Errors
/// - `InvalidSalt` if the salt is too short
pub fn derive_encryption_key(password: &[u8], salt: &Salt) -> Result<EncryptionKey> {
    salt.ensure_valid()?;

    let mut key_bytes = Zeroizing::new([0u8; KEY_LENGTH]);
    pbkdf2_hmac::<Sha256>(password, salt.as_bytes(), PBKDF2_ITERATIONS, &mut *key_bytes);

    Ok(EncryptionKey::from_bytes(*key_bytes))
}

/// Derive the Argon2id login hash from a password and salt.
///
/// # Preconditions
/// - `salt` must be at least MIN_SALT_LENGTH bytes
/// - `params` must be valid Argon2id parameters
///
/// # Postconditions
/// - Returns a LOGIN_HASH_LENGTH-byte hash
/// - The hash is deterministic given the same inputs
///
/// # Errors
/// - `InvalidSalt` if the salt is too short
/// - `InvalidInput` if the Argon2id parameters are rejected
pub fn derive_login_hash(
    password: &[u8],
    salt: &Salt,
    params: &LoginHashParams,
) -> Result<LoginHash> {
    salt.ensure_valid()?;

    let argon2_params = Params::new(
        params.memory_cost,
        params.time_cost,
        params.parallelism,
        Some(LOGIN_HASH_LENGTH),
    )
    .map_err(|e| Error::InvalidInput(format!("Invalid login hash parameters: {}", e)))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut hash = vec![0u8; LOGIN_HASH_LENGTH];
    argon2
        .hash_password_into(password, salt.as_bytes(), &mut hash)
        .map_err(|e| Error::Crypto(format!("Login hash derivation failed: {}", e)))?;

    Ok(LoginHash::from_bytes(hash))
}

/// Check a password against a stored login hash.
///
/// Comparison is constant-time.
pub fn verify_login_hash(
    password: &[u8],
    salt: &Salt,
    params: &LoginHashParams,
    expected: &LoginHash,
) -> Result<bool> {
    let derived = derive_login_hash(password, salt, params)?;
    Ok(expected.matches(derived.as_bytes()))
}
