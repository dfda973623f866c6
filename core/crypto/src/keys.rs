//! Key types with secure memory handling.
//!
//! All key types automatically zeroize their memory on drop to prevent
//! sensitive data from persisting in memory.

use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use hideaway_common::{Error, Result};

/// Length of encryption keys in bytes (256-bit).
pub const KEY_LENGTH: usize = 32;

/// Shortest salt accepted by either derivation.
pub const MIN_SALT_LENGTH: usize = 16;

/// Salt length used when a vault is initialized.
pub const DEFAULT_SALT_LENGTH: usize = 32;

/// Symmetric key derived from the master password.
///
/// Used for both payload and manifest encryption.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey {
    key: [u8; KEY_LENGTH],
}

impl EncryptionKey {
    /// Create an encryption key from raw bytes.
    pub fn from_bytes(key: [u8; KEY_LENGTH]) -> Self {
        Self { key }
    }

    /// Get the key bytes.
    ///
    /// # Security
    /// The returned slice should be used immediately and not stored.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncryptionKey([REDACTED])")
    }
}

/// Argon2id output stored in the vault config for login verification.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct LoginHash(Vec<u8>);

impl LoginHash {
    /// Wrap stored hash bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Get the hash bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Constant-time comparison against another hash.
    ///
    /// Hashes of different lengths never match.
    pub fn matches(&self, other: &[u8]) -> bool {
        self.0.len() == other.len() && bool::from(self.0.as_slice().ct_eq(other))
    }
}

impl fmt::Debug for LoginHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LoginHash([REDACTED; {} bytes])", self.0.len())
    }
}

/// Salt for key derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Salt(Vec<u8>);

impl Salt {
    /// Generate a random salt of `len` bytes from the OS RNG.
    ///
    /// # Errors
    /// - `InvalidSalt` if `len` is below MIN_SALT_LENGTH
    pub fn generate(len: usize) -> Result<Self> {
        if len < MIN_SALT_LENGTH {
            return Err(Error::InvalidSalt);
        }
        let mut salt = vec![0u8; len];
        OsRng
            .try_fill_bytes(&mut salt)
            .map_err(|e| Error::Crypto(format!("Salt generation failed: {}", e)))?;
        Ok(Self(salt))
    }

    /// Create from bytes.
    ///
    /// Length is not checked here; every derivation checks it before use.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Get the salt bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Fail with `InvalidSalt` if this salt is too short to derive from.
    pub fn ensure_valid(&self) -> Result<()> {
        if self.0.len() < MIN_SALT_LENGTH {
            return Err(Error::InvalidSalt);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_salt_generate() {
        let salt1 = Salt::generate(DEFAULT_SALT_LENGTH).unwrap();
        let salt2 = Salt::generate(DEFAULT_SALT_LENGTH).unwrap();

        assert_eq!(salt1.as_bytes().len(), DEFAULT_SALT_LENGTH);
        // Random salts should be different
        assert_ne!(salt1.as_bytes(), salt2.as_bytes());
    }

    #[test]
    fn test_salt_generate_too_short() {
        assert!(matches!(Salt::generate(8), Err(Error::InvalidSalt)));
    }

    #[test]
    fn test_salt_ensure_valid() {
        assert!(Salt::from_bytes(vec![0u8; 16]).ensure_valid().is_ok());
        assert!(matches!(
            Salt::from_bytes(vec![0u8; 15]).ensure_valid(),
            Err(Error::InvalidSalt)
        ));
    }

    #[test]
    fn test_login_hash_matches() {
        let hash = LoginHash::from_bytes(vec![7u8; 32]);
        assert!(hash.matches(&[7u8; 32]));
        assert!(!hash.matches(&[8u8; 32]));
        assert!(!hash.matches(&[7u8; 31]));
    }

    #[test]
    fn test_key_debug_redacted() {
        let key = EncryptionKey::from_bytes([9u8; KEY_LENGTH]);
        assert_eq!(format!("{:?}", key), "EncryptionKey([REDACTED])");
    }
}
