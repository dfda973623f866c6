//! Common error types for Hideaway.

use thiserror::Error;

/// Top-level error type for vault operations.
///
/// Each variant names one failure kind so that a front end can print an
/// actionable message. `AuthenticationFailed` deliberately covers both a
/// wrong password and tampered ciphertext: AEAD verification cannot tell
/// the two apart.
#[derive(Debug, Error)]
pub enum Error {
    /// Salt is shorter than the minimum length.
    #[error("Invalid salt: must be at least 16 bytes")]
    InvalidSalt,

    /// No vault configuration exists yet.
    #[error("Vault is not initialized")]
    NotInitialized,

    /// A vault configuration already exists.
    #[error("Vault is already initialized")]
    AlreadyInitialized,

    /// The vault configuration could not be parsed.
    #[error("Corrupt vault configuration: {0}")]
    CorruptConfig(String),

    /// AEAD tag verification failed (wrong key or tampered data).
    #[error("Authentication failed: wrong password or corrupted data")]
    AuthenticationFailed,

    /// Ciphertext is shorter than the nonce.
    #[error("Ciphertext is truncated")]
    TruncatedInput,

    /// The decrypted manifest is not a valid ledger.
    #[error("Corrupt manifest: {0}")]
    CorruptManifest(String),

    /// No manifest record carries the requested id.
    #[error("Record not found: {0}")]
    RecordNotFound(String),

    /// The encrypted payload for a record is missing from disk.
    #[error("Payload missing: {0}")]
    PayloadMissing(String),

    /// The file was stored but its source could not be deleted.
    #[error("File stored as {id}, but the original could not be deleted: {reason}")]
    OriginalNotDeleted { id: String, reason: String },

    /// Master password did not match the stored login hash.
    #[error("Invalid password")]
    InvalidPassword,

    /// The session was locked and its secrets wiped.
    #[error("Session is locked")]
    SessionLocked,

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A cryptographic primitive failed for a reason other than authentication.
    #[error("Cryptographic error: {0}")]
    Crypto(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error means "the vault rejected the key material".
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Error::AuthenticationFailed | Error::InvalidPassword)
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_failure_classification() {
        assert!(Error::AuthenticationFailed.is_auth_failure());
        assert!(Error::InvalidPassword.is_auth_failure());
        assert!(!Error::NotInitialized.is_auth_failure());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
