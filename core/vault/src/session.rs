//! Vault session management.
//!
//! A session is the explicit authenticated context every core call runs
//! under. It holds the verified master password, never a derived key: each
//! operation derives its key, uses it, and lets it zeroize on return. The
//! password is wiped when the session is locked or dropped.

use std::sync::Arc;
use tracing::{debug, info};

use crate::config::VaultConfig;
use crate::layout::VaultLayout;
use hideaway_common::{Error, Result, SensitiveBytes};
use hideaway_crypto::{EncryptionKey, LoginHashParams};
use hideaway_storage::VaultFs;

/// State of the vault session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Session is active and the password is available.
    Active,
    /// Session is locked, the password has been wiped.
    Locked,
}

/// Authenticated vault session.
pub struct VaultSession {
    /// Vault configuration read at unlock time.
    config: VaultConfig,
    /// Verified master password (zeroized on drop).
    password: Option<SensitiveBytes>,
    /// Filesystem backend.
    fs: Arc<dyn VaultFs>,
    /// Vault locations.
    layout: VaultLayout,
    /// Session state.
    state: SessionState,
}

impl VaultSession {
    /// Create a new session by verifying `password` against `config`.
    ///
    /// # Postconditions
    /// - Returns an active session owning the password
    ///
    /// # Errors
    /// - `InvalidPassword` if the login hash does not match
    /// - `InvalidSalt` if the stored salt is too short
    pub fn unlock(
        config: VaultConfig,
        password: SensitiveBytes,
        params: &LoginHashParams,
        fs: Arc<dyn VaultFs>,
        layout: VaultLayout,
    ) -> Result<Self> {
        if !config.verify_login(password.as_bytes(), params)? {
            return Err(Error::InvalidPassword);
        }

        info!(root = %layout.root().display(), "Vault session unlocked");

        Ok(Self {
            config,
            password: Some(password),
            fs,
            layout,
            state: SessionState::Active,
        })
    }

    /// Get the vault configuration.
    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Get the filesystem backend.
    pub fn fs(&self) -> &dyn VaultFs {
        self.fs.as_ref()
    }

    /// Get the vault layout.
    pub fn layout(&self) -> &VaultLayout {
        &self.layout
    }

    /// Get the current session state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Check if session is active.
    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Derive the working encryption key from the session password.
    ///
    /// # Errors
    /// - `SessionLocked` if the session has been locked
    pub fn derive_key(&self) -> Result<EncryptionKey> {
        match (&self.state, &self.password) {
            (SessionState::Active, Some(password)) => {
                debug!("Deriving working key");
                self.config.derive_key(password.as_bytes())
            }
            _ => Err(Error::SessionLocked),
        }
    }

    /// Lock the session, wiping the password from memory.
    pub fn lock(&mut self) {
        if let Some(mut password) = self.password.take() {
            password.wipe();
        }
        if self.state == SessionState::Active {
            debug!("Vault session locked");
        }
        self.state = SessionState::Locked;
    }
}

impl Drop for VaultSession {
    fn drop(&mut self) {
        self.lock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hideaway_crypto::{derive_login_hash, LoginHash, Salt};
    use hideaway_storage::MemoryFs;

    fn config(password: &[u8]) -> VaultConfig {
        let salt = Salt::from_bytes(vec![3u8; 32]);
        let hash: LoginHash =
            derive_login_hash(password, &salt, &LoginHashParams::testing()).unwrap();
        VaultConfig::new(salt, hash)
    }

    fn unlock(password: &[u8]) -> Result<VaultSession> {
        VaultSession::unlock(
            config(b"test-password"),
            SensitiveBytes::from(password),
            &LoginHashParams::testing(),
            Arc::new(MemoryFs::new()),
            VaultLayout::at("/vault", "/desktop"),
        )
    }

    #[test]
    fn test_session_creation() {
        let session = unlock(b"test-password").unwrap();
        assert!(session.is_active());
        assert!(session.derive_key().is_ok());
    }

    #[test]
    fn test_wrong_password_fails() {
        assert!(matches!(unlock(b"wrong"), Err(Error::InvalidPassword)));
    }

    #[test]
    fn test_session_lock() {
        let mut session = unlock(b"test-password").unwrap();
        session.lock();

        assert!(!session.is_active());
        assert_eq!(session.state(), SessionState::Locked);
        assert!(matches!(session.derive_key(), Err(Error::SessionLocked)));
    }

    #[test]
    fn test_key_matches_config_derivation() {
        let session = unlock(b"test-password").unwrap();
        let expected = config(b"test-password").derive_key(b"test-password").unwrap();

        assert_eq!(session.derive_key().unwrap().as_bytes(), expected.as_bytes());
    }
}
