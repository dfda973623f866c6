//! Vault manager for initializing, opening and resetting a vault.

use std::sync::Arc;
use tracing::{info, warn};

use crate::config::VaultConfig;
use crate::layout::VaultLayout;
use crate::session::VaultSession;
use hideaway_common::{Result, SensitiveBytes};
use hideaway_crypto::LoginHashParams;
use hideaway_storage::VaultFs;

/// Vault manager for one vault location.
pub struct VaultManager {
    fs: Arc<dyn VaultFs>,
    layout: VaultLayout,
    params: LoginHashParams,
}

impl VaultManager {
    /// Create a manager with the standard login hash parameters.
    pub fn new(fs: Arc<dyn VaultFs>, layout: VaultLayout) -> Self {
        Self::with_params(fs, layout, LoginHashParams::standard())
    }

    /// Create with custom login hash parameters.
    pub fn with_params(fs: Arc<dyn VaultFs>, layout: VaultLayout, params: LoginHashParams) -> Self {
        Self { fs, layout, params }
    }

    /// Get the vault layout.
    pub fn layout(&self) -> &VaultLayout {
        &self.layout
    }

    /// Check if a vault has been initialized at this location.
    pub fn is_initialized(&self) -> Result<bool> {
        VaultConfig::exists(self.fs.as_ref(), &self.layout)
    }

    /// Initialize a new vault protected by `password`.
    ///
    /// # Postconditions
    /// - Vault root and payload directories exist
    /// - `config.json` holds a fresh salt and the password's login hash
    ///
    /// # Errors
    /// - `AlreadyInitialized` if the vault already exists
    pub fn initialize(&self, password: &SensitiveBytes) -> Result<VaultConfig> {
        VaultConfig::initialize(
            self.fs.as_ref(),
            &self.layout,
            password.as_bytes(),
            &self.params,
        )
    }

    /// Open an existing vault.
    ///
    /// # Errors
    /// - `NotInitialized` if there is no vault configuration
    /// - `CorruptConfig` if the configuration is unreadable
    /// - `InvalidPassword` if the password does not match
    pub fn open(&self, password: SensitiveBytes) -> Result<VaultSession> {
        let config = VaultConfig::load(self.fs.as_ref(), &self.layout)?;
        VaultSession::unlock(
            config,
            password,
            &self.params,
            self.fs.clone(),
            self.layout.clone(),
        )
    }

    /// Delete the configuration, manifest and every payload.
    ///
    /// Missing pieces are ignored. This is irreversible.
    pub fn reset(&self) -> Result<()> {
        let fs = self.fs.as_ref();

        for path in [self.layout.config_path(), self.layout.manifest_path()] {
            if fs.exists(&path)? {
                fs.delete_file(&path)?;
            } else {
                warn!(path = %path.display(), "Nothing to remove during reset");
            }
        }
        fs.remove_dir_all(self.layout.payload_dir())?;

        info!(root = %self.layout.root().display(), "Vault reset");
        Ok(())
    }
}
