//! Vault configuration: the stored salt and login hash.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, info};

use crate::layout::VaultLayout;
use hideaway_common::{Error, Result};
use hideaway_crypto::{
    derive_encryption_key, derive_login_hash, verify_login_hash, EncryptionKey, LoginHash,
    LoginHashParams, Salt, DEFAULT_SALT_LENGTH, MIN_SALT_LENGTH,
};
use hideaway_storage::VaultFs;

/// Byte fields are stored as padded standard base64 strings.
mod base64_bytes {
    use super::*;

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

/// Serialized form of `config.json`.
#[derive(Serialize, Deserialize)]
struct ConfigFile {
    #[serde(with = "base64_bytes")]
    hashed_password: Vec<u8>,
    #[serde(with = "base64_bytes")]
    salt: Vec<u8>,
}

/// Vault configuration.
///
/// Created once at initialization and never updated; only a full reset
/// removes it. Read at the start of every session to re-derive keys.
#[derive(Debug, Clone)]
pub struct VaultConfig {
    salt: Salt,
    password_hash: LoginHash,
}

impl VaultConfig {
    /// Build a configuration from its parts.
    pub fn new(salt: Salt, password_hash: LoginHash) -> Self {
        Self {
            salt,
            password_hash,
        }
    }

    /// Salt shared by the login hash and the encryption key.
    pub fn salt(&self) -> &Salt {
        &self.salt
    }

    /// Stored Argon2id login hash.
    pub fn password_hash(&self) -> &LoginHash {
        &self.password_hash
    }

    /// Whether `config.json` exists under `layout`.
    pub fn exists(fs: &dyn VaultFs, layout: &VaultLayout) -> Result<bool> {
        fs.exists(&layout.config_path())
    }

    /// Read and parse the on-disk configuration.
    ///
    /// # Errors
    /// - `NotInitialized` if `config.json` is absent
    /// - `CorruptConfig` if it cannot be parsed or its salt is too short
    /// - `Io` on other read failures
    pub fn load(fs: &dyn VaultFs, layout: &VaultLayout) -> Result<Self> {
        let path = layout.config_path();
        if !fs.exists(&path)? {
            return Err(Error::NotInitialized);
        }

        let bytes = fs.read_file_bytes(&path)?;
        let config = Self::from_bytes(&bytes)?;
        debug!(path = %path.display(), "Vault config loaded");
        Ok(config)
    }

    /// Write a new configuration.
    ///
    /// # Preconditions
    /// - No configuration exists yet
    ///
    /// # Postconditions
    /// - Vault root and payload directories exist
    /// - `config.json` holds `salt` and `password_hash`
    ///
    /// # Errors
    /// - `AlreadyInitialized` if `config.json` already exists
    /// - `InvalidSalt` if the salt is too short
    pub fn create(
        fs: &dyn VaultFs,
        layout: &VaultLayout,
        salt: Salt,
        password_hash: LoginHash,
    ) -> Result<Self> {
        if Self::exists(fs, layout)? {
            return Err(Error::AlreadyInitialized);
        }
        salt.ensure_valid()?;

        fs.ensure_dir(layout.root())?;
        fs.ensure_dir(layout.payload_dir())?;

        let config = Self::new(salt, password_hash);
        fs.write_file_bytes(&layout.config_path(), &config.to_bytes()?)?;

        info!(root = %layout.root().display(), "Vault initialized");
        Ok(config)
    }

    /// Generate a fresh salt, hash `password`, and write the configuration.
    pub fn initialize(
        fs: &dyn VaultFs,
        layout: &VaultLayout,
        password: &[u8],
        params: &LoginHashParams,
    ) -> Result<Self> {
        if Self::exists(fs, layout)? {
            return Err(Error::AlreadyInitialized);
        }
        let salt = Salt::generate(DEFAULT_SALT_LENGTH)?;
        let hash = derive_login_hash(password, &salt, params)?;
        Self::create(fs, layout, salt, hash)
    }

    /// Verify a password against the stored login hash.
    ///
    /// # Returns
    /// - `Ok(true)` if password is correct
    /// - `Ok(false)` if password is incorrect
    pub fn verify_login(&self, password: &[u8], params: &LoginHashParams) -> Result<bool> {
        verify_login_hash(password, &self.salt, params, &self.password_hash)
    }

    /// Derive the working encryption key for `password`.
    pub fn derive_key(&self, password: &[u8]) -> Result<EncryptionKey> {
        derive_encryption_key(password, &self.salt)
    }

    /// Serialize to bytes for storage.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let file = ConfigFile {
            hashed_password: self.password_hash.as_bytes().to_vec(),
            salt: self.salt.as_bytes().to_vec(),
        };
        serde_json::to_vec(&file).map_err(|e| Error::CorruptConfig(e.to_string()))
    }

    /// Deserialize from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let file: ConfigFile =
            serde_json::from_slice(bytes).map_err(|e| Error::CorruptConfig(e.to_string()))?;

        if file.salt.len() < MIN_SALT_LENGTH {
            return Err(Error::CorruptConfig(format!(
                "salt is {} bytes, need at least {}",
                file.salt.len(),
                MIN_SALT_LENGTH
            )));
        }

        Ok(Self::new(
            Salt::from_bytes(file.salt),
            LoginHash::from_bytes(file.hashed_password),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hideaway_storage::MemoryFs;
    use std::path::Path;

    fn layout() -> VaultLayout {
        VaultLayout::at("/vault", "/desktop")
    }

    #[test]
    fn test_load_missing_is_not_initialized() {
        let fs = MemoryFs::new();
        assert!(matches!(
            VaultConfig::load(&fs, &layout()),
            Err(Error::NotInitialized)
        ));
    }

    #[test]
    fn test_create_and_load() {
        let fs = MemoryFs::new();
        let salt = Salt::from_bytes(vec![0u8; 32]);
        let hash = LoginHash::from_bytes(vec![5u8; 32]);

        VaultConfig::create(&fs, &layout(), salt.clone(), hash).unwrap();
        let loaded = VaultConfig::load(&fs, &layout()).unwrap();

        assert_eq!(loaded.salt(), &salt);
        assert_eq!(loaded.password_hash().as_bytes(), &[5u8; 32]);
        assert!(fs.stat_file(Path::new("/vault/dump")).unwrap().is_dir);
    }

    #[test]
    fn test_create_twice_fails() {
        let fs = MemoryFs::new();
        let salt = Salt::from_bytes(vec![0u8; 32]);
        let hash = LoginHash::from_bytes(vec![5u8; 32]);

        VaultConfig::create(&fs, &layout(), salt.clone(), hash.clone()).unwrap();
        assert!(matches!(
            VaultConfig::create(&fs, &layout(), salt, hash),
            Err(Error::AlreadyInitialized)
        ));
    }

    #[test]
    fn test_create_short_salt_fails() {
        let fs = MemoryFs::new();
        let result = VaultConfig::create(
            &fs,
            &layout(),
            Salt::from_bytes(vec![0u8; 8]),
            LoginHash::from_bytes(vec![5u8; 32]),
        );
        assert!(matches!(result, Err(Error::InvalidSalt)));
        assert!(!VaultConfig::exists(&fs, &layout()).unwrap());
    }

    #[test]
    fn test_corrupt_config() {
        let fs = MemoryFs::new();
        fs.ensure_dir(Path::new("/vault")).unwrap();
        fs.write_file_bytes(Path::new("/vault/config.json"), b"{not json")
            .unwrap();

        assert!(matches!(
            VaultConfig::load(&fs, &layout()),
            Err(Error::CorruptConfig(_))
        ));
    }

    #[test]
    fn test_config_json_format() {
        let config = VaultConfig::new(
            Salt::from_bytes(vec![0u8; 16]),
            LoginHash::from_bytes(vec![0xFFu8; 3]),
        );
        let json: serde_json::Value = serde_json::from_slice(&config.to_bytes().unwrap()).unwrap();

        assert_eq!(json["hashed_password"], "////");
        assert_eq!(json["salt"], "AAAAAAAAAAAAAAAAAAAAAA==");
    }

    #[test]
    fn test_initialize_and_verify() {
        let fs = MemoryFs::new();
        let params = LoginHashParams::testing();

        let config = VaultConfig::initialize(&fs, &layout(), b"correct horse", &params).unwrap();
        assert_eq!(config.salt().as_bytes().len(), DEFAULT_SALT_LENGTH);

        let loaded = VaultConfig::load(&fs, &layout()).unwrap();
        assert!(loaded.verify_login(b"correct horse", &params).unwrap());
        assert!(!loaded.verify_login(b"battery staple", &params).unwrap());
    }
}
