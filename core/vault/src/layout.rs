//! On-disk layout of a vault.

use std::path::{Path, PathBuf};

use hideaway_common::{Error, Result};

/// Configuration file name in vault root.
pub const CONFIG_FILENAME: &str = "config.json";

/// Encrypted manifest file name in vault root.
pub const MANIFEST_FILENAME: &str = "db.enc";

/// Payload directory name in vault root.
pub const PAYLOAD_DIRNAME: &str = "dump";

/// Extension of every encrypted payload file.
pub const PAYLOAD_EXTENSION: &str = "enc";

/// Directory under the user config dir that holds the default vault.
pub const APP_DIRNAME: &str = ".hideaway";

/// Resolved locations for one vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultLayout {
    root: PathBuf,
    payload_dir: PathBuf,
    fallback_dir: PathBuf,
}

impl VaultLayout {
    /// Layout rooted at `root`, restoring to `fallback_dir` when a file's
    /// original directory is gone.
    pub fn at(root: impl Into<PathBuf>, fallback_dir: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            payload_dir: root.join(PAYLOAD_DIRNAME),
            root,
            fallback_dir: fallback_dir.into(),
        }
    }

    /// Default per-user layout.
    ///
    /// The vault lives in `<config dir>/.hideaway`; restored files fall back
    /// to the desktop, or `~/Desktop` on platforms without one.
    ///
    /// # Errors
    /// - `InvalidInput` if neither a config dir nor a home dir is known
    pub fn resolve() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::InvalidInput("Cannot determine config directory".to_string()))?;

        let fallback_dir = match dirs::desktop_dir() {
            Some(desktop) => desktop,
            None => dirs::home_dir()
                .map(|home| home.join("Desktop"))
                .ok_or_else(|| Error::InvalidInput("Cannot determine home directory".to_string()))?,
        };

        Ok(Self::at(config_dir.join(APP_DIRNAME), fallback_dir))
    }

    /// Vault root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding `<id>.enc` payloads.
    pub fn payload_dir(&self) -> &Path {
        &self.payload_dir
    }

    /// Where files are restored when their original directory is gone.
    pub fn fallback_dir(&self) -> &Path {
        &self.fallback_dir
    }

    /// Path of `config.json`.
    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILENAME)
    }

    /// Path of the encrypted manifest.
    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILENAME)
    }

    /// Path of the payload for record `id`.
    pub fn payload_path(&self, id: &str) -> PathBuf {
        self.payload_dir
            .join(format!("{}.{}", id, PAYLOAD_EXTENSION))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let layout = VaultLayout::at("/v", "/desk");

        assert_eq!(layout.config_path(), PathBuf::from("/v/config.json"));
        assert_eq!(layout.manifest_path(), PathBuf::from("/v/db.enc"));
        assert_eq!(layout.payload_dir(), Path::new("/v/dump"));
        assert_eq!(layout.payload_path("abc"), PathBuf::from("/v/dump/abc.enc"));
        assert_eq!(layout.fallback_dir(), Path::new("/desk"));
    }
}
