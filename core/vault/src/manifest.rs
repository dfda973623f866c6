//! Encrypted manifest: the ledger of every file held in the vault.
//!
//! The whole ledger is one JSON document encrypted as a single AEAD blob
//! (`db.enc`). Every mutation decrypts it, changes the in-memory copy, and
//! writes the re-encrypted result back through an atomic replace. Nothing
//! is cached between calls.
//!
//! # Concurrency
//! At most one process may manipulate a vault at a time. Two concurrent
//! read-modify-write cycles can lose an update; there is no lock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::layout::VaultLayout;
use hideaway_common::{Error, Result};
use hideaway_crypto::{decrypt, encrypt, EncryptionKey};
use hideaway_storage::VaultFs;

/// One file held in the vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Random UUID; also names the payload file.
    pub id: String,
    /// Name the file is restored under.
    pub original_name: String,
    /// Absolute source path at add time.
    pub original_path: String,
    pub date_added: DateTime<Utc>,
    pub mime_type: String,
    /// Extension including the leading dot, or empty.
    pub extension: String,
    /// Plaintext size in bytes.
    #[serde(rename = "file_size", default)]
    pub size: i64,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<FileRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<FileRecord>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Plaintext form of the manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Records in insertion order.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub files: Vec<FileRecord>,
}

impl Manifest {
    /// Serialize to JSON in a buffer that zeroizes on drop.
    pub fn to_json(&self) -> Result<Zeroizing<Vec<u8>>> {
        serde_json::to_vec_pretty(self)
            .map(Zeroizing::new)
            .map_err(|e| Error::CorruptManifest(e.to_string()))
    }

    /// Parse decrypted JSON.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| Error::CorruptManifest(e.to_string()))
    }
}

/// Reads and rewrites the encrypted manifest.
pub struct ManifestStore<'a> {
    fs: &'a dyn VaultFs,
    path: PathBuf,
}

impl<'a> ManifestStore<'a> {
    /// Store for the manifest of `layout`.
    pub fn new(fs: &'a dyn VaultFs, layout: &VaultLayout) -> Self {
        Self {
            fs,
            path: layout.manifest_path(),
        }
    }

    /// Whether a manifest blob has been written yet.
    pub fn exists(&self) -> Result<bool> {
        self.fs.exists(&self.path)
    }

    /// Decrypt and parse the current manifest.
    ///
    /// An absent blob is the first-write case and yields an empty manifest.
    fn load(&self, key: &EncryptionKey) -> Result<Manifest> {
        if !self.exists()? {
            debug!("No manifest yet, starting empty");
            return Ok(Manifest::default());
        }

        let blob = self.fs.read_file_bytes(&self.path)?;
        let plaintext = decrypt(key, &blob)?;
        Manifest::from_json(&plaintext)
    }

    /// Encrypt and atomically replace the manifest blob.
    fn save(&self, manifest: &Manifest, key: &EncryptionKey) -> Result<()> {
        let plaintext = manifest.to_json()?;
        let blob = encrypt(key, &plaintext)?;
        self.fs.write_file_bytes(&self.path, &blob)?;
        debug!(records = manifest.files.len(), "Manifest written");
        Ok(())
    }

    /// Append `record` to the end of the manifest.
    ///
    /// # Postconditions
    /// - Every previous record is unchanged and precedes `record`
    ///
    /// # Errors
    /// - `AuthenticationFailed` if the existing blob does not verify under `key`
    /// - `TruncatedInput` if the existing blob is shorter than a nonce
    /// - `CorruptManifest` if it decrypts to malformed JSON
    ///
    /// On any error the manifest on disk is left untouched.
    pub fn append(&self, record: FileRecord, key: &EncryptionKey) -> Result<()> {
        let mut manifest = self.load(key)?;

        if manifest.files.iter().any(|r| r.id == record.id) {
            warn!(id = %record.id, "Appending record with duplicate id");
        }

        let id = record.id.clone();
        manifest.files.push(record);
        self.save(&manifest, key)?;

        info!(id = %id, records = manifest.files.len(), "Record appended");
        Ok(())
    }

    /// All records in insertion order.
    ///
    /// Returns an empty list when no manifest exists. Callers that need to
    /// tell "empty vault" from "no vault" check the config first.
    pub fn list(&self, key: &EncryptionKey) -> Result<Vec<FileRecord>> {
        Ok(self.load(key)?.files)
    }

    /// First record whose id equals `id`.
    ///
    /// # Errors
    /// - `RecordNotFound` if no record matches
    pub fn find_by_id(&self, id: &str, key: &EncryptionKey) -> Result<FileRecord> {
        self.list(key)?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| Error::RecordNotFound(id.to_string()))
    }

    /// Remove the first record whose id equals `id` and return it.
    ///
    /// # Errors
    /// - `RecordNotFound` if no record matches; the manifest is not rewritten
    pub fn remove(&self, id: &str, key: &EncryptionKey) -> Result<FileRecord> {
        let mut manifest = self.load(key)?;

        let index = manifest
            .files
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| Error::RecordNotFound(id.to_string()))?;

        let removed = manifest.files.remove(index);
        self.save(&manifest, key)?;

        info!(id = %id, records = manifest.files.len(), "Record removed");
        Ok(removed)
    }
}
