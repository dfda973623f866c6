//! File operations: adding files to the vault and restoring them.
//!
//! Each operation derives the working key once from the session, reads the
//! state it needs from disk, and writes its result back. Plaintext file
//! bytes live in zeroizing buffers for the duration of the call only.
//!
//! # Concurrency
//! At most one process may manipulate a vault at a time.

use chrono::Utc;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::manifest::{FileRecord, ManifestStore};
use crate::session::VaultSession;
use hideaway_common::{Error, Result};
use hideaway_crypto::{decrypt, encrypt};

/// MIME type recorded when the extension is unknown.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Parameters for [`FileVaultService::add_file`].
#[derive(Debug, Clone)]
pub struct AddFileRequest {
    /// File to store.
    pub source: PathBuf,
    /// Name to restore under; derived from `source` when `None`.
    pub display_name: Option<String>,
    /// Delete `source` once it is safely stored.
    pub delete_original: bool,
}

impl AddFileRequest {
    /// Request to store `source` under its own name, keeping the original.
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            display_name: None,
            delete_original: false,
        }
    }

    /// Restore under `name` instead of the source file name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Delete the source after it is stored.
    pub fn delete_original(mut self, delete: bool) -> Self {
        self.delete_original = delete;
        self
    }
}

/// Summary of the vault contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VaultStats {
    pub file_count: usize,
    /// Sum of plaintext sizes in bytes.
    pub total_size: u64,
    /// Number of files per MIME type.
    pub by_mime: BTreeMap<String, usize>,
}

/// Extension of `path` with its leading dot, or empty.
fn dotted_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default()
}

/// Default display name: the base name followed by its extension.
fn default_display_name(path: &Path, extension: &str) -> Result<String> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::InvalidInput(format!("Invalid file name: {}", path.display())))?;
    Ok(format!("{}{}", stem, extension))
}

/// Name a record is restored under.
///
/// An empty explicit name means "use the default". A name with no final
/// component (`.`, `..`, `dir/..`) could never be restored and is rejected.
fn resolve_display_name(requested: Option<&str>, source: &Path, extension: &str) -> Result<String> {
    match requested {
        Some(name) if !name.is_empty() => {
            if Path::new(name).file_name().is_none() {
                return Err(Error::InvalidInput(format!("Invalid file name: {}", name)));
            }
            Ok(name.to_string())
        }
        _ => default_display_name(source, extension),
    }
}

/// File vault operations handler.
///
/// Provides the add/retrieve/remove operations using an active session.
pub struct FileVaultService<'a> {
    session: &'a VaultSession,
}

impl<'a> FileVaultService<'a> {
    /// Create new operations handler for a session.
    ///
    /// # Errors
    /// - `SessionLocked` if the session is not active
    pub fn new(session: &'a VaultSession) -> Result<Self> {
        if !session.is_active() {
            return Err(Error::SessionLocked);
        }
        Ok(Self { session })
    }

    fn manifest(&self) -> ManifestStore<'a> {
        ManifestStore::new(self.session.fs(), self.session.layout())
    }

    /// Encrypt a file into the vault and record it in the manifest.
    ///
    /// # Postconditions
    /// - One new payload `<payloadDir>/<id>.enc`
    /// - One new record at the end of the manifest
    /// - The source is deleted only if requested and both writes succeeded
    ///
    /// # Errors
    /// - `Io` (NotFound) if the source does not exist
    /// - `InvalidInput` if the source is a directory or the name has no
    ///   usable final component; nothing is written in that case
    /// - `AuthenticationFailed`/`CorruptManifest` from the manifest update;
    ///   the new payload is removed again in that case
    ///
    /// - `OriginalNotDeleted` if the file was stored but the source could
    ///   not be deleted afterwards; the record stays in the vault
    pub fn add_file(&self, request: &AddFileRequest) -> Result<FileRecord> {
        let fs = self.session.fs();
        let layout = self.session.layout();
        let source = &request.source;

        debug!(source = %source.display(), "Adding file");

        let stat = fs.stat_file(source)?;
        if !stat.exists {
            return Err(Error::Io(std::io::Error::new(
                ErrorKind::NotFound,
                format!("File not found: {}", source.display()),
            )));
        }
        if stat.is_dir {
            return Err(Error::InvalidInput(format!(
                "Not a file: {}",
                source.display()
            )));
        }

        let extension = dotted_extension(source);
        let original_name =
            resolve_display_name(request.display_name.as_deref(), source, &extension)?;
        let original_path = fs
            .canonicalize(source)
            .unwrap_or_else(|_| source.clone())
            .to_string_lossy()
            .into_owned();

        let content = Zeroizing::new(fs.read_file_bytes(source)?);

        let key = self.session.derive_key()?;
        let blob = encrypt(&key, &content)?;

        let id = Uuid::new_v4().to_string();
        let payload_path = layout.payload_path(&id);
        fs.ensure_dir(layout.payload_dir())?;
        fs.write_file_bytes(&payload_path, &blob)?;

        let record = FileRecord {
            id: id.clone(),
            original_name,
            original_path,
            date_added: Utc::now(),
            mime_type: mime_guess::from_path(source)
                .first_raw()
                .unwrap_or(DEFAULT_MIME_TYPE)
                .to_string(),
            extension,
            size: content.len() as i64,
        };

        if let Err(e) = self.manifest().append(record.clone(), &key) {
            if let Err(cleanup) = fs.delete_file(&payload_path) {
                warn!(id = %id, error = %cleanup, "Failed to remove orphaned payload");
            }
            return Err(e);
        }

        if request.delete_original {
            if let Err(e) = fs.delete_file(source) {
                warn!(id = %id, source = %source.display(), error = %e, "File stored but original kept");
                return Err(Error::OriginalNotDeleted {
                    id,
                    reason: e.to_string(),
                });
            }
            info!(source = %source.display(), "Original deleted");
        }

        info!(id = %id, size = content.len(), "File added");
        Ok(record)
    }

    /// Decrypt a stored file back to disk.
    ///
    /// The file is restored as `original_name` inside the directory of
    /// `original_path` when that directory still exists, otherwise inside the
    /// layout's fallback directory. Existing files at the destination are
    /// overwritten.
    ///
    /// # Errors
    /// - `RecordNotFound` if no record has `id`
    /// - `PayloadMissing` if the payload file is gone
    /// - `AuthenticationFailed` if the payload does not verify, including a
    ///   payload too short to hold a nonce
    pub fn retrieve_file(&self, id: &str) -> Result<PathBuf> {
        let fs = self.session.fs();
        let layout = self.session.layout();

        let key = self.session.derive_key()?;
        let record = self.manifest().find_by_id(id, &key)?;

        let destination = self.destination_for(&record)?;

        let payload_path = layout.payload_path(&record.id);
        if !fs.exists(&payload_path)? {
            return Err(Error::PayloadMissing(record.id));
        }
        let blob = fs.read_file_bytes(&payload_path)?;
        let content = decrypt(&key, &blob).map_err(|e| match e {
            Error::TruncatedInput => Error::AuthenticationFailed,
            other => other,
        })?;

        if let Some(parent) = destination.parent() {
            fs.ensure_dir(parent)?;
        }
        fs.write_file_bytes(&destination, &content)?;

        info!(id = %id, destination = %destination.display(), "File retrieved");
        Ok(destination)
    }

    /// Where `record` is restored to.
    fn destination_for(&self, record: &FileRecord) -> Result<PathBuf> {
        // Only the final component of the stored name is used, so a crafted
        // name cannot escape the destination directory.
        let name = Path::new(&record.original_name)
            .file_name()
            .ok_or_else(|| {
                Error::InvalidInput(format!("Invalid file name: {}", record.original_name))
            })?;

        let original_dir = Path::new(&record.original_path)
            .parent()
            .filter(|p| !p.as_os_str().is_empty());

        if let Some(dir) = original_dir {
            if self.session.fs().stat_file(dir)?.is_dir {
                return Ok(dir.join(name));
            }
        }

        debug!(id = %record.id, "Original directory gone, using fallback");
        Ok(self.session.layout().fallback_dir().join(name))
    }

    /// Remove a file from the vault.
    ///
    /// The record is removed from the manifest first, then the payload is
    /// deleted. A payload that is already missing is logged and ignored.
    ///
    /// # Errors
    /// - `RecordNotFound` if no record has `id`
    pub fn remove_file(&self, id: &str) -> Result<FileRecord> {
        let fs = self.session.fs();
        let key = self.session.derive_key()?;

        let record = self.manifest().remove(id, &key)?;

        let payload_path = self.session.layout().payload_path(&record.id);
        match fs.delete_file(&payload_path) {
            Ok(()) => {}
            Err(Error::Io(e)) if e.kind() == ErrorKind::NotFound => {
                warn!(id = %id, "Payload already missing");
            }
            Err(e) => return Err(e),
        }

        info!(id = %id, "File removed");
        Ok(record)
    }

    /// All records in insertion order.
    pub fn list_files(&self) -> Result<Vec<FileRecord>> {
        let key = self.session.derive_key()?;
        self.manifest().list(&key)
    }

    /// Look up a single record.
    pub fn find_file(&self, id: &str) -> Result<FileRecord> {
        let key = self.session.derive_key()?;
        self.manifest().find_by_id(id, &key)
    }

    /// Count and size of the stored files.
    pub fn stats(&self) -> Result<VaultStats> {
        let files = self.list_files()?;

        let mut stats = VaultStats {
            file_count: files.len(),
            ..VaultStats::default()
        };
        for file in &files {
            stats.total_size += file.size.max(0) as u64;
            *stats.by_mime.entry(file.mime_type.clone()).or_insert(0) += 1;
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dotted_extension() {
        assert_eq!(dotted_extension(Path::new("/a/hello.txt")), ".txt");
        assert_eq!(dotted_extension(Path::new("/a/archive.tar.gz")), ".gz");
        assert_eq!(dotted_extension(Path::new("/a/Makefile")), "");
    }

    #[test]
    fn test_default_display_name() {
        let path = Path::new("/a/hello.txt");
        assert_eq!(default_display_name(path, &dotted_extension(path)).unwrap(), "hello.txt");

        let bare = Path::new("/a/Makefile");
        assert_eq!(default_display_name(bare, "").unwrap(), "Makefile");
    }

    #[test]
    fn test_resolve_display_name() {
        let path = Path::new("/a/draft.md");

        assert_eq!(resolve_display_name(Some("notes"), path, ".md").unwrap(), "notes");
        assert_eq!(resolve_display_name(Some(""), path, ".md").unwrap(), "draft.md");
        assert_eq!(resolve_display_name(None, path, ".md").unwrap(), "draft.md");

        for bad in [".", "..", "sub/.."] {
            assert!(matches!(
                resolve_display_name(Some(bad), path, ".md"),
                Err(Error::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn test_add_file_request_builder() {
        let request = AddFileRequest::new("/tmp/draft.md")
            .with_name("notes")
            .delete_original(true);

        assert_eq!(request.display_name.as_deref(), Some("notes"));
        assert!(request.delete_original);
    }
}
