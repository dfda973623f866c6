//! Local filesystem backend.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::provider::{FileStat, VaultFs};
use hideaway_common::{Error, Result};

/// Mode given to newly created files on Unix.
#[cfg(unix)]
pub const NEW_FILE_MODE: u32 = 0o644;

/// Permissions a replacing write should leave at `path`.
///
/// An existing file keeps its permissions; on Unix a new file gets
/// [`NEW_FILE_MODE`] rather than the owner-only mode of the temporary file.
fn target_permissions(path: &Path) -> Result<Option<fs::Permissions>> {
    match fs::metadata(path) {
        Ok(meta) => Ok(Some(meta.permissions())),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(new_file_permissions()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(unix)]
fn new_file_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(NEW_FILE_MODE))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<fs::Permissions> {
    None
}

/// Local filesystem backend backed by `std::fs`.
///
/// Replacing writes go through a temporary file in the same directory
/// followed by a rename, so a crash mid-write leaves the previous content
/// in place.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl LocalFs {
    /// Create a new local backend.
    pub fn new() -> Self {
        Self
    }
}

impl VaultFs for LocalFs {
    fn read_file_bytes(&self, path: &Path) -> Result<Vec<u8>> {
        Ok(fs::read(path)?)
    }

    fn stat_file(&self, path: &Path) -> Result<FileStat> {
        match fs::metadata(path) {
            Ok(meta) => Ok(FileStat {
                exists: true,
                is_dir: meta.is_dir(),
                size: if meta.is_file() { meta.len() } else { 0 },
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(FileStat::absent()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_file_bytes(&self, path: &Path, data: &[u8]) -> Result<()> {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        if !parent.is_dir() {
            return Err(Error::Io(std::io::Error::new(
                ErrorKind::NotFound,
                format!("Parent directory not found: {}", parent.display()),
            )));
        }

        let mut tmp = NamedTempFile::new_in(parent)?;
        tmp.write_all(data)?;
        if let Some(perms) = target_permissions(path)? {
            tmp.as_file().set_permissions(perms)?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| Error::Io(e.error))?;

        debug!(path = %path.display(), size = data.len(), "File written");
        Ok(())
    }

    fn delete_file(&self, path: &Path) -> Result<()> {
        if path.is_dir() {
            return Err(Error::InvalidInput(
                "Use remove_dir_all for directories".to_string(),
            ));
        }
        fs::remove_file(path)?;
        Ok(())
    }

    fn ensure_dir(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        Ok(())
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        match fs::remove_dir_all(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        Ok(fs::canonicalize(path)?)
    }
}
