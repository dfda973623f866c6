//! Filesystem collaborator trait definition.

use std::path::{Path, PathBuf};

use hideaway_common::Result;

/// Result of a stat call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileStat {
    /// Whether anything exists at the path.
    pub exists: bool,
    /// Whether the path is a directory.
    pub is_dir: bool,
    /// Size in bytes (0 for directories and absent paths).
    pub size: u64,
}

impl FileStat {
    /// Stat result for a path that does not exist.
    pub fn absent() -> Self {
        Self::default()
    }
}

/// Filesystem access required by the vault core.
///
/// Implementations report absent files as `Error::Io` with
/// `ErrorKind::NotFound`, except `stat_file` which reports them through
/// `FileStat::exists`.
pub trait VaultFs: Send + Sync {
    /// Read an entire file into memory.
    ///
    /// # Errors
    /// - NotFound if the file does not exist
    /// - Other I/O errors
    fn read_file_bytes(&self, path: &Path) -> Result<Vec<u8>>;

    /// Stat a path without failing on absence.
    fn stat_file(&self, path: &Path) -> Result<FileStat>;

    /// Write `data` to `path`, replacing any existing file.
    ///
    /// # Preconditions
    /// - Parent directory must exist
    ///
    /// # Postconditions
    /// - Either the old content or the complete new content is visible at
    ///   `path`, never a partial write
    fn write_file_bytes(&self, path: &Path, data: &[u8]) -> Result<()>;

    /// Delete a single file.
    ///
    /// # Errors
    /// - NotFound if the file does not exist
    fn delete_file(&self, path: &Path) -> Result<()>;

    /// Create a directory and all missing ancestors. Existing directories are fine.
    fn ensure_dir(&self, path: &Path) -> Result<()>;

    /// Remove a directory tree. Absent directories are fine.
    fn remove_dir_all(&self, path: &Path) -> Result<()>;

    /// Resolve a path to its absolute form.
    ///
    /// # Errors
    /// - NotFound if the path does not exist
    fn canonicalize(&self, path: &Path) -> Result<PathBuf>;

    /// Convenience: whether anything exists at `path`.
    fn exists(&self, path: &Path) -> Result<bool> {
        Ok(self.stat_file(path)?.exists)
    }
}
