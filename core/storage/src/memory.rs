//! In-memory filesystem backend for testing.

use std::collections::{BTreeMap, HashSet};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::RwLock;

use crate::provider::{FileStat, VaultFs};
use hideaway_common::{Error, Result};

/// In-memory storage entry.
#[derive(Debug, Clone)]
enum Entry {
    File(Vec<u8>),
    Directory,
}

/// In-memory filesystem.
///
/// Useful for testing. All data is stored in memory and lost on drop.
/// The root `/` always exists. Paths are normalized lexically, so
/// `canonicalize` only strips `.` and `..` components.
pub struct MemoryFs {
    entries: RwLock<BTreeMap<PathBuf, Entry>>,
    denied_writes: RwLock<HashSet<PathBuf>>,
}

fn not_found(path: &Path) -> Error {
    Error::Io(std::io::Error::new(
        ErrorKind::NotFound,
        format!("Not found: {}", path.display()),
    ))
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::from("/");
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::ParentDir => {
                out.pop();
            }
            Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
        }
    }
    out
}

impl MemoryFs {
    /// Create a new empty filesystem containing only the root directory.
    pub fn new() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(PathBuf::from("/"), Entry::Directory);
        Self {
            entries: RwLock::new(entries),
            denied_writes: RwLock::new(HashSet::new()),
        }
    }

    /// Make every subsequent write or delete of `path` fail with PermissionDenied.
    ///
    /// Lets tests inject a failure at a precise step of a multi-write operation.
    pub fn deny_writes(&self, path: impl AsRef<Path>) {
        self.denied_writes
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(normalize(path.as_ref()));
    }

    /// Paths of all files currently stored, in sorted order.
    pub fn files(&self) -> Vec<PathBuf> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|(_, entry)| matches!(entry, Entry::File(_)))
            .map(|(path, _)| path.clone())
            .collect()
    }

    fn check_writable(&self, key: &Path) -> Result<()> {
        if self
            .denied_writes
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(key)
        {
            return Err(Error::Io(std::io::Error::new(
                ErrorKind::PermissionDenied,
                format!("Write denied: {}", key.display()),
            )));
        }
        Ok(())
    }
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl VaultFs for MemoryFs {
    fn read_file_bytes(&self, path: &Path) -> Result<Vec<u8>> {
        let key = normalize(path);
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        match entries.get(&key) {
            Some(Entry::File(data)) => Ok(data.clone()),
            Some(Entry::Directory) => Err(Error::InvalidInput(format!(
                "Cannot read directory: {}",
                key.display()
            ))),
            None => Err(not_found(&key)),
        }
    }

    fn stat_file(&self, path: &Path) -> Result<FileStat> {
        let key = normalize(path);
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        Ok(match entries.get(&key) {
            Some(Entry::File(data)) => FileStat {
                exists: true,
                is_dir: false,
                size: data.len() as u64,
            },
            Some(Entry::Directory) => FileStat {
                exists: true,
                is_dir: true,
                size: 0,
            },
            None => FileStat::absent(),
        })
    }

    fn write_file_bytes(&self, path: &Path, data: &[u8]) -> Result<()> {
        let key = normalize(path);

        self.check_writable(&key)?;

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());

        // Check parent exists
        if let Some(parent) = key.parent() {
            match entries.get(parent) {
                Some(Entry::Directory) => {}
                Some(Entry::File(_)) => {
                    return Err(Error::InvalidInput("Parent is a file".to_string()));
                }
                None => return Err(not_found(parent)),
            }
        }

        if let Some(Entry::Directory) = entries.get(&key) {
            return Err(Error::InvalidInput(format!(
                "Cannot overwrite directory: {}",
                key.display()
            )));
        }

        entries.insert(key, Entry::File(data.to_vec()));
        Ok(())
    }

    fn delete_file(&self, path: &Path) -> Result<()> {
        let key = normalize(path);
        self.check_writable(&key)?;

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        match entries.get(&key) {
            Some(Entry::File(_)) => {
                entries.remove(&key);
                Ok(())
            }
            Some(Entry::Directory) => Err(Error::InvalidInput(
                "Use remove_dir_all for directories".to_string(),
            )),
            None => Err(not_found(&key)),
        }
    }

    fn ensure_dir(&self, path: &Path) -> Result<()> {
        let key = normalize(path);
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());

        let mut current = PathBuf::from("/");
        for component in key.components().skip(1) {
            current.push(component);
            match entries.get(&current) {
                Some(Entry::Directory) => {}
                Some(Entry::File(_)) => {
                    return Err(Error::InvalidInput(format!(
                        "Path component is a file: {}",
                        current.display()
                    )));
                }
                None => {
                    entries.insert(current.clone(), Entry::Directory);
                }
            }
        }
        Ok(())
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        let key = normalize(path);
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.retain(|p, _| !p.starts_with(&key) || p == Path::new("/"));
        Ok(())
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        let key = normalize(path);
        if self.entries.read().unwrap_or_else(|e| e.into_inner()).contains_key(&key) {
            Ok(key)
        } else {
            Err(not_found(&key))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_write_read() {
        let fs = MemoryFs::new();
        fs.ensure_dir(Path::new("/vault")).unwrap();
        fs.write_file_bytes(Path::new("/vault/a.bin"), b"data").unwrap();

        assert_eq!(fs.read_file_bytes(Path::new("/vault/a.bin")).unwrap(), b"data");
        assert_eq!(fs.stat_file(Path::new("/vault/a.bin")).unwrap().size, 4);
    }

    #[test]
    fn test_memory_write_requires_parent() {
        let fs = MemoryFs::new();
        let err = fs
            .write_file_bytes(Path::new("/missing/a.bin"), b"data")
            .unwrap_err();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == ErrorKind::NotFound));
    }

    #[test]
    fn test_memory_ensure_dir_creates_ancestors() {
        let fs = MemoryFs::new();
        fs.ensure_dir(Path::new("/a/b/c")).unwrap();

        assert!(fs.stat_file(Path::new("/a")).unwrap().is_dir);
        assert!(fs.stat_file(Path::new("/a/b/c")).unwrap().is_dir);
    }

    #[test]
    fn test_memory_remove_dir_all() {
        let fs = MemoryFs::new();
        fs.ensure_dir(Path::new("/v/dump")).unwrap();
        fs.write_file_bytes(Path::new("/v/dump/x.enc"), b"x").unwrap();
        fs.write_file_bytes(Path::new("/v/keep"), b"k").unwrap();

        fs.remove_dir_all(Path::new("/v/dump")).unwrap();

        assert!(!fs.exists(Path::new("/v/dump")).unwrap());
        assert!(!fs.exists(Path::new("/v/dump/x.enc")).unwrap());
        assert!(fs.exists(Path::new("/v/keep")).unwrap());
    }

    #[test]
    fn test_memory_deny_writes() {
        let fs = MemoryFs::new();
        fs.deny_writes("/db.enc");

        let err = fs.write_file_bytes(Path::new("/db.enc"), b"x").unwrap_err();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == ErrorKind::PermissionDenied));
        assert!(fs.write_file_bytes(Path::new("/other"), b"x").is_ok());

        fs.deny_writes("/other");
        let err = fs.delete_file(Path::new("/other")).unwrap_err();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == ErrorKind::PermissionDenied));
        assert!(fs.exists(Path::new("/other")).unwrap());
    }

    #[test]
    fn test_memory_canonicalize() {
        let fs = MemoryFs::new();
        fs.ensure_dir(Path::new("/home/user")).unwrap();

        assert_eq!(
            fs.canonicalize(Path::new("/home/./user/../user")).unwrap(),
            PathBuf::from("/home/user")
        );
        assert!(fs.canonicalize(Path::new("/nope")).is_err());
    }
}
