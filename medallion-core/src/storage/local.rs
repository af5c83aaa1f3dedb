//! Filesystem-backed object store.
//!
//! Keys map to paths under a root directory. Writes are atomic: write to a
//! `<path>.<n>.tmp` file, then rename (or, for `put_new`, hard-link) it into
//! place. Listing skips leftover temp files.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};

use super::keys::validate_key;
use super::{ObjectMeta, ObjectStore, StorageError};

const TMP_SUFFIX: &str = ".tmp";

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }

    fn io_err(key: &str, e: std::io::Error) -> StorageError {
        StorageError::Io {
            key: key.to_string(),
            reason: e.to_string(),
        }
    }

    /// Write `bytes` next to `path` under a name no other writer uses.
    fn write_tmp(key: &str, path: &Path, bytes: &[u8]) -> Result<PathBuf, StorageError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Self::io_err(key, e))?;
        }
        let n = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(format!(".{}.{n}{TMP_SUFFIX}", std::process::id()));
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, bytes).map_err(|e| Self::io_err(key, e))?;
        Ok(tmp)
    }

    fn walk(&self, dir: &Path, out: &mut Vec<ObjectMeta>) -> Result<(), StorageError> {
        let display = dir.display().to_string();
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(Self::io_err(&display, e)),
        };
        for entry in entries {
            let entry = entry.map_err(|e| Self::io_err(&display, e))?;
            let path = entry.path();
            let meta = entry.metadata().map_err(|e| Self::io_err(&display, e))?;
            if meta.is_dir() {
                self.walk(&path, out)?;
                continue;
            }
            let Ok(rel) = path.strip_prefix(&self.root) else {
                continue;
            };
            let key = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if key.ends_with(TMP_SUFFIX) {
                continue;
            }
            let modified = meta.modified().map_err(|e| Self::io_err(&key, e))?;
            out.push(ObjectMeta {
                key,
                last_modified: DateTime::<Utc>::from(modified),
            });
        }
        Ok(())
    }
}

impl ObjectStore for LocalStore {
    fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let tmp = Self::write_tmp(key, &path, &bytes)?;
        fs::rename(&tmp, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            Self::io_err(key, e)
        })
    }

    fn put_new(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let tmp = Self::write_tmp(key, &path, &bytes)?;
        // hard_link refuses an existing destination, so at most one writer wins
        let linked = fs::hard_link(&tmp, &path);
        let _ = fs::remove_file(&tmp);
        match linked {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(StorageError::AlreadyExists {
                key: key.to_string(),
            }),
            Err(e) => Err(Self::io_err(key, e)),
        }
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(key)?;
        fs::read(&path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StorageError::NotFound {
                    key: key.to_string(),
                }
            } else {
                Self::io_err(key, e)
            }
        })
    }

    fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>, StorageError> {
        // Walk from the deepest directory the prefix fully names.
        let dir_part = match prefix.rfind('/') {
            Some(idx) => &prefix[..idx],
            None => "",
        };
        let start = if dir_part.is_empty() {
            self.root.clone()
        } else {
            self.path_for(dir_part)?
        };

        let mut out = Vec::new();
        self.walk(&start, &mut out)?;
        out.retain(|m| m.key.starts_with(prefix));
        out.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(out)
    }

    fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.path_for(key)?.is_file())
    }
}
