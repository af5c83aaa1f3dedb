//! Object storage boundary.
//!
//! Layers address objects by POSIX-like keys (`bronze/SPY/prices/...`).
//! Stores guarantee read-after-write for the same key and nothing more.

pub mod keys;
pub mod local;
pub mod memory;

pub use local::LocalStore;
pub use memory::MemoryStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found: {key}")]
    NotFound { key: String },

    #[error("invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("object already exists: {key}")]
    AlreadyExists { key: String },

    #[error("I/O error on '{key}': {reason}")]
    Io { key: String, reason: String },

    #[error("store lock poisoned")]
    Poisoned,
}

/// Listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub key: String,
    pub last_modified: DateTime<Utc>,
}

pub trait ObjectStore: Send + Sync {
    fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError>;

    /// Create `key` only if nothing is stored under it yet. The check and the
    /// write are one step; losers get [`StorageError::AlreadyExists`].
    fn put_new(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError>;

    fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// All objects whose key starts with `prefix`, in key order.
    fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>, StorageError>;

    fn exists(&self, key: &str) -> Result<bool, StorageError>;
}

/// Most recently modified key under `prefix`; ties go to the greatest key.
pub fn latest_key(store: &dyn ObjectStore, prefix: &str) -> Result<Option<String>, StorageError> {
    let entries = store.list(prefix)?;
    Ok(entries
        .into_iter()
        .max_by(|a, b| {
            a.last_modified
                .cmp(&b.last_modified)
                .then_with(|| a.key.cmp(&b.key))
        })
        .map(|m| m.key))
}
