//! In-process object store.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};

use super::keys::validate_key;
use super::{ObjectMeta, ObjectStore, StorageError};

#[derive(Debug, Default)]
struct Inner {
    objects: BTreeMap<String, (Vec<u8>, DateTime<Utc>)>,
    last_stamp: Option<DateTime<Utc>>,
}

/// `BTreeMap`-backed store. Every write gets a strictly later
/// `last_modified` than the one before, so "latest" is never ambiguous.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl Inner {
    fn next_stamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_stamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_stamp = Some(stamp);
        stamp
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|i| i.objects.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ObjectStore for MemoryStore {
    fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        validate_key(key)?;
        let mut inner = self.inner.write().map_err(|_| StorageError::Poisoned)?;
        let stamp = inner.next_stamp();
        inner.objects.insert(key.to_string(), (bytes, stamp));
        Ok(())
    }

    fn put_new(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        validate_key(key)?;
        let mut inner = self.inner.write().map_err(|_| StorageError::Poisoned)?;
        let stamp = inner.next_stamp();
        match inner.objects.entry(key.to_string()) {
            Entry::Occupied(_) => Err(StorageError::AlreadyExists {
                key: key.to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert((bytes, stamp));
                Ok(())
            }
        }
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let inner = self.inner.read().map_err(|_| StorageError::Poisoned)?;
        inner
            .objects
            .get(key)
            .map(|(bytes, _)| bytes.clone())
            .ok_or_else(|| StorageError::NotFound {
                key: key.to_string(),
            })
    }

    fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>, StorageError> {
        let inner = self.inner.read().map_err(|_| StorageError::Poisoned)?;
        Ok(inner
            .objects
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, (_, modified))| ObjectMeta {
                key: k.clone(),
                last_modified: *modified,
            })
            .collect())
    }

    fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let inner = self.inner.read().map_err(|_| StorageError::Poisoned)?;
        Ok(inner.objects.contains_key(key))
    }
}
