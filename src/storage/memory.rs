//! In-process storage backend.
//!
//! Clones share the same underlying map, so a handle kept outside the repository can
//! inspect what was persisted or make the backend start rejecting operations.

use super::{NoteStore, StorageError, StoreFuture};
use parking_lot::Mutex;
use std::{collections::HashMap, sync::Arc};

#[derive(Debug, Default)]
struct MemoryState {
    values: HashMap<String, String>,
    fail_reads: bool,
    fail_writes: bool,
}

/// Implementation of [`NoteStore`] backed by a shared `HashMap`.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore(Arc<Mutex<MemoryState>>);

impl MemoryStore {
    /// Creates an empty [`MemoryStore`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a [`MemoryStore`] holding `value` under `key`.
    pub fn with_value<K: Into<String>, V: Into<String>>(key: K, value: V) -> Self {
        let store = Self::new();
        store.0.lock().values.insert(key.into(), value.into());
        store
    }

    /// Makes every subsequent `set` fail with [`StorageError::Unavailable`] while `fail` is set.
    pub fn fail_writes(&self, fail: bool) {
        self.0.lock().fail_writes = fail;
    }

    /// Makes every subsequent `get` fail with [`StorageError::Unavailable`] while `fail` is set.
    pub fn fail_reads(&self, fail: bool) {
        self.0.lock().fail_reads = fail;
    }

    /// Returns the value currently stored under `key`, bypassing failure injection.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.0.lock().values.get(key).cloned()
    }

    /// Returns every stored key in sorted order.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.0.lock().values.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl NoteStore for MemoryStore {
    fn get<'a>(
        &'a mut self,
        key: &'a str,
    ) -> StoreFuture<'a, Result<Option<String>, StorageError>> {
        Box::pin(async move {
            let state = self.0.lock();
            if state.fail_reads {
                return Err(StorageError::Unavailable("reads are disabled".to_string()));
            }
            Ok(state.values.get(key).cloned())
        })
    }

    fn set<'a>(
        &'a mut self,
        key: &'a str,
        value: String,
    ) -> StoreFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            let mut state = self.0.lock();
            if state.fail_writes {
                return Err(StorageError::Unavailable("writes are disabled".to_string()));
            }
            state.values.insert(key.to_string(), value);
            Ok(())
        })
    }
}

impl From<MemoryStore> for Box<dyn NoteStore> {
    fn from(storage: MemoryStore) -> Self {
        Box::new(storage)
    }
}
