//! Key-value persistence backends for the note collection.
//!
//! The repository only ever talks to a [`NoteStore`]: an opaque string-keyed store with
//! `get` and `set`. Durability is the backend's job.

#[cfg(all(feature = "file", not(target_family = "wasm")))]
pub mod file;
pub mod memory;
#[cfg(feature = "wasm-js")]
pub mod wasm_js;

#[cfg(all(feature = "file", not(target_family = "wasm")))]
pub use file::FileStore;
pub use memory::MemoryStore;
#[cfg(feature = "wasm-js")]
pub use wasm_js::LocalStorage;

/// The key the whole note collection is stored under.
pub const NOTES_KEY: &str = "quicknotes_notes";

/// Boxed future returned by [`NoteStore`] operations.
#[cfg(not(target_family = "wasm"))]
pub type StoreFuture<'a, T> = futures::future::BoxFuture<'a, T>;
/// Boxed future returned by [`NoteStore`] operations.
#[cfg(target_family = "wasm")]
pub type StoreFuture<'a, T> = futures::future::LocalBoxFuture<'a, T>;

/// Errors raised by a storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// An I/O error from the filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A stored file exists but could not be understood.
    #[error("File error: {0}")]
    File(String),
    /// A browser storage API failed.
    #[error("Web storage error: {0}")]
    WebSys(String),
    /// The backend refused the operation.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Trait for persisting the serialized note collection.
pub trait NoteStore: Send {
    /// Retrieves the value stored under `key`.
    ///
    /// # Returns
    /// * `Ok(Some(value))` if the key exists in storage
    /// * `Ok(None)` if the key was never set
    /// * `Err(StorageError)` if the backend could not be read
    fn get<'a>(
        &'a mut self,
        key: &'a str,
    ) -> StoreFuture<'a, Result<Option<String>, StorageError>>;

    /// Stores `value` under `key`, overwriting any prior value.
    ///
    /// # Returns
    /// * `Ok(())` once the value is durably stored
    /// * `Err(StorageError)` if the write was rejected
    fn set<'a>(
        &'a mut self,
        key: &'a str,
        value: String,
    ) -> StoreFuture<'a, Result<(), StorageError>>;
}

impl<S: NoteStore + ?Sized> NoteStore for Box<S> {
    fn get<'a>(
        &'a mut self,
        key: &'a str,
    ) -> StoreFuture<'a, Result<Option<String>, StorageError>> {
        (**self).get(key)
    }

    fn set<'a>(
        &'a mut self,
        key: &'a str,
        value: String,
    ) -> StoreFuture<'a, Result<(), StorageError>> {
        (**self).set(key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn boxed_store_forwards_to_inner() {
        let inner = MemoryStore::new();
        let mut boxed: Box<dyn NoteStore> = Box::new(inner.clone());
        boxed.set("k", "v".to_string()).await.unwrap();
        assert_eq!(boxed.get("k").await.unwrap(), Some("v".to_string()));
        assert_eq!(inner.raw("k"), Some("v".to_string()));
    }
}
