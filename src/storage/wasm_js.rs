//! Browser `localStorage` backend.

use super::{NoteStore, StorageError, StoreFuture};
#[cfg(feature = "tracing")]
use tracing::error;
use web_sys::{wasm_bindgen::JsValue, Storage};

const LOCAL_STORAGE_PREFIX: &str = "qn-";

impl From<JsValue> for StorageError {
    fn from(value: JsValue) -> Self {
        StorageError::WebSys(format!("{value:?}"))
    }
}

/// Implementation of [`NoteStore`] on top of `window.localStorage`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorage;

impl LocalStorage {
    /// Creates a new instance of [`LocalStorage`].
    pub fn new() -> Self {
        Self
    }

    fn get_local_storage(&self) -> Result<Storage, StorageError> {
        match gloo_utils::window().local_storage() {
            Ok(Some(storage)) => Ok(storage),
            Ok(None) => Err(StorageError::WebSys(
                "LocalStorage not available".to_string(),
            )),
            Err(e) => {
                #[cfg(feature = "tracing")]
                error!("Could not find local storage: {e:?}");
                Err(StorageError::from(e))
            }
        }
    }
}

impl NoteStore for LocalStorage {
    fn get<'a>(
        &'a mut self,
        key: &'a str,
    ) -> StoreFuture<'a, Result<Option<String>, StorageError>> {
        Box::pin(async move {
            let local_storage = self.get_local_storage()?;
            let key = format!("{}{}", LOCAL_STORAGE_PREFIX, key);
            Ok(local_storage.get_item(&key)?)
        })
    }

    fn set<'a>(
        &'a mut self,
        key: &'a str,
        value: String,
    ) -> StoreFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            let local_storage = self.get_local_storage()?;
            let key = format!("{}{}", LOCAL_STORAGE_PREFIX, key);
            if let Err(e) = local_storage.set_item(&key, &value) {
                // Quota exhaustion surfaces here.
                #[cfg(feature = "tracing")]
                error!("Could not set item in local storage: {e:?}");
                return Err(StorageError::from(e));
            }
            Ok(())
        })
    }
}

impl From<LocalStorage> for Box<dyn NoteStore> {
    fn from(storage: LocalStorage) -> Self {
        Box::new(storage)
    }
}
