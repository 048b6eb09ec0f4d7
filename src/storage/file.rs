//! File-based storage implementation for native environments.
//!
//! Each key is persisted as its own JSON file inside a directory, so the note collection
//! survives process restarts without any external service.

use super::{NoteStore, StorageError, StoreFuture};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

const FILE_STORAGE_PREFIX: &str = "qn-";
const STORAGE_FILE_EXTENSION: &str = "json";
const TEMP_FILE_EXTENSION: &str = "tmp";

/// File-based storage backend that persists values to JSON files on disk.
#[derive(Debug, Clone)]
pub struct FileStore {
    directory: PathBuf,
}

impl FileStore {
    /// Creates a new instance of [`FileStore`].
    ///
    /// # Arguments
    ///
    /// * `directory` - The directory where the storage files will be stored. It is created
    ///   on the first write if it does not exist yet.
    pub fn new<P: Into<PathBuf>>(directory: P) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Returns the directory this store writes into.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn ensure_directory(&self) -> Result<(), StorageError> {
        if self.directory.as_os_str().is_empty() {
            return Ok(()); // current directory
        }
        fs::create_dir_all(&self.directory)?;
        Ok(())
    }

    fn file_path(&self, key: &str) -> PathBuf {
        let sanitized_key = sanitize_key(key);
        self.directory.join(format!(
            "{FILE_STORAGE_PREFIX}{sanitized_key}.{STORAGE_FILE_EXTENSION}"
        ))
    }

    fn read_value(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.file_path(key);
        match fs::read_to_string(&path) {
            Ok(contents) => {
                let stored: FileStoredValue = serde_json::from_str(&contents)
                    .map_err(|e| StorageError::File(format!("{}: {e}", path.display())))?;
                Ok(Some(stored.value))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::from(e)),
        }
    }

    fn write_value(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.ensure_directory()?;
        let path = self.file_path(key);
        let serialized = serde_json::to_string(&FileStoredValue {
            key: key.to_string(),
            value,
        })
        .map_err(|e| StorageError::File(e.to_string()))?;

        // Readers only ever see a complete file.
        let temp_path = path.with_extension(TEMP_FILE_EXTENSION);
        fs::write(&temp_path, serialized)?;
        if let Err(e) = fs::rename(&temp_path, &path) {
            let _ = fs::remove_file(&temp_path);
            return Err(StorageError::from(e));
        }
        Ok(())
    }
}

fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') {
                '_'
            } else {
                c
            }
        })
        .collect()
}

#[derive(Debug, Serialize, Deserialize)]
struct FileStoredValue {
    key: String,
    value: String,
}

impl NoteStore for FileStore {
    fn get<'a>(
        &'a mut self,
        key: &'a str,
    ) -> StoreFuture<'a, Result<Option<String>, StorageError>> {
        Box::pin(async move { self.read_value(key) })
    }

    fn set<'a>(
        &'a mut self,
        key: &'a str,
        value: String,
    ) -> StoreFuture<'a, Result<(), StorageError>> {
        Box::pin(async move { self.write_value(key, value) })
    }
}

impl From<FileStore> for Box<dyn NoteStore> {
    fn from(storage: FileStore) -> Self {
        Box::new(storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_directory() -> PathBuf {
        let mut path = std::env::temp_dir();
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        path.push(format!("quick-notes-file-test-{unique}"));
        path
    }

    #[tokio::test]
    async fn file_store_persists_strings_across_instances() {
        let dir = temp_directory();
        let mut storage = FileStore::new(dir.clone());
        storage
            .set("quicknotes_notes", "[]".to_string())
            .await
            .expect("store value");

        let mut reopened = FileStore::new(dir.clone());
        let retrieved = reopened.get("quicknotes_notes").await.expect("read value");
        assert_eq!(retrieved, Some("[]".to_string()));
        assert!(dir.join("qn-quicknotes_notes.json").exists());
        assert!(!dir.join("qn-quicknotes_notes.tmp").exists());
        let _ = fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn file_store_missing_directory_reads_as_none() {
        let dir = temp_directory();
        let mut storage = FileStore::new(dir.clone());
        assert_eq!(storage.get("absent").await.expect("read missing"), None);
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn file_store_sanitizes_keys() {
        let dir = temp_directory();
        let mut storage = FileStore::new(dir.clone());
        storage
            .set("notes/backup:1", "value".to_string())
            .await
            .expect("store value");
        assert!(dir.join("qn-notes_backup_1.json").exists());
        assert_eq!(
            storage.get("notes/backup:1").await.expect("read value"),
            Some("value".to_string())
        );
        let _ = fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn file_store_reports_unreadable_files() {
        let dir = temp_directory();
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("qn-broken.json"), "not json").unwrap();
        let mut storage = FileStore::new(dir.clone());
        let err = storage.get("broken").await.unwrap_err();
        assert!(matches!(err, StorageError::File(_)));
        let _ = fs::remove_dir_all(dir);
    }
}
