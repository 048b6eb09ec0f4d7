//! Repository configuration.

use crate::storage::{NoteStore, NOTES_KEY};
use std::fmt;

/// Options for creating a new [`NotesRepository`](crate::NotesRepository).
#[derive(bon::Builder)]
pub struct NotesRepositoryOptions {
    /// Storage with get and set methods, e.g. [`MemoryStore`](crate::storage::MemoryStore)
    /// or `FileStore`.
    #[builder(into)]
    pub store: Box<dyn NoteStore>,
    /// Key the collection is stored under. If not provided, [`NOTES_KEY`] will be used.
    #[builder(into)]
    pub storage_key: Option<String>,
}

impl NotesRepositoryOptions {
    pub(crate) fn resolved_key(&self) -> String {
        self.storage_key
            .clone()
            .unwrap_or_else(|| NOTES_KEY.to_string())
    }
}

impl fmt::Debug for NotesRepositoryOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotesRepositoryOptions")
            .field("storage_key", &self.storage_key)
            .finish_non_exhaustive()
    }
}
