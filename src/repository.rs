//! The note repository: sole owner of the note collection and its persistence.

use crate::{
    note::{MalformedRecordError, Note},
    observer::{ChangeKind, Observers, Subscription},
    option::NotesRepositoryOptions,
    storage::{NoteStore, StorageError},
    view::NotesView,
};
use chrono::Utc;
use serde_json::Value;
use std::{collections::HashSet, fmt};
#[cfg(feature = "tracing")]
use tracing::{debug, error, info, warn};

/// Suffix of the key a blob that failed to decode is copied to.
const CORRUPT_KEY_SUFFIX: &str = ".corrupt";
/// Timestamp appended after [`CORRUPT_KEY_SUFFIX`] so earlier backups are kept.
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S%.9fZ";

/// Errors that can occur while loading the collection from storage.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The store could not be read.
    #[error("Failed to read notes from storage: {0}")]
    Read(#[source] StorageError),
    /// The stored blob is not valid JSON.
    #[error("Stored notes are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The stored blob is valid JSON but not an array.
    #[error("Stored notes are not a list")]
    NotAList,
    /// One of the stored records is not a valid note.
    #[error("Stored note at index {index} is malformed: {source}")]
    Malformed {
        index: usize,
        #[source]
        source: MalformedRecordError,
    },
}

/// Errors that can occur while writing the collection to storage.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// The collection could not be encoded.
    #[error("Failed to encode notes: {0}")]
    Encode(#[from] serde_json::Error),
    /// The store rejected the write.
    #[error("Failed to write notes to storage: {0}")]
    Store(#[from] StorageError),
    /// The last load failed and the stored notes were never read, so they are not
    /// overwritten until a later load succeeds.
    #[error("Refusing to overwrite notes that could not be loaded")]
    NotLoaded,
}

/// Owns the authoritative list of notes, persists it through a [`NoteStore`] and derives
/// the filtered view for the current search query.
///
/// Every mutation is applied in memory, observers are notified, and then the whole
/// collection is written back under a single key. Mutating methods take `&mut self`, so a
/// second mutation cannot start while a save is still in flight.
///
/// A failed save is not rolled back: the in-memory state keeps the change, the error is
/// returned to the caller, and [`has_unsaved_changes`](Self::has_unsaved_changes) reports
/// `true` until a later save succeeds.
///
/// After a load that left the stored blob unread, saves fail with
/// [`PersistenceError::NotLoaded`] until [`load`](Self::load) succeeds again.
pub struct NotesRepository {
    store: Box<dyn NoteStore>,
    key: String,
    notes: Vec<Note>,
    query: String,
    dirty: bool,
    load_failed: bool,
    observers: Observers,
}

impl fmt::Debug for NotesRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotesRepository")
            .field("key", &self.key)
            .field("notes", &self.notes.len())
            .field("query", &self.query)
            .field("dirty", &self.dirty)
            .field("load_failed", &self.load_failed)
            .field("observers", &self.observers)
            .finish()
    }
}

impl NotesRepository {
    /// Creates an empty repository persisting under [`NOTES_KEY`](crate::NOTES_KEY).
    ///
    /// Call [`load`](Self::load) before use to pick up previously saved notes.
    pub fn new<S: Into<Box<dyn NoteStore>>>(store: S) -> Self {
        let options = NotesRepositoryOptions::builder().store(store).build();
        Self::new_with_options(options)
    }

    /// Creates an empty repository from [`NotesRepositoryOptions`].
    pub fn new_with_options(options: NotesRepositoryOptions) -> Self {
        let key = options.resolved_key();
        Self {
            store: options.store,
            key,
            notes: Vec::new(),
            query: String::new(),
            dirty: false,
            load_failed: false,
            observers: Observers::default(),
        }
    }

    /// Creates an empty repository that keeps its notes in `directory`.
    #[cfg(all(feature = "file", not(target_family = "wasm")))]
    pub fn with_file_store<P: Into<std::path::PathBuf>>(directory: P) -> Self {
        Self::new(crate::storage::FileStore::new(directory))
    }

    /// Replaces the in-memory collection with the one persisted in the store.
    ///
    /// A missing blob yields an empty collection. If the blob cannot be read or decoded,
    /// the whole load is abandoned: the collection is left empty and the error is returned.
    /// An undecodable blob is first copied to `<key>.corrupt.<timestamp>`. Observers are
    /// notified in every case.
    ///
    /// When the blob could not be read, or could not be backed up, later saves are refused
    /// so the stored notes are not overwritten by the empty collection.
    pub async fn load(&mut self) -> Result<(), LoadError> {
        let outcome = match self.read_notes().await {
            Ok(notes) => {
                #[cfg(feature = "tracing")]
                info!("Loaded {} notes from `{}`", notes.len(), self.key);
                self.notes = notes;
                self.load_failed = false;
                Ok(())
            }
            Err(e) => {
                #[cfg(feature = "tracing")]
                error!("Failed to load notes from `{}`: {}", self.key, e);
                self.notes.clear();
                Err(e)
            }
        };
        self.dirty = false;
        self.notify(ChangeKind::Loaded);
        outcome
    }

    /// Writes the whole collection to the store, overwriting the previous blob.
    pub async fn save(&mut self) -> Result<(), PersistenceError> {
        if self.load_failed {
            #[cfg(feature = "tracing")]
            warn!("Not saving to `{}` until notes load", self.key);
            return Err(PersistenceError::NotLoaded);
        }
        let encoded = encode_notes(&self.notes)?;
        if let Err(e) = self.store.set(&self.key, encoded).await {
            #[cfg(feature = "tracing")]
            error!(
                "Failed to save {} notes to `{}`: {}",
                self.notes.len(),
                self.key,
                e
            );
            return Err(e.into());
        }
        self.dirty = false;
        Ok(())
    }

    /// Replaces the search query. Matching ignores case.
    pub fn set_query<Q: Into<String>>(&mut self, query: Q) {
        self.query = query.into();
        self.notify(ChangeKind::QueryChanged);
    }

    /// Inserts `note` at the front, or replaces the note with the same id in place, then
    /// saves.
    ///
    /// Observers are notified as soon as the in-memory change is applied, whether or not the
    /// save that follows succeeds.
    pub async fn add_or_update(&mut self, note: Note) -> Result<(), PersistenceError> {
        let existing = self.notes.iter().position(|n| n.id() == note.id());
        match existing {
            Some(index) => self.notes[index] = note,
            None => self.notes.insert(0, note),
        }
        self.dirty = true;
        self.notify(ChangeKind::Upserted);
        self.save().await
    }

    /// Removes every note with the given id, then saves.
    ///
    /// Returns how many notes were removed. Deleting an unknown id still persists and notifies.
    pub async fn delete_note(&mut self, id: &str) -> Result<usize, PersistenceError> {
        let before = self.notes.len();
        self.notes.retain(|note| note.id() != id);
        let removed = before - self.notes.len();
        #[cfg(feature = "tracing")]
        if removed == 0 {
            debug!("Delete of unknown note `{id}`");
        }
        self.dirty = true;
        self.notify(ChangeKind::Deleted);
        self.save().await?;
        Ok(removed)
    }

    /// Registers a callback run after every state change.
    ///
    /// The callback runs synchronously on the thread performing the change and sees the
    /// committed state. It stays registered until the returned [`Subscription`] is dropped.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&NotesView<'_>, ChangeKind) + Send + 'static,
    {
        self.observers.subscribe(Box::new(callback))
    }

    /// Notes matching the current query, in collection order.
    pub fn filtered(&self) -> Vec<&Note> {
        self.view().filtered()
    }

    /// The current state as a borrowed view.
    pub fn view(&self) -> NotesView<'_> {
        NotesView::new(&self.notes, &self.query)
    }

    /// All notes, most recently created first.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn get(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|note| note.id() == id)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Whether the in-memory collection has changes the store has not accepted yet.
    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    /// The key the collection is persisted under.
    pub fn storage_key(&self) -> &str {
        &self.key
    }

    fn notify(&self, kind: ChangeKind) {
        self.observers.notify(&self.view(), kind);
    }

    async fn read_notes(&mut self) -> Result<Vec<Note>, LoadError> {
        let blob = match self.store.get(&self.key).await {
            Ok(Some(blob)) => blob,
            Ok(None) => {
                #[cfg(feature = "tracing")]
                debug!("No notes stored under `{}`", self.key);
                return Ok(Vec::new());
            }
            Err(e) => {
                self.load_failed = true;
                return Err(LoadError::Read(e));
            }
        };
        match decode_notes(&blob) {
            Ok(notes) => Ok(notes),
            Err(e) => {
                // The blob may only be replaced once a copy of it exists.
                self.load_failed = !self.back_up_corrupt_blob(blob).await;
                Err(e)
            }
        }
    }

    /// Copies `blob` to a fresh `<key>.corrupt.<timestamp>` key. Returns whether it was
    /// written.
    async fn back_up_corrupt_blob(&mut self, blob: String) -> bool {
        let stamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let base_key = format!("{}{}.{}", self.key, CORRUPT_KEY_SUFFIX, stamp);
        let mut backup_key = base_key.clone();
        let mut attempt = 1;
        while matches!(self.store.get(&backup_key).await, Ok(Some(_))) {
            backup_key = format!("{base_key}-{attempt}");
            attempt += 1;
        }
        match self.store.set(&backup_key, blob).await {
            Ok(()) => {
                #[cfg(feature = "tracing")]
                warn!("Copied undecodable notes blob to `{backup_key}`");
                true
            }
            Err(_e) => {
                #[cfg(feature = "tracing")]
                error!("Could not back up undecodable notes blob: {_e}");
                false
            }
        }
    }
}

fn encode_notes(notes: &[Note]) -> Result<String, serde_json::Error> {
    let records = notes
        .iter()
        .map(|note| Value::Object(note.to_record()))
        .collect();
    serde_json::to_string(&Value::Array(records))
}

/// Decodes a stored blob. The first malformed record aborts the whole decode; a record
/// repeating an earlier id is dropped.
fn decode_notes(blob: &str) -> Result<Vec<Note>, LoadError> {
    let value: Value = serde_json::from_str(blob)?;
    let records = value.as_array().ok_or(LoadError::NotAList)?;
    let mut seen = HashSet::with_capacity(records.len());
    let mut notes = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let note = Note::from_record(record)
            .map_err(|source| LoadError::Malformed { index, source })?;
        if !seen.insert(note.id().to_string()) {
            #[cfg(feature = "tracing")]
            warn!("Dropping duplicate note `{}` at index {index}", note.id());
            continue;
        }
        notes.push(note);
    }
    Ok(notes)
}
