//! Offline note management for Rust applications.
//!
//! A [`NotesRepository`] owns the list of notes, persists the whole collection as one JSON
//! blob through a [`NoteStore`](storage::NoteStore), and derives a filtered view from a live
//! search query. Presentation code subscribes to changes and re-renders from
//! [`NotesRepository::filtered`].
//!
//! # Usage
//! ```
//! use quick_notes::{storage::MemoryStore, NoteDraft, NotesRepository};
//!
//! # futures::executor::block_on(async {
//! let mut repository = NotesRepository::new(MemoryStore::new());
//! repository.load().await?;
//!
//! let _subscription = repository.subscribe(|view, _kind| {
//!     println!("{} notes visible", view.filtered().len());
//! });
//!
//! let draft = NoteDraft::builder().title("Groceries").content("milk, eggs").build();
//! repository.add_or_update(draft.into_note()).await?;
//!
//! repository.set_query("EGG");
//! assert_eq!(repository.filtered().len(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # }).unwrap();
//! ```

pub mod note;
pub mod observer;
pub mod option;
pub mod repository;
pub mod storage;
pub mod view;

pub use note::{ColorValue, MalformedRecordError, Note, NoteDraft};
pub use observer::{ChangeKind, Subscription};
pub use option::NotesRepositoryOptions;
pub use repository::{LoadError, NotesRepository, PersistenceError};
pub use storage::{NoteStore, StorageError, NOTES_KEY};
pub use view::NotesView;
