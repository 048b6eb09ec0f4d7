//! Editor-side note drafts.

use super::{ColorValue, Note};

/// Title stored for notes saved with a blank title.
pub const UNTITLED: &str = "Untitled";

/// A note as it sits in an editor before being saved.
///
/// The repository stores titles verbatim; normalizing blank titles happens here, when the
/// draft is turned into a [`Note`].
///
/// # Usage
/// ```
/// use quick_notes::NoteDraft;
///
/// let note = NoteDraft::builder().content("milk, eggs").build().into_note();
/// assert_eq!(note.title(), "Untitled");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, bon::Builder)]
pub struct NoteDraft {
    /// Id of the note being edited, or `None` for a new note.
    #[builder(into)]
    pub id: Option<String>,
    #[builder(default, into)]
    pub title: String,
    #[builder(default, into)]
    pub content: String,
    /// Color of the note. [`ColorValue::DEFAULT`] is used when unset.
    pub color: Option<ColorValue>,
}

impl NoteDraft {
    /// Opens an existing note for editing.
    pub fn from_note(note: &Note) -> Self {
        Self {
            id: Some(note.id().to_string()),
            title: note.title().to_string(),
            content: note.content().to_string(),
            color: Some(note.color()),
        }
    }

    /// Finishes editing, producing a note stamped with the current time.
    pub fn into_note(self) -> Note {
        let title = match self.title.trim() {
            "" => UNTITLED.to_string(),
            trimmed => trimmed.to_string(),
        };
        let color = self.color.unwrap_or_default();
        match self.id {
            Some(id) => Note::with_id(id, title, self.content, color),
            None => Note::new(title, self.content, color),
        }
    }
}

impl From<&Note> for NoteDraft {
    fn from(note: &Note) -> Self {
        Self::from_note(note)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_title_becomes_untitled() {
        let note = NoteDraft::builder()
            .title("   ")
            .content("body")
            .build()
            .into_note();
        assert_eq!(note.title(), UNTITLED);
        assert_eq!(note.content(), "body");
        assert_eq!(note.color(), ColorValue::DEFAULT);
    }

    #[test]
    fn title_is_trimmed() {
        let note = NoteDraft::builder()
            .title("  Groceries ")
            .build()
            .into_note();
        assert_eq!(note.title(), "Groceries");
    }

    #[test]
    fn editing_keeps_id_and_color() {
        let original = Note::with_id("1", "A", "a", ColorValue(0xFF11_2233));
        let mut draft = NoteDraft::from(&original);
        draft.title = "A2".to_string();
        let saved = draft.into_note();
        assert_eq!(saved.id(), "1");
        assert_eq!(saved.title(), "A2");
        assert_eq!(saved.color(), ColorValue(0xFF11_2233));
    }

    #[test]
    fn draft_without_id_gets_a_fresh_one() {
        let note = NoteDraft::default().into_note();
        assert!(!note.id().is_empty());
        assert_eq!(note.title(), UNTITLED);
    }
}
