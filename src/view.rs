//! Read-only view of the repository state and the search filter.

use crate::note::Note;

/// Borrowed snapshot of the note collection and the current query.
#[derive(Debug, Clone, Copy)]
pub struct NotesView<'a> {
    notes: &'a [Note],
    query: &'a str,
}

impl<'a> NotesView<'a> {
    pub(crate) fn new(notes: &'a [Note], query: &'a str) -> Self {
        Self { notes, query }
    }

    /// All notes, most recently created first.
    pub fn notes(&self) -> &'a [Note] {
        self.notes
    }

    pub fn query(&self) -> &'a str {
        self.query
    }

    /// Notes whose title or content contains the query, ignoring case.
    ///
    /// An empty query matches everything. Relative order is preserved.
    pub fn filtered(&self) -> Vec<&'a Note> {
        if self.query.is_empty() {
            return self.notes.iter().collect();
        }
        let needle = self.query.to_lowercase();
        self.notes
            .iter()
            .filter(|note| note.matches_lowercase(&needle))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::ColorValue;

    fn notes() -> Vec<Note> {
        vec![
            Note::with_id("3", "Trip", "Pack the EGG timer", ColorValue::DEFAULT),
            Note::with_id("2", "Ideas", "", ColorValue::DEFAULT),
            Note::with_id("1", "Groceries", "milk, eggs", ColorValue::DEFAULT),
        ]
    }

    fn filtered_ids<'a>(notes: &'a [Note], query: &'a str) -> Vec<&'a str> {
        NotesView::new(notes, query)
            .filtered()
            .into_iter()
            .map(|note| note.id())
            .collect()
    }

    #[test]
    fn empty_query_returns_everything_in_order() {
        let notes = notes();
        assert_eq!(filtered_ids(&notes, ""), vec!["3", "2", "1"]);
    }

    #[test]
    fn query_matches_title_or_content_ignoring_case() {
        let notes = notes();
        assert_eq!(filtered_ids(&notes, "egg"), vec!["3", "1"]);
        assert_eq!(filtered_ids(&notes, "IDEA"), vec!["2"]);
        assert!(filtered_ids(&notes, "bread").is_empty());
    }

    #[test]
    fn whitespace_query_is_matched_literally() {
        let notes = notes();
        assert_eq!(filtered_ids(&notes, " "), vec!["3", "1"]);
    }

    #[test]
    fn filter_agrees_with_definition() {
        let notes = notes();
        for query in ["", "e", "GG", "milk,", "trip", "zzz", "ideas"] {
            let expected: Vec<&str> = notes
                .iter()
                .filter(|n| {
                    query.is_empty()
                        || n.title().to_lowercase().contains(&query.to_lowercase())
                        || n.content().to_lowercase().contains(&query.to_lowercase())
                })
                .map(|n| n.id())
                .collect();
            assert_eq!(filtered_ids(&notes, query), expected);
        }
    }
}
