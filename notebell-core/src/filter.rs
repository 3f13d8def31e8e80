//! Search filter over the note collection.

use crate::{Note, NoteStore};

/// True when `title` or `content` contains `needle`, ignoring case.
///
/// `needle` must already be lowercased.
fn matches_lowercased(note: &Note, needle: &str) -> bool {
    needle.is_empty()
        || note.title.to_lowercase().contains(needle)
        || note.content.to_lowercase().contains(needle)
}

/// True when the note's title or content contains `query`, ignoring case.
pub fn note_matches(note: &Note, query: &str) -> bool {
    matches_lowercased(note, &query.to_lowercase())
}

/// Notes whose title or content contains `query`, in collection order.
///
/// An empty query matches every note.
pub fn filter_notes(notes: &[Note], query: &str) -> Vec<Note> {
    let needle = query.to_lowercase();
    notes
        .iter()
        .filter(|note| matches_lowercased(note, &needle))
        .cloned()
        .collect()
}

/// Memoized search result over a [`NoteStore`].
///
/// The result is recomputed only when the store revision or the query has
/// changed since the last [`FilteredView::refresh`].
#[derive(Debug, Clone, Default)]
pub struct FilteredView {
    query: String,
    computed_for: Option<(u64, String)>,
    results: Vec<Note>,
    recomputations: u64,
}

impl FilteredView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn refresh(&mut self, store: &NoteStore) -> &[Note] {
        let fresh = matches!(
            &self.computed_for,
            Some((revision, query)) if *revision == store.revision() && *query == self.query
        );
        if !fresh {
            self.results = filter_notes(store.notes(), &self.query);
            self.computed_for = Some((store.revision(), self.query.clone()));
            self.recomputations += 1;
        }
        &self.results
    }

    /// Last computed result, possibly stale.
    pub fn results(&self) -> &[Note] {
        &self.results
    }

    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::parse_timestamp;
    use crate::NoteId;

    fn note(id: i64, title: &str, content: &str) -> Note {
        Note {
            id: NoteId::new(id),
            title: title.to_string(),
            content: content.to_string(),
            created_at: parse_timestamp("2024-01-01T08:00").expect("timestamp"),
            file_url: None,
            reminder_at: None,
        }
    }

    #[test]
    fn test_uppercase_query_matches_content() {
        let notes = vec![note(1, "Shop", "milk"), note(2, "Work", "report")];
        let result = filter_notes(&notes, "MILK");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, NoteId::new(1));
    }

    #[test]
    fn test_empty_query_matches_all() {
        let notes = vec![note(1, "Shop", "milk"), note(2, "Work", "report")];
        assert_eq!(filter_notes(&notes, ""), notes);
    }

    #[test]
    fn test_title_match_keeps_order() {
        let notes = vec![
            note(1, "work log", "x"),
            note(2, "Shop", "y"),
            note(3, "Homework", "z"),
        ];
        let ids: Vec<_> = filter_notes(&notes, "Work").iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![NoteId::new(1), NoteId::new(3)]);
    }

    #[test]
    fn test_view_recomputes_only_on_change() {
        let mut store = NoteStore::new();
        store.replace_all(vec![note(1, "Shop", "milk"), note(2, "Work", "report")]);
        let mut view = FilteredView::new();

        assert_eq!(view.refresh(&store).len(), 2);
        assert_eq!(view.refresh(&store).len(), 2);
        assert_eq!(view.recomputations(), 1);

        view.set_query("milk");
        assert_eq!(view.refresh(&store).len(), 1);
        assert_eq!(view.recomputations(), 2);

        view.set_query("milk");
        view.refresh(&store);
        assert_eq!(view.recomputations(), 2);

        store.insert(note(3, "Dairy", "more milk"));
        assert_eq!(view.refresh(&store).len(), 2);
        assert_eq!(view.recomputations(), 3);
    }
}
