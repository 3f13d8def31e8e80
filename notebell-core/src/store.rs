//! In-memory note collection.
//!
//! Insertion order is display order. Every mutation bumps `revision`, which
//! derived views use to decide whether to recompute.

use crate::{Note, NoteId};
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct NoteStore {
    notes: Vec<Note>,
    revision: u64,
}

impl NoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole collection, keeping the first note seen for each id.
    pub fn replace_all(&mut self, notes: impl IntoIterator<Item = Note>) {
        let mut seen = HashSet::new();
        self.notes = notes
            .into_iter()
            .filter(|note| seen.insert(note.id))
            .collect();
        self.bump();
    }

    /// Append a note. A note whose id is already present replaces it in place.
    pub fn insert(&mut self, note: Note) {
        match self.position(note.id) {
            Some(index) => self.notes[index] = note,
            None => self.notes.push(note),
        }
        self.bump();
    }

    /// Swap the note with `id` for `note`, keeping its position.
    ///
    /// Returns the previous note, or `None` (and leaves the store untouched)
    /// when `id` is absent or `note.id` differs from `id`.
    pub fn replace(&mut self, id: NoteId, note: Note) -> Option<Note> {
        if note.id != id {
            return None;
        }
        let index = self.position(id)?;
        let previous = std::mem::replace(&mut self.notes[index], note);
        self.bump();
        Some(previous)
    }

    pub fn remove_by_id(&mut self, id: NoteId) -> Option<Note> {
        let index = self.position(id)?;
        let removed = self.notes.remove(index);
        self.bump();
        Some(removed)
    }

    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    pub fn contains(&self, id: NoteId) -> bool {
        self.position(id).is_some()
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn position(&self, id: NoteId) -> Option<usize> {
        self.notes.iter().position(|note| note.id == id)
    }

    fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::parse_timestamp;

    fn note(id: i64, title: &str) -> Note {
        Note {
            id: NoteId::new(id),
            title: title.to_string(),
            content: format!("{title} body"),
            created_at: parse_timestamp("2024-01-01T08:00").expect("timestamp"),
            file_url: None,
            reminder_at: None,
        }
    }

    fn titles(store: &NoteStore) -> Vec<&str> {
        store.notes().iter().map(|n| n.title.as_str()).collect()
    }

    #[test]
    fn test_insert_appends_in_order() {
        let mut store = NoteStore::new();
        store.insert(note(1, "a"));
        store.insert(note(2, "b"));
        assert_eq!(titles(&store), vec!["a", "b"]);
        assert_eq!(store.revision(), 2);
    }

    #[test]
    fn test_insert_existing_id_replaces_in_place() {
        let mut store = NoteStore::new();
        store.insert(note(1, "a"));
        store.insert(note(2, "b"));
        store.insert(note(1, "a2"));
        assert_eq!(titles(&store), vec!["a2", "b"]);
    }

    #[test]
    fn test_replace_all_dedupes() {
        let mut store = NoteStore::new();
        store.replace_all(vec![note(1, "a"), note(2, "b"), note(1, "dup")]);
        assert_eq!(titles(&store), vec!["a", "b"]);
    }

    #[test]
    fn test_replace_preserves_position() {
        let mut store = NoteStore::new();
        store.replace_all(vec![note(1, "a"), note(2, "b"), note(3, "c")]);
        let previous = store.replace(NoteId::new(2), note(2, "B"));
        assert_eq!(previous.map(|n| n.title), Some("b".to_string()));
        assert_eq!(titles(&store), vec!["a", "B", "c"]);
    }

    #[test]
    fn test_replace_absent_is_noop() {
        let mut store = NoteStore::new();
        store.insert(note(1, "a"));
        let revision = store.revision();
        assert!(store.replace(NoteId::new(5), note(5, "x")).is_none());
        assert!(store.replace(NoteId::new(1), note(2, "mismatch")).is_none());
        assert_eq!(store.revision(), revision);
        assert_eq!(titles(&store), vec!["a"]);
    }

    #[test]
    fn test_remove_by_id_twice() {
        let mut store = NoteStore::new();
        store.replace_all(vec![note(1, "a"), note(2, "b")]);
        assert!(store.remove_by_id(NoteId::new(1)).is_some());
        let revision = store.revision();
        assert!(store.remove_by_id(NoteId::new(1)).is_none());
        assert_eq!(store.revision(), revision);
        assert_eq!(titles(&store), vec!["b"]);
    }
}
