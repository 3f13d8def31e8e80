//! Shared handle to the note collection.
//!
//! The app mutates the collection; the reminder scheduler reads it from its
//! own task. Each mutation is a single write-lock step.

use notebell_core::{Note, NoteId, NoteStore};
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard};

#[derive(Debug, Clone, Default)]
pub struct SharedNoteStore {
    inner: Arc<RwLock<NoteStore>>,
}

impl SharedNoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, NoteStore> {
        self.inner.read().await
    }

    /// Copy of the current collection.
    pub async fn snapshot(&self) -> Vec<Note> {
        self.inner.read().await.notes().to_vec()
    }

    pub async fn get(&self, id: NoteId) -> Option<Note> {
        self.inner.read().await.get(id).cloned()
    }

    pub async fn replace_all(&self, notes: Vec<Note>) {
        self.inner.write().await.replace_all(notes);
    }

    pub async fn insert(&self, note: Note) {
        self.inner.write().await.insert(note);
    }

    pub async fn replace(&self, id: NoteId, note: Note) -> Option<Note> {
        self.inner.write().await.replace(id, note)
    }

    pub async fn remove_by_id(&self, id: NoteId) -> Option<Note> {
        self.inner.write().await.remove_by_id(id)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}
