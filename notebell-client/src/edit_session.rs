//! Single-note edit session.
//!
//! At most one note is edited at a time. Starting a new session replaces the
//! previous one and its unsaved draft without warning.

use crate::repository::NoteRepository;
use crate::store::SharedNoteStore;
use notebell_core::{
    format_for_editing, format_wire, Attachment, Note, NoteError, NoteId, NoteResult, Timestamp,
    UpdateDraft,
};

/// Unsaved field values for the note under edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDraft {
    pub title: String,
    pub content: String,
    /// Replacement attachment; `None` keeps the current one.
    pub file: Option<Attachment>,
    /// `YYYY-MM-DDTHH:MM`, or empty to clear the reminder.
    pub reminder_at: String,
    /// Reminder the note had when editing started, at full precision.
    original_reminder_at: Option<Timestamp>,
}

impl EditDraft {
    pub fn from_note(note: &Note) -> Self {
        Self {
            title: note.title.clone(),
            content: note.content.clone(),
            file: None,
            reminder_at: note.reminder_for_editing(),
            original_reminder_at: note.reminder_at,
        }
    }

    /// An untouched reminder is sent back with its original seconds, so the
    /// stored instant does not move.
    pub fn to_update(&self) -> UpdateDraft {
        let reminder_at = match &self.original_reminder_at {
            Some(at) if self.reminder_at == format_for_editing(at) => format_wire(at),
            _ => self.reminder_at.clone(),
        };
        UpdateDraft {
            title: self.title.clone(),
            content: self.content.clone(),
            file: self.file.clone(),
            reminder_at,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditSession {
    #[default]
    Idle,
    Active { id: NoteId, draft: EditDraft },
}

/// Result of a commit that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The store accepted the draft; the local note was replaced.
    Saved(Note),
    /// The note no longer exists in the store; it was dropped locally.
    Removed(NoteId),
}

#[derive(Debug, Default)]
pub struct EditSessionManager {
    session: EditSession,
}

impl EditSessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn active_id(&self) -> Option<NoteId> {
        match &self.session {
            EditSession::Active { id, .. } => Some(*id),
            EditSession::Idle => None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active_id().is_some()
    }

    pub fn draft(&self) -> Option<&EditDraft> {
        match &self.session {
            EditSession::Active { draft, .. } => Some(draft),
            EditSession::Idle => None,
        }
    }

    pub fn draft_mut(&mut self) -> Option<&mut EditDraft> {
        match &mut self.session {
            EditSession::Active { draft, .. } => Some(draft),
            EditSession::Idle => None,
        }
    }

    /// Begin editing `note`, seeding the draft from its current fields.
    pub fn start(&mut self, note: &Note) {
        if let Some(previous) = self.active_id().filter(|id| *id != note.id) {
            tracing::debug!(
                discarded_note_id = %previous,
                note_id = %note.id,
                "Replacing unsaved edit session"
            );
        }
        self.session = EditSession::Active {
            id: note.id,
            draft: EditDraft::from_note(note),
        };
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> bool {
        self.draft_mut().map(|draft| draft.title = title.into()).is_some()
    }

    pub fn set_content(&mut self, content: impl Into<String>) -> bool {
        self.draft_mut()
            .map(|draft| draft.content = content.into())
            .is_some()
    }

    pub fn set_file(&mut self, file: Option<Attachment>) -> bool {
        self.draft_mut().map(|draft| draft.file = file).is_some()
    }

    pub fn set_reminder(&mut self, reminder_at: impl Into<String>) -> bool {
        self.draft_mut()
            .map(|draft| draft.reminder_at = reminder_at.into())
            .is_some()
    }

    /// Discard the draft. Returns the id that was being edited.
    pub fn cancel(&mut self) -> Option<NoteId> {
        let id = self.active_id();
        self.session = EditSession::Idle;
        id
    }

    /// Send the draft to the store and apply the result locally.
    ///
    /// Errors other than `NotFound` leave the session and its draft intact.
    pub async fn commit(
        &mut self,
        repository: &dyn NoteRepository,
        store: &SharedNoteStore,
    ) -> NoteResult<CommitOutcome> {
        let (id, update) = match &self.session {
            EditSession::Active { id, draft } => (*id, draft.to_update()),
            EditSession::Idle => return Err(NoteError::validation("no active edit session")),
        };

        match repository.update(id, &update).await {
            Ok(note) => {
                if store.replace(id, note.clone()).await.is_none() {
                    tracing::warn!(note_id = %id, "Saved note is no longer in the local collection");
                }
                self.session = EditSession::Idle;
                Ok(CommitOutcome::Saved(note))
            }
            Err(NoteError::NotFound { .. }) => {
                store.remove_by_id(id).await;
                self.session = EditSession::Idle;
                tracing::info!(note_id = %id, "Edited note was deleted remotely; dropped locally");
                Ok(CommitOutcome::Removed(id))
            }
            Err(err) => {
                tracing::warn!(note_id = %id, error = %err, "Edit commit failed; draft kept");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notebell_core::parse_timestamp;

    fn note(id: i64, title: &str, reminder: Option<&str>) -> Note {
        Note {
            id: NoteId::new(id),
            title: title.to_string(),
            content: format!("{title} content"),
            created_at: parse_timestamp("2024-01-01T08:00").expect("timestamp"),
            file_url: None,
            reminder_at: reminder.and_then(parse_timestamp),
        }
    }

    #[test]
    fn test_start_seeds_draft_with_minute_reminder() {
        let mut manager = EditSessionManager::new();
        manager.start(&note(1, "Shop", Some("2024-01-01T09:00:30")));
        let draft = manager.draft().expect("active draft");
        assert_eq!(draft.title, "Shop");
        assert_eq!(draft.reminder_at, "2024-01-01T09:00");
        assert_eq!(draft.file, None);
    }

    #[test]
    fn test_start_replaces_previous_session() {
        let mut manager = EditSessionManager::new();
        manager.start(&note(1, "A", None));
        manager.set_title("A edited");
        manager.start(&note(2, "B", None));

        assert_eq!(manager.active_id(), Some(NoteId::new(2)));
        let draft = manager.draft().expect("active draft");
        assert_eq!(draft.title, "B");
        assert_eq!(draft.content, "B content");
    }

    #[test]
    fn test_setters_require_session() {
        let mut manager = EditSessionManager::new();
        assert!(!manager.set_title("x"));
        assert!(!manager.set_reminder(""));
        manager.start(&note(1, "A", None));
        assert!(manager.set_reminder("2024-02-01T10:00"));
        assert_eq!(
            manager.draft().map(|d| d.reminder_at.as_str()),
            Some("2024-02-01T10:00")
        );
    }

    #[test]
    fn test_cancel_clears_session() {
        let mut manager = EditSessionManager::new();
        manager.start(&note(1, "A", None));
        assert_eq!(manager.cancel(), Some(NoteId::new(1)));
        assert_eq!(manager.session(), &EditSession::Idle);
        assert_eq!(manager.cancel(), None);
    }

    #[test]
    fn test_untouched_reminder_keeps_seconds() {
        let mut manager = EditSessionManager::new();
        manager.start(&note(1, "Shop", Some("2024-01-01T09:00:30")));
        manager.set_title("Groceries");
        let update = manager.draft().expect("active draft").to_update();
        assert_eq!(update.reminder_at, "2024-01-01T09:00:30");

        manager.set_reminder("2024-01-01T10:15");
        let update = manager.draft().expect("active draft").to_update();
        assert_eq!(update.reminder_at, "2024-01-01T10:15");

        manager.set_reminder("");
        assert!(manager.draft().expect("active draft").to_update().clears_reminder());
    }

    #[test]
    fn test_update_draft_keeps_empty_reminder() {
        let draft = EditDraft::from_note(&note(1, "A", None));
        let update = draft.to_update();
        assert!(update.clears_reminder());
        assert_eq!(update.reminder_at, "");
    }
}
