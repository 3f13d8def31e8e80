//! The note record and the payloads used to create and update it.

use crate::identity::{format_for_editing, timestamp_serde, NoteId, Timestamp};
use crate::{NoteError, NoteResult};
use serde::{Deserialize, Serialize};

/// A note as returned by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    #[serde(with = "timestamp_serde")]
    pub created_at: Timestamp,
    /// Path of the attachment relative to the store's base address.
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default, with = "timestamp_serde::option")]
    pub reminder_at: Option<Timestamp>,
}

impl Note {
    pub fn has_attachment(&self) -> bool {
        self.file_url.as_deref().is_some_and(|url| !url.is_empty())
    }

    /// Full URL of the attachment, resolved against `base_url`.
    pub fn attachment_url(&self, base_url: &str) -> Option<String> {
        let path = self.file_url.as_deref().filter(|url| !url.is_empty())?;
        if path.starts_with("http://") || path.starts_with("https://") {
            return Some(path.to_string());
        }
        let base = base_url.trim_end_matches('/');
        if path.starts_with('/') {
            Some(format!("{base}{path}"))
        } else {
            Some(format!("{base}/{path}"))
        }
    }

    /// True when a reminder is set and its instant has passed.
    pub fn is_due(&self, now: Timestamp) -> bool {
        self.reminder_at.is_some_and(|at| at <= now)
    }

    /// Reminder value seeded into an edit draft; empty when unset.
    pub fn reminder_for_editing(&self) -> String {
        self.reminder_at
            .as_ref()
            .map(format_for_editing)
            .unwrap_or_default()
    }
}

/// A file staged for upload alongside a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Fields for a new note.
///
/// A missing or empty reminder is left out of the request entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub file: Option<Attachment>,
    pub reminder_at: Option<String>,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            file: None,
            reminder_at: None,
        }
    }

    pub fn with_file(mut self, file: Attachment) -> Self {
        self.file = Some(file);
        self
    }

    pub fn with_reminder(mut self, reminder_at: impl Into<String>) -> Self {
        self.reminder_at = Some(reminder_at.into());
        self
    }

    /// Reminder value to submit, if any.
    pub fn reminder_field(&self) -> Option<&str> {
        self.reminder_at.as_deref().filter(|value| !value.is_empty())
    }

    /// Reject blank title or content before anything is sent.
    pub fn validate(&self) -> NoteResult<()> {
        if self.title.trim().is_empty() {
            return Err(NoteError::validation("title must not be empty"));
        }
        if self.content.trim().is_empty() {
            return Err(NoteError::validation("content must not be empty"));
        }
        Ok(())
    }
}

/// Full replacement fields for an existing note.
///
/// `reminder_at` is always submitted; an empty string clears the reminder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateDraft {
    pub title: String,
    pub content: String,
    pub file: Option<Attachment>,
    pub reminder_at: String,
}

impl UpdateDraft {
    pub fn clears_reminder(&self) -> bool {
        self.reminder_at.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::parse_timestamp;

    fn sample() -> Note {
        Note {
            id: NoteId::new(1),
            title: "Shop".to_string(),
            content: "milk".to_string(),
            created_at: parse_timestamp("2024-01-01T08:00:00").expect("timestamp"),
            file_url: Some("/uploads/list.txt".to_string()),
            reminder_at: parse_timestamp("2024-01-01T09:00"),
        }
    }

    #[test]
    fn test_deserialize_store_json() {
        let json = r#"{
            "id": 3,
            "title": "Work",
            "content": "report",
            "created_at": "2025-08-11T12:00:01.123456",
            "file_url": null,
            "reminder_at": "2025-08-11T14:30:00"
        }"#;
        let note: Note = serde_json::from_str(json).expect("note json");
        assert_eq!(note.id, NoteId::new(3));
        assert_eq!(note.file_url, None);
        assert_eq!(note.reminder_at, parse_timestamp("2025-08-11T14:30"));
    }

    #[test]
    fn test_deserialize_missing_optional_fields() {
        let json = r#"{"id": 4, "title": "a", "content": "b", "created_at": "2025-08-11T12:00:00"}"#;
        let note: Note = serde_json::from_str(json).expect("note json");
        assert_eq!(note.file_url, None);
        assert_eq!(note.reminder_at, None);
    }

    #[test]
    fn test_deserialize_rejects_bad_timestamp() {
        let json = r#"{"id": 4, "title": "a", "content": "b", "created_at": "yesterday"}"#;
        assert!(serde_json::from_str::<Note>(json).is_err());
    }

    #[test]
    fn test_attachment_url_resolution() {
        let note = sample();
        assert_eq!(
            note.attachment_url("http://localhost:8000/"),
            Some("http://localhost:8000/uploads/list.txt".to_string())
        );

        let mut bare = sample();
        bare.file_url = Some("uploads/list.txt".to_string());
        assert_eq!(
            bare.attachment_url("http://localhost:8000"),
            Some("http://localhost:8000/uploads/list.txt".to_string())
        );

        bare.file_url = None;
        assert!(!bare.has_attachment());
        assert_eq!(bare.attachment_url("http://localhost:8000"), None);
    }

    #[test]
    fn test_is_due_boundary() {
        let note = sample();
        let at = note.reminder_at.expect("reminder");
        assert!(note.is_due(at));
        assert!(!note.is_due(at - chrono::Duration::seconds(1)));
    }

    #[test]
    fn test_reminder_for_editing() {
        let mut note = sample();
        note.reminder_at = parse_timestamp("2024-01-01T09:00:45");
        assert_eq!(note.reminder_for_editing(), "2024-01-01T09:00");
        note.reminder_at = None;
        assert_eq!(note.reminder_for_editing(), "");
    }

    #[test]
    fn test_draft_validation() {
        assert!(NoteDraft::new("Shop", "milk").validate().is_ok());
        assert!(matches!(
            NoteDraft::new("   ", "milk").validate(),
            Err(NoteError::Validation { .. })
        ));
        assert!(matches!(
            NoteDraft::new("Shop", "\n").validate(),
            Err(NoteError::Validation { .. })
        ));
    }

    #[test]
    fn test_empty_reminder_is_omitted() {
        let draft = NoteDraft::new("Shop", "milk").with_reminder("");
        assert_eq!(draft.reminder_field(), None);
        let draft = draft.with_reminder("2024-01-01T09:00");
        assert_eq!(draft.reminder_field(), Some("2024-01-01T09:00"));
    }
}
