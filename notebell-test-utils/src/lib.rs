//! notebell Test Utilities
//!
//! Shared test infrastructure for the notebell workspace:
//! - In-memory note repository with failure injection
//! - Recording notification channel and a manual clock
//! - A fake HTTP note server for exercising the REST client
//! - Proptest generators and fixtures

pub mod server;

pub use axum::http::StatusCode;
pub use server::{FakeNoteServer, RecordedRequest};

pub use notebell_core::{
    filter_notes, parse_timestamp, Attachment, Note, NoteDraft, NoteError, NoteId, NoteResult,
    Timestamp, UpdateDraft,
};

use async_trait::async_trait;
use notebell_client::clock::Clock;
use notebell_client::notifications::{
    DeliveryError, NotificationChannel, Permission, ReminderNotification,
};
use notebell_client::repository::NoteRepository;
use std::sync::{Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ============================================================================
// IN-MEMORY REPOSITORY
// ============================================================================

/// Number of calls made to each repository operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub list: usize,
    pub search: usize,
    pub create: usize,
    pub update: usize,
    pub remove: usize,
}

#[derive(Debug)]
struct RepositoryState {
    notes: Vec<Note>,
    next_id: i64,
    fail_next: Option<NoteError>,
    calls: CallCounts,
}

/// Note store kept in memory, behaving like the remote one.
///
/// Ids are assigned sequentially, attachments land under `/uploads/`, and
/// every created note gets [`fixtures::CREATED_AT`] as its creation time.
#[derive(Debug)]
pub struct InMemoryNoteRepository {
    state: Mutex<RepositoryState>,
}

impl Default for InMemoryNoteRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryNoteRepository {
    pub fn new() -> Self {
        Self::with_notes(Vec::new())
    }

    pub fn with_notes(notes: Vec<Note>) -> Self {
        let next_id = notes.iter().map(|n| n.id.as_i64()).max().unwrap_or(0) + 1;
        Self {
            state: Mutex::new(RepositoryState {
                notes,
                next_id,
                fail_next: None,
                calls: CallCounts::default(),
            }),
        }
    }

    /// Make the next call fail with `error`.
    pub fn fail_next(&self, error: NoteError) {
        lock(&self.state).fail_next = Some(error);
    }

    pub fn notes(&self) -> Vec<Note> {
        lock(&self.state).notes.clone()
    }

    pub fn calls(&self) -> CallCounts {
        lock(&self.state).calls
    }

    /// Delete a note behind the client's back, as another client would.
    pub fn delete_remotely(&self, id: NoteId) -> Option<Note> {
        let mut state = lock(&self.state);
        let index = state.notes.iter().position(|n| n.id == id)?;
        Some(state.notes.remove(index))
    }

    fn take_failure(state: &mut RepositoryState) -> NoteResult<()> {
        match state.fail_next.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn parse_reminder(raw: &str) -> NoteResult<Option<Timestamp>> {
    if raw.is_empty() {
        return Ok(None);
    }
    parse_timestamp(raw)
        .map(Some)
        .ok_or_else(|| NoteError::validation(format!("invalid reminder_at: {raw}")))
}

fn upload_url(file: &Attachment) -> String {
    format!("/uploads/{}", file.file_name)
}

#[async_trait]
impl NoteRepository for InMemoryNoteRepository {
    async fn list(&self) -> NoteResult<Vec<Note>> {
        let mut state = lock(&self.state);
        state.calls.list += 1;
        Self::take_failure(&mut state)?;
        Ok(state.notes.clone())
    }

    async fn search(&self, query: &str) -> NoteResult<Vec<Note>> {
        let mut state = lock(&self.state);
        state.calls.search += 1;
        Self::take_failure(&mut state)?;
        Ok(filter_notes(&state.notes, query))
    }

    async fn create(&self, draft: &NoteDraft) -> NoteResult<Note> {
        let mut state = lock(&self.state);
        state.calls.create += 1;
        Self::take_failure(&mut state)?;
        draft.validate()?;
        let reminder_at = parse_reminder(draft.reminder_field().unwrap_or_default())?;

        let note = Note {
            id: NoteId::new(state.next_id),
            title: draft.title.clone(),
            content: draft.content.clone(),
            created_at: fixtures::created_at(),
            file_url: draft.file.as_ref().map(upload_url),
            reminder_at,
        };
        state.next_id += 1;
        state.notes.push(note.clone());
        Ok(note)
    }

    async fn update(&self, id: NoteId, draft: &UpdateDraft) -> NoteResult<Note> {
        let mut state = lock(&self.state);
        state.calls.update += 1;
        Self::take_failure(&mut state)?;
        let reminder_at = parse_reminder(&draft.reminder_at)?;
        let note = state
            .notes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or(NoteError::NotFound { id })?;

        note.title = draft.title.clone();
        note.content = draft.content.clone();
        note.reminder_at = reminder_at;
        if let Some(file) = &draft.file {
            note.file_url = Some(upload_url(file));
        }
        Ok(note.clone())
    }

    async fn remove(&self, id: NoteId) -> NoteResult<()> {
        let mut state = lock(&self.state);
        state.calls.remove += 1;
        Self::take_failure(&mut state)?;
        let index = state
            .notes
            .iter()
            .position(|n| n.id == id)
            .ok_or(NoteError::NotFound { id })?;
        state.notes.remove(index);
        Ok(())
    }
}

// ============================================================================
// NOTIFICATION CHANNEL
// ============================================================================

/// Channel that keeps every delivered notification for inspection.
#[derive(Debug)]
pub struct RecordingChannel {
    permission: Mutex<Permission>,
    /// Permission handed out by `request_permission`.
    on_request: Permission,
    deliveries: Mutex<Vec<ReminderNotification>>,
    failures: Mutex<usize>,
}

impl RecordingChannel {
    pub fn new(permission: Permission, on_request: Permission) -> Self {
        Self {
            permission: Mutex::new(permission),
            on_request,
            deliveries: Mutex::new(Vec::new()),
            failures: Mutex::new(0),
        }
    }

    pub fn granted() -> Self {
        Self::new(Permission::Granted, Permission::Granted)
    }

    pub fn denied() -> Self {
        Self::new(Permission::Denied, Permission::Denied)
    }

    /// Not asked yet; a request grants it.
    pub fn undecided() -> Self {
        Self::new(Permission::Default, Permission::Granted)
    }

    pub fn set_permission(&self, permission: Permission) {
        *lock(&self.permission) = permission;
    }

    /// Fail the next `count` deliveries.
    pub fn fail_next(&self, count: usize) {
        *lock(&self.failures) = count;
    }

    pub fn deliveries(&self) -> Vec<ReminderNotification> {
        lock(&self.deliveries).clone()
    }

    pub fn delivery_count(&self) -> usize {
        lock(&self.deliveries).len()
    }
}

impl NotificationChannel for RecordingChannel {
    fn permission(&self) -> Permission {
        *lock(&self.permission)
    }

    fn request_permission(&self) -> Permission {
        let mut permission = lock(&self.permission);
        if *permission == Permission::Default {
            *permission = self.on_request;
        }
        *permission
    }

    fn deliver(&self, notification: &ReminderNotification) -> Result<(), DeliveryError> {
        if !self.permission().is_granted() {
            return Err(DeliveryError::PermissionDenied);
        }
        let mut failures = lock(&self.failures);
        if *failures > 0 {
            *failures -= 1;
            return Err(DeliveryError::Failed("injected failure".to_string()));
        }
        lock(&self.deliveries).push(notification.clone());
        Ok(())
    }
}

// ============================================================================
// CLOCK
// ============================================================================

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Timestamp>,
}

impl ManualClock {
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: Timestamp) {
        *lock(&self.now) = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = lock(&self.now);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *lock(&self.now)
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for notes and queries.

    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    /// Minute offsets from 2024-01-01T00:00 spanning about a month.
    pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        (0i64..60 * 24 * 31).prop_map(|minutes| {
            NaiveDate::from_ymd_opt(2024, 1, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .unwrap_or_default()
                + chrono::Duration::minutes(minutes)
        })
    }

    /// Short mixed-case words so queries hit often.
    pub fn arb_text() -> impl Strategy<Value = String> {
        "[a-zA-Z]{1,6}( [a-zA-Z]{1,6}){0,2}"
    }

    pub fn arb_query() -> impl Strategy<Value = String> {
        prop_oneof![Just(String::new()), "[a-zA-Z]{1,3}"]
    }

    pub fn arb_note(id: i64) -> impl Strategy<Value = Note> {
        (
            arb_text(),
            arb_text(),
            arb_timestamp(),
            proptest::option::of(arb_timestamp()),
        )
            .prop_map(move |(title, content, created_at, reminder_at)| Note {
                id: NoteId::new(id),
                title,
                content,
                created_at,
                file_url: None,
                reminder_at,
            })
    }

    /// Notes with ids `1..=n`, unique by construction.
    pub fn arb_notes(max: usize) -> impl Strategy<Value = Vec<Note>> {
        proptest::collection::vec(arb_note(0), 0..=max).prop_map(|notes| {
            notes
                .into_iter()
                .enumerate()
                .map(|(index, mut note)| {
                    note.id = NoteId::new(index as i64 + 1);
                    note
                })
                .collect()
        })
    }

    /// Ids drawn from a small range so duplicates are common.
    pub fn arb_colliding_ids(max: usize) -> impl Strategy<Value = Vec<NoteId>> {
        proptest::collection::vec((1i64..8).prop_map(NoteId::new), 0..=max)
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Fixed notes and timestamps for scenario tests.

    use super::*;

    pub const CREATED_AT: &str = "2024-01-01T08:00:00";

    /// Parse a fixture timestamp; panics on typos.
    #[track_caller]
    pub fn ts(raw: &str) -> Timestamp {
        parse_timestamp(raw).unwrap_or_else(|| panic!("bad fixture timestamp {raw:?}"))
    }

    pub fn created_at() -> Timestamp {
        ts(CREATED_AT)
    }

    pub fn note(id: i64, title: &str, content: &str) -> Note {
        Note {
            id: NoteId::new(id),
            title: title.to_string(),
            content: content.to_string(),
            created_at: created_at(),
            file_url: None,
            reminder_at: None,
        }
    }

    pub fn note_with_reminder(id: i64, title: &str, content: &str, reminder_at: &str) -> Note {
        Note {
            reminder_at: Some(ts(reminder_at)),
            ..note(id, title, content)
        }
    }

    /// `{1, "Shop", "milk", reminder 2024-01-01T09:00}`.
    pub fn shop_note() -> Note {
        note_with_reminder(1, "Shop", "milk", "2024-01-01T09:00")
    }

    /// `{2, "Work", "report"}`, no reminder.
    pub fn work_note() -> Note {
        note(2, "Work", "report")
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions over the note error taxonomy.

    use super::*;

    #[track_caller]
    pub fn assert_validation<T: std::fmt::Debug>(result: &NoteResult<T>) {
        match result {
            Err(NoteError::Validation { .. }) => {}
            other => panic!("Expected Validation error, got: {:?}", other),
        }
    }

    #[track_caller]
    pub fn assert_not_found<T: std::fmt::Debug>(result: &NoteResult<T>, expected: NoteId) {
        match result {
            Err(NoteError::NotFound { id }) => {
                assert_eq!(*id, expected, "Wrong id in NotFound error");
            }
            other => panic!("Expected NotFound error for {}, got: {:?}", expected, other),
        }
    }

    #[track_caller]
    pub fn assert_transport<T: std::fmt::Debug>(result: &NoteResult<T>) {
        match result {
            Err(NoteError::Transport { .. }) => {}
            other => panic!("Expected Transport error, got: {:?}", other),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
