//! Application facade.
//!
//! `NotesApp` is where user intents enter. Every mutating method takes
//! `&mut self`, awaits the repository, and only then applies the canonical
//! result to the shared store, so two mutations never interleave.
//!
//! The app shares the notification ledger with the schedulers it builds. A
//! committed edit that moves or clears a reminder, or a deletion, resets the
//! note's entry so the next reminder it gets fires even if it lands on the
//! instant that already fired.

use crate::api_client::RestNoteRepository;
use crate::clock::Clock;
use crate::config::ClientConfig;
use crate::edit_session::{CommitOutcome, EditSessionManager};
use crate::error::ClientError;
use crate::notifications::{channel_from_config, NotificationChannel, Permission};
use crate::persistence::{self, PersistenceError, Preferences};
use crate::repository::NoteRepository;
use crate::scheduler::{ReminderScheduler, SchedulerConfig, SchedulerHandle, SharedLedger};
use crate::store::SharedNoteStore;
use notebell_core::{FilteredView, Note, NoteDraft, NoteError, NoteId, NoteResult};
use std::path::PathBuf;
use std::sync::Arc;

pub struct NotesApp {
    repository: Arc<dyn NoteRepository>,
    store: SharedNoteStore,
    edit: EditSessionManager,
    view: FilteredView,
    ledger: SharedLedger,
    channel: Arc<dyn NotificationChannel>,
    preferences: Preferences,
    preferences_path: Option<PathBuf>,
}

impl NotesApp {
    /// App with default preferences that are never written to disk.
    pub fn new(
        repository: Arc<dyn NoteRepository>,
        channel: Arc<dyn NotificationChannel>,
    ) -> Self {
        Self {
            repository,
            store: SharedNoteStore::new(),
            edit: EditSessionManager::new(),
            view: FilteredView::new(),
            ledger: SharedLedger::new(),
            channel,
            preferences: Preferences::default(),
            preferences_path: None,
        }
    }

    /// Use `preferences`, saving changes to `path` when one is given.
    pub fn with_preferences(mut self, preferences: Preferences, path: Option<PathBuf>) -> Self {
        self.preferences = preferences;
        self.preferences_path = path;
        self
    }

    /// REST repository, configured channel, and preferences from disk.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let repository = RestNoteRepository::new(config)?;
        let channel = channel_from_config(&config.notifications);
        let preferences = persistence::load_or_default(&config.preferences_path);
        Ok(Self::new(Arc::new(repository), channel)
            .with_preferences(preferences, Some(config.preferences_path.clone())))
    }

    pub fn store(&self) -> &SharedNoteStore {
        &self.store
    }

    pub fn repository(&self) -> &Arc<dyn NoteRepository> {
        &self.repository
    }

    pub fn ledger(&self) -> &SharedLedger {
        &self.ledger
    }

    /// Replace the local collection with the store's. Returns the note count.
    pub async fn load(&mut self) -> NoteResult<usize> {
        let notes = self.repository.list().await?;
        self.store.replace_all(notes).await;
        let count = self.store.len().await;
        tracing::info!(count, "Loaded notes");
        Ok(count)
    }

    pub async fn add_note(&mut self, draft: NoteDraft) -> NoteResult<Note> {
        draft.validate()?;
        let note = self.repository.create(&draft).await?;
        self.store.insert(note.clone()).await;
        tracing::info!(note_id = %note.id, "Note added");
        Ok(note)
    }

    /// Delete a note. A note the store no longer has counts as deleted.
    pub async fn delete_note(&mut self, id: NoteId) -> NoteResult<()> {
        match self.repository.remove(id).await {
            Ok(()) => {}
            Err(NoteError::NotFound { .. }) => {
                tracing::debug!(note_id = %id, "Note already deleted remotely");
            }
            Err(err) => {
                tracing::warn!(note_id = %id, error = %err, "Delete failed");
                return Err(err);
            }
        }
        self.store.remove_by_id(id).await;
        self.ledger.forget(id).await;
        if self.edit.active_id() == Some(id) {
            self.edit.cancel();
        }
        tracing::info!(note_id = %id, "Note deleted");
        Ok(())
    }

    pub async fn start_edit(&mut self, id: NoteId) -> NoteResult<()> {
        let note = self.store.get(id).await.ok_or(NoteError::NotFound { id })?;
        self.edit.start(&note);
        Ok(())
    }

    pub fn edit_session(&self) -> &EditSessionManager {
        &self.edit
    }

    pub fn edit_session_mut(&mut self) -> &mut EditSessionManager {
        &mut self.edit
    }

    pub async fn commit_edit(&mut self) -> NoteResult<CommitOutcome> {
        let previous = match self.edit.active_id() {
            Some(id) => self.store.get(id).await.map(|note| note.reminder_at),
            None => None,
        };
        let outcome = self
            .edit
            .commit(self.repository.as_ref(), &self.store)
            .await?;
        match &outcome {
            CommitOutcome::Saved(note) if previous != Some(note.reminder_at) => {
                if self.ledger.forget(note.id).await.is_some() {
                    tracing::debug!(note_id = %note.id, "Reminder changed, notification re-armed");
                }
            }
            CommitOutcome::Saved(_) => {}
            CommitOutcome::Removed(id) => {
                self.ledger.forget(*id).await;
            }
        }
        Ok(outcome)
    }

    pub fn cancel_edit(&mut self) -> Option<NoteId> {
        self.edit.cancel()
    }

    pub fn search_query(&self) -> &str {
        self.view.query()
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.view.set_query(query);
    }

    /// Local collection filtered by the current query.
    pub async fn visible_notes(&mut self) -> Vec<Note> {
        let store = self.store.read().await;
        self.view.refresh(&store).to_vec()
    }

    pub fn view(&self) -> &FilteredView {
        &self.view
    }

    /// Ask the store itself to search. The local collection is untouched.
    pub async fn remote_search(&self, query: &str) -> NoteResult<Vec<Note>> {
        self.repository.search(query).await
    }

    pub fn notification_permission(&self) -> Permission {
        self.channel.permission()
    }

    /// Request permission if it has not been asked for yet.
    pub fn request_notification_permission(&self) -> Permission {
        match self.channel.permission() {
            Permission::Default => {
                let permission = self.channel.request_permission();
                tracing::info!(?permission, "Notification permission requested");
                permission
            }
            permission => permission,
        }
    }

    /// Scheduler over this app's collection, channel, and ledger.
    pub fn scheduler(&self, clock: Arc<dyn Clock>, config: SchedulerConfig) -> ReminderScheduler {
        ReminderScheduler::new(self.store.clone(), Arc::clone(&self.channel), clock, config)
            .with_ledger(self.ledger.clone())
    }

    pub fn spawn_scheduler(&self, clock: Arc<dyn Clock>, config: SchedulerConfig) -> SchedulerHandle {
        self.scheduler(clock, config).spawn()
    }

    pub fn attachment_url(&self, note: &Note) -> Option<String> {
        self.repository.attachment_url(note)
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn dark_mode(&self) -> bool {
        self.preferences.dark_mode
    }

    /// Flip dark mode and save it. Returns the new value.
    pub fn toggle_dark_mode(&mut self) -> Result<bool, PersistenceError> {
        self.preferences.dark_mode = !self.preferences.dark_mode;
        if let Some(path) = &self.preferences_path {
            persistence::save(path, &self.preferences)?;
        }
        Ok(self.preferences.dark_mode)
    }
}
