//! The contract between the client and a note store.

use async_trait::async_trait;
use notebell_core::{Attachment, Note, NoteDraft, NoteId, NoteResult, UpdateDraft};
use std::path::Path;

/// Create/read/update/delete access to the remote note store.
///
/// Implementations return canonical notes as the store sees them; callers
/// apply those to the local collection only after the call resolves.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Fetch the full collection.
    async fn list(&self) -> NoteResult<Vec<Note>>;

    /// Notes whose title or content contains `query`, matched by the store.
    async fn search(&self, query: &str) -> NoteResult<Vec<Note>>;

    async fn create(&self, draft: &NoteDraft) -> NoteResult<Note>;

    /// Replace every editable field of the note. An empty reminder clears it.
    async fn update(&self, id: NoteId, draft: &UpdateDraft) -> NoteResult<Note>;

    /// Delete the note. Fails with `NotFound` if it was already gone.
    async fn remove(&self, id: NoteId) -> NoteResult<()>;

    /// Resolvable location of the note's attachment.
    fn attachment_url(&self, note: &Note) -> Option<String> {
        note.file_url.clone()
    }
}

/// Read a file from disk into an [`Attachment`] named after the file.
pub async fn read_attachment(path: &Path) -> std::io::Result<Attachment> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment".to_string());
    Ok(Attachment::new(file_name, bytes))
}
