//! REST client for the remote note store.

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::repository::NoteRepository;
use async_trait::async_trait;
use notebell_core::{Attachment, Note, NoteDraft, NoteError, NoteId, NoteResult, UpdateDraft};
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response, StatusCode};
use std::time::Duration;

#[derive(Clone)]
pub struct RestNoteRepository {
    client: reqwest::Client,
    base_url: String,
}

impl RestNoteRepository {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let timeout = Duration::from_millis(config.request_timeout_ms);
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the attachment bytes, or `None` if the note has no attachment.
    pub async fn download_attachment(&self, note: &Note) -> NoteResult<Option<Vec<u8>>> {
        let Some(url) = note.attachment_url(&self.base_url) else {
            return Ok(None);
        };
        let response = self.send(self.client.get(url), Some(note.id)).await?;
        let bytes = response.bytes().await.map_err(transport_error)?;
        Ok(Some(bytes.to_vec()))
    }

    fn notes_url(&self) -> String {
        format!("{}/notes/", self.base_url)
    }

    fn note_url(&self, id: NoteId) -> String {
        format!("{}/notes/{}", self.base_url, id)
    }

    async fn send(&self, request: RequestBuilder, id: Option<NoteId>) -> NoteResult<Response> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, &body, id))
    }

    async fn parse_json<T: serde::de::DeserializeOwned>(response: Response) -> NoteResult<T> {
        let text = response.text().await.map_err(transport_error)?;
        serde_json::from_str(&text)
            .map_err(|err| NoteError::transport(format!("Unexpected response body: {err}")))
    }
}

#[async_trait]
impl NoteRepository for RestNoteRepository {
    async fn list(&self) -> NoteResult<Vec<Note>> {
        tracing::debug!(url = %self.notes_url(), "Listing notes");
        let response = self.send(self.client.get(self.notes_url()), None).await?;
        Self::parse_json(response).await
    }

    async fn search(&self, query: &str) -> NoteResult<Vec<Note>> {
        if query.is_empty() {
            return self.list().await;
        }
        let request = self.client.get(self.notes_url()).query(&[("q", query)]);
        let response = self.send(request, None).await?;
        Self::parse_json(response).await
    }

    async fn create(&self, draft: &NoteDraft) -> NoteResult<Note> {
        let form = create_form(draft)?;
        let request = self.client.post(self.notes_url()).multipart(form);
        let response = self.send(request, None).await?;
        let note: Note = Self::parse_json(response).await?;
        tracing::debug!(note_id = %note.id, "Created note");
        Ok(note)
    }

    async fn update(&self, id: NoteId, draft: &UpdateDraft) -> NoteResult<Note> {
        let form = update_form(draft)?;
        let request = self.client.put(self.note_url(id)).multipart(form);
        let response = self.send(request, Some(id)).await?;
        let note: Note = Self::parse_json(response).await?;
        tracing::debug!(note_id = %id, "Updated note");
        Ok(note)
    }

    async fn remove(&self, id: NoteId) -> NoteResult<()> {
        self.send(self.client.delete(self.note_url(id)), Some(id))
            .await?;
        tracing::debug!(note_id = %id, "Deleted note");
        Ok(())
    }

    fn attachment_url(&self, note: &Note) -> Option<String> {
        note.attachment_url(&self.base_url)
    }
}

fn create_form(draft: &NoteDraft) -> NoteResult<Form> {
    let mut form = Form::new()
        .text("title", draft.title.clone())
        .text("content", draft.content.clone());
    if let Some(file) = &draft.file {
        form = form.part("file", file_part(file)?);
    }
    if let Some(reminder_at) = draft.reminder_field() {
        form = form.text("reminder_at", reminder_at.to_string());
    }
    Ok(form)
}

fn update_form(draft: &UpdateDraft) -> NoteResult<Form> {
    let mut form = Form::new()
        .text("title", draft.title.clone())
        .text("content", draft.content.clone());
    if let Some(file) = &draft.file {
        form = form.part("file", file_part(file)?);
    }
    // Always sent: an empty value is how the store is told to clear it.
    Ok(form.text("reminder_at", draft.reminder_at.clone()))
}

fn file_part(file: &Attachment) -> NoteResult<Part> {
    let part = Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
    match &file.content_type {
        Some(content_type) => part.mime_str(content_type).map_err(|err| {
            NoteError::validation(format!("invalid content type {content_type}: {err}"))
        }),
        None => Ok(part),
    }
}

fn transport_error(err: reqwest::Error) -> NoteError {
    if err.is_timeout() {
        NoteError::transport(format!("request timed out: {err}"))
    } else {
        NoteError::transport(err.to_string())
    }
}

/// Map a non-success status to the note error taxonomy.
fn status_error(status: StatusCode, body: &str, id: Option<NoteId>) -> NoteError {
    match (status, id) {
        (StatusCode::NOT_FOUND, Some(id)) => NoteError::NotFound { id },
        (StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY, _) => NoteError::validation(
            error_detail(body).unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
        ),
        _ => NoteError::transport(format!("HTTP {}: {}", status.as_u16(), body)),
    }
}

/// Extract a readable reason from a `{"detail": ...}` error body.
///
/// `detail` is either a string or a list of `{"msg": ...}` entries.
fn error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(detail) => Some(detail.clone()),
        serde_json::Value::Array(entries) => {
            let messages: Vec<&str> = entries
                .iter()
                .filter_map(|entry| entry.get("msg").and_then(serde_json::Value::as_str))
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_requires_target_id() {
        assert_eq!(
            status_error(StatusCode::NOT_FOUND, "", Some(NoteId::new(3))),
            NoteError::NotFound {
                id: NoteId::new(3)
            }
        );
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, "", None),
            NoteError::Transport { .. }
        ));
    }

    #[test]
    fn test_validation_detail_string() {
        let err = status_error(
            StatusCode::BAD_REQUEST,
            r#"{"detail": "Invalid isoformat string"}"#,
            None,
        );
        assert_eq!(err, NoteError::validation("Invalid isoformat string"));
    }

    #[test]
    fn test_validation_detail_list() {
        let body = r#"{"detail": [{"loc": ["body", "title"], "msg": "Field required"},
                                  {"loc": ["body", "content"], "msg": "Field required"}]}"#;
        let err = status_error(StatusCode::UNPROCESSABLE_ENTITY, body, None);
        assert_eq!(err, NoteError::validation("Field required; Field required"));
    }

    #[test]
    fn test_validation_without_detail() {
        let err = status_error(StatusCode::UNPROCESSABLE_ENTITY, "not json", None);
        assert_eq!(err, NoteError::validation("HTTP 422"));
    }

    #[test]
    fn test_server_error_is_transport() {
        let err = status_error(StatusCode::INTERNAL_SERVER_ERROR, "boom", Some(NoteId::new(1)));
        assert_eq!(err, NoteError::transport("HTTP 500: boom"));
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let config = ClientConfig {
            api_base_url: "http://localhost:8000/".to_string(),
            ..ClientConfig::default()
        };
        let repo = RestNoteRepository::new(&config).expect("client builds");
        assert_eq!(repo.base_url(), "http://localhost:8000");
        assert_eq!(repo.note_url(NoteId::new(5)), "http://localhost:8000/notes/5");
    }
}
