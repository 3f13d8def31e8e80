//! Fake HTTP note store.
//!
//! Serves the same routes and status codes as the real store so the REST
//! client can be tested end to end on a loopback port:
//!
//! - `GET /notes/` (optional `?q=`), `POST /notes/`
//! - `PUT /notes/:id`, `DELETE /notes/:id`
//! - `GET /uploads/:name`
//!
//! Validation failures answer 422 with a FastAPI-style `detail` list; unknown
//! ids answer 404 with a `detail` string.

use crate::fixtures;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use notebell_core::{filter_notes, parse_timestamp, Note, NoteId, Timestamp};
use serde_json::json;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A request as the server saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub path: String,
    /// Multipart text fields, plus `file` mapped to the uploaded file name.
    pub fields: HashMap<String, String>,
    pub query: Option<String>,
}

#[derive(Debug, Default)]
struct ServerState {
    notes: Mutex<Vec<Note>>,
    next_id: Mutex<i64>,
    uploads: Mutex<HashMap<String, Vec<u8>>>,
    requests: Mutex<Vec<RecordedRequest>>,
    fail_next: Mutex<Option<StatusCode>>,
}

type SharedState = Arc<ServerState>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct FakeNoteServer {
    addr: SocketAddr,
    state: SharedState,
    task: JoinHandle<()>,
}

impl FakeNoteServer {
    /// Bind an ephemeral loopback port and start serving.
    pub async fn start() -> std::io::Result<Self> {
        Self::with_notes(Vec::new()).await
    }

    pub async fn with_notes(notes: Vec<Note>) -> std::io::Result<Self> {
        let next_id = notes.iter().map(|n| n.id.as_i64()).max().unwrap_or(0) + 1;
        let state = Arc::new(ServerState {
            notes: Mutex::new(notes),
            next_id: Mutex::new(next_id),
            ..ServerState::default()
        });

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let app = router(Arc::clone(&state));
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self { addr, state, task })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn notes(&self) -> Vec<Note> {
        lock(&self.state.notes).clone()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state.requests).clone()
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        lock(&self.state.requests).last().cloned()
    }

    /// Answer the next request with `status` and a `detail` body.
    pub fn fail_next(&self, status: StatusCode) {
        *lock(&self.state.fail_next) = Some(status);
    }

    /// Make `bytes` downloadable at `/uploads/{name}`.
    pub fn put_upload(&self, name: &str, bytes: Vec<u8>) {
        lock(&self.state.uploads).insert(name.to_string(), bytes);
    }
}

impl Drop for FakeNoteServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn router(state: SharedState) -> Router {
    Router::new()
        .route("/notes/", get(list_notes).post(create_note))
        .route("/notes/:id", axum::routing::put(update_note).delete(delete_note))
        .route("/uploads/:name", get(download_upload))
        .with_state(state)
}

// ============================================================================
// HANDLERS
// ============================================================================

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn missing_fields(missing: &[&str]) -> Response {
    let detail: Vec<_> = missing
        .iter()
        .map(|field| json!({ "loc": ["body", field], "msg": "Field required", "type": "missing" }))
        .collect();
    (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "detail": detail }))).into_response()
}

fn record(state: &ServerState, request: RecordedRequest) -> Option<Response> {
    lock(&state.requests).push(request);
    lock(&state.fail_next)
        .take()
        .map(|status| detail(status, "injected failure"))
}

/// Collect text fields and store uploaded files.
async fn read_form(
    state: &ServerState,
    mut multipart: Multipart,
) -> Result<HashMap<String, String>, Response> {
    let mut fields = HashMap::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| detail(StatusCode::BAD_REQUEST, &format!("Invalid multipart field: {e}")))?
    {
        let name = field.name().map(|s| s.to_string()).unwrap_or_default();
        match field.file_name().map(|s| s.to_string()) {
            Some(file_name) => {
                let bytes = field.bytes().await.map_err(|e| {
                    detail(StatusCode::BAD_REQUEST, &format!("Invalid upload: {e}"))
                })?;
                lock(&state.uploads).insert(file_name.clone(), bytes.to_vec());
                fields.insert(name, file_name);
            }
            None => {
                let text = field.text().await.map_err(|e| {
                    detail(StatusCode::BAD_REQUEST, &format!("Invalid multipart field text: {e}"))
                })?;
                fields.insert(name, text);
            }
        }
    }
    Ok(fields)
}

fn reminder_from(fields: &HashMap<String, String>) -> Result<Option<Timestamp>, Response> {
    match fields.get("reminder_at").map(String::as_str) {
        None | Some("") => Ok(None),
        Some(raw) => parse_timestamp(raw).map(Some).ok_or_else(|| {
            detail(
                StatusCode::UNPROCESSABLE_ENTITY,
                &format!("Invalid reminder_at: {raw}"),
            )
        }),
    }
}

async fn list_notes(
    State(state): State<SharedState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let query = params.get("q").cloned();
    let recorded = RecordedRequest {
        method: "GET",
        path: "/notes/".to_string(),
        fields: HashMap::new(),
        query: query.clone(),
    };
    if let Some(failure) = record(&state, recorded) {
        return failure;
    }
    let notes = lock(&state.notes);
    let result = match query {
        Some(q) => filter_notes(&notes, &q),
        None => notes.clone(),
    };
    Json(result).into_response()
}

async fn create_note(State(state): State<SharedState>, multipart: Multipart) -> Response {
    let fields = match read_form(&state, multipart).await {
        Ok(fields) => fields,
        Err(response) => return response,
    };
    let recorded = RecordedRequest {
        method: "POST",
        path: "/notes/".to_string(),
        fields: fields.clone(),
        query: None,
    };
    if let Some(failure) = record(&state, recorded) {
        return failure;
    }

    let missing: Vec<&str> = ["title", "content"]
        .into_iter()
        .filter(|key| !fields.contains_key(*key))
        .collect();
    if !missing.is_empty() {
        return missing_fields(&missing);
    }
    let reminder_at = match reminder_from(&fields) {
        Ok(reminder_at) => reminder_at,
        Err(response) => return response,
    };

    let id = {
        let mut next_id = lock(&state.next_id);
        let id = *next_id;
        *next_id += 1;
        id
    };
    let note = Note {
        id: NoteId::new(id),
        title: fields.get("title").cloned().unwrap_or_default(),
        content: fields.get("content").cloned().unwrap_or_default(),
        created_at: fixtures::created_at(),
        file_url: fields.get("file").map(|name| format!("/uploads/{name}")),
        reminder_at,
    };
    lock(&state.notes).push(note.clone());
    Json(note).into_response()
}

async fn update_note(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Response {
    let fields = match read_form(&state, multipart).await {
        Ok(fields) => fields,
        Err(response) => return response,
    };
    let recorded = RecordedRequest {
        method: "PUT",
        path: format!("/notes/{id}"),
        fields: fields.clone(),
        query: None,
    };
    if let Some(failure) = record(&state, recorded) {
        return failure;
    }

    let reminder_at = match reminder_from(&fields) {
        Ok(reminder_at) => reminder_at,
        Err(response) => return response,
    };
    let mut notes = lock(&state.notes);
    let Some(note) = notes.iter_mut().find(|n| n.id == NoteId::new(id)) else {
        return detail(StatusCode::NOT_FOUND, "Note not found");
    };
    if let Some(title) = fields.get("title") {
        note.title = title.clone();
    }
    if let Some(content) = fields.get("content") {
        note.content = content.clone();
    }
    // Only an explicitly sent field changes the reminder.
    if fields.contains_key("reminder_at") {
        note.reminder_at = reminder_at;
    }
    if let Some(name) = fields.get("file") {
        note.file_url = Some(format!("/uploads/{name}"));
    }
    Json(note.clone()).into_response()
}

async fn delete_note(State(state): State<SharedState>, Path(id): Path<i64>) -> Response {
    let recorded = RecordedRequest {
        method: "DELETE",
        path: format!("/notes/{id}"),
        fields: HashMap::new(),
        query: None,
    };
    if let Some(failure) = record(&state, recorded) {
        return failure;
    }
    let mut notes = lock(&state.notes);
    match notes.iter().position(|n| n.id == NoteId::new(id)) {
        Some(index) => {
            notes.remove(index);
            StatusCode::NO_CONTENT.into_response()
        }
        None => detail(StatusCode::NOT_FOUND, "Note not found"),
    }
}

async fn download_upload(State(state): State<SharedState>, Path(name): Path<String>) -> Response {
    let recorded = RecordedRequest {
        method: "GET",
        path: format!("/uploads/{name}"),
        fields: HashMap::new(),
        query: None,
    };
    if let Some(failure) = record(&state, recorded) {
        return failure;
    }
    match lock(&state.uploads).get(&name) {
        Some(bytes) => bytes.clone().into_response(),
        None => detail(StatusCode::NOT_FOUND, "Not Found"),
    }
}
