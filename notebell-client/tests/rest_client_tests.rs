use notebell_client::api_client::RestNoteRepository;
use notebell_client::config::ClientConfig;
use notebell_client::repository::{read_attachment, NoteRepository};
use notebell_core::{Attachment, NoteDraft, NoteError, NoteId, UpdateDraft};
use notebell_test_utils::assertions::{assert_not_found, assert_transport, assert_validation};
use notebell_test_utils::fixtures::{shop_note, ts, work_note};
use notebell_test_utils::{FakeNoteServer, StatusCode};

async fn server_and_client(notes: Vec<notebell_core::Note>) -> (FakeNoteServer, RestNoteRepository) {
    let server = FakeNoteServer::with_notes(notes).await.expect("server binds");
    let config = ClientConfig {
        api_base_url: format!("{}/", server.base_url()),
        request_timeout_ms: 2_000,
        ..ClientConfig::default()
    };
    let client = RestNoteRepository::new(&config).expect("client builds");
    (server, client)
}

fn update(title: &str, content: &str, reminder_at: &str) -> UpdateDraft {
    UpdateDraft {
        title: title.to_string(),
        content: content.to_string(),
        file: None,
        reminder_at: reminder_at.to_string(),
    }
}

#[tokio::test]
async fn test_list_decodes_notes() {
    let (_server, client) = server_and_client(vec![shop_note(), work_note()]).await;
    let notes = client.list().await.expect("list");
    assert_eq!(notes, vec![shop_note(), work_note()]);
}

#[tokio::test]
async fn test_search_sends_query() {
    let (server, client) = server_and_client(vec![shop_note(), work_note()]).await;
    let notes = client.search("MILK").await.expect("search");
    assert_eq!(notes, vec![shop_note()]);
    assert_eq!(
        server.last_request().and_then(|r| r.query),
        Some("MILK".to_string())
    );

    client.search("").await.expect("empty search lists");
    assert_eq!(server.last_request().and_then(|r| r.query), None);
}

#[tokio::test]
async fn test_create_omits_empty_optional_fields() {
    let (server, client) = server_and_client(Vec::new()).await;
    let note = client
        .create(&NoteDraft::new("Plan", "trip").with_reminder(""))
        .await
        .expect("create");
    assert_eq!(note.id, NoteId::new(1));
    assert_eq!(note.reminder_at, None);

    let request = server.last_request().expect("recorded");
    assert_eq!(request.method, "POST");
    assert!(!request.fields.contains_key("reminder_at"));
    assert!(!request.fields.contains_key("file"));
    assert_eq!(server.notes(), vec![note]);
}

#[tokio::test]
async fn test_create_with_reminder_and_file() {
    let (server, client) = server_and_client(Vec::new()).await;
    let draft = NoteDraft::new("Scan", "receipt")
        .with_reminder("2024-05-01T12:30")
        .with_file(Attachment::new("receipt.txt", b"total: 12".to_vec()).with_content_type("text/plain"));
    let note = client.create(&draft).await.expect("create");

    assert_eq!(note.reminder_at, Some(ts("2024-05-01T12:30")));
    assert_eq!(note.file_url.as_deref(), Some("/uploads/receipt.txt"));
    assert_eq!(
        client.attachment_url(&note),
        Some(format!("{}/uploads/receipt.txt", server.base_url()))
    );

    let bytes = client.download_attachment(&note).await.expect("download");
    assert_eq!(bytes, Some(b"total: 12".to_vec()));
}

#[tokio::test]
async fn test_update_always_sends_reminder_field() {
    let (server, client) = server_and_client(vec![shop_note()]).await;
    let note = client
        .update(NoteId::new(1), &update("Shop", "milk", ""))
        .await
        .expect("update");
    assert_eq!(note.reminder_at, None);

    let request = server.last_request().expect("recorded");
    assert_eq!(request.method, "PUT");
    assert_eq!(request.path, "/notes/1");
    assert_eq!(request.fields.get("reminder_at").map(String::as_str), Some(""));
}

#[tokio::test]
async fn test_update_missing_note_is_not_found() {
    let (_server, client) = server_and_client(Vec::new()).await;
    let result = client.update(NoteId::new(7), &update("a", "b", "")).await;
    assert_not_found(&result, NoteId::new(7));
}

#[tokio::test]
async fn test_remove_then_remove_again() {
    let (server, client) = server_and_client(vec![shop_note(), work_note()]).await;
    client.remove(NoteId::new(1)).await.expect("delete");
    assert_eq!(server.notes(), vec![work_note()]);
    assert_not_found(&client.remove(NoteId::new(1)).await, NoteId::new(1));
}

#[tokio::test]
async fn test_unprocessable_entity_maps_to_validation() {
    let (server, client) = server_and_client(Vec::new()).await;
    server.fail_next(StatusCode::UNPROCESSABLE_ENTITY);
    let result = client.create(&NoteDraft::new("a", "b")).await;
    assert_eq!(result, Err(NoteError::validation("injected failure")));
}

#[tokio::test]
async fn test_invalid_reminder_rejected_by_server() {
    let (_server, client) = server_and_client(Vec::new()).await;
    let result = client
        .create(&NoteDraft::new("a", "b").with_reminder("tomorrow"))
        .await;
    assert_validation(&result);
}

#[tokio::test]
async fn test_server_error_maps_to_transport() {
    let (server, client) = server_and_client(vec![shop_note()]).await;
    server.fail_next(StatusCode::INTERNAL_SERVER_ERROR);
    assert_transport(&client.list().await);

    server.fail_next(StatusCode::INTERNAL_SERVER_ERROR);
    assert_transport(&client.remove(NoteId::new(1)).await);
    assert_eq!(server.notes(), vec![shop_note()]);
}

#[tokio::test]
async fn test_unreachable_store_maps_to_transport() {
    let server = FakeNoteServer::start().await.expect("server binds");
    let config = ClientConfig {
        api_base_url: server.base_url(),
        request_timeout_ms: 1_000,
        ..ClientConfig::default()
    };
    drop(server);
    let client = RestNoteRepository::new(&config).expect("client builds");
    assert_transport(&client.list().await);
}

#[tokio::test]
async fn test_read_attachment_uses_file_name() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("photo.jpg");
    std::fs::write(&path, [0xff, 0xd8]).expect("write");

    let attachment = read_attachment(&path).await.expect("read");
    assert_eq!(attachment.file_name, "photo.jpg");
    assert_eq!(attachment.bytes, vec![0xff, 0xd8]);
    assert_eq!(attachment.content_type, None);
}
