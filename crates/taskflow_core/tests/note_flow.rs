use reqwest::Url;
use serde_json::{json, Value};
use std::sync::Arc;
use taskflow_core::db::open_db_in_memory;
use taskflow_core::{
    DueDate, HttpTaskGateway, NoteFlow, NoteFlowError, NoteFlowState, NoteId, NoteResult,
    NoteResultCache, RepoError, SqliteNoteResultCache, StaticToken, ValidationFailure,
};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gateway(server: &MockServer) -> HttpTaskGateway {
    HttpTaskGateway::new(
        Url::parse(&server.uri()).unwrap(),
        Arc::new(StaticToken::new("token-1")),
    )
    .unwrap()
}

fn processed_note() -> Value {
    json!({
        "note_id": "n1",
        "original_text": "Alice to send deck by 2025-06-01",
        "summary": "## Sync\nDeck review",
        "extracted_tasks": [
            { "description": "Alice: send deck", "due_date": "2025-06-01" }
        ],
        "created_at": "2025-05-30T09:00:00Z"
    })
}

async fn mount_process(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/v1/notes/process"))
        .respond_with(ResponseTemplate::new(200).set_body_json(processed_note()))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn blank_notes_never_reach_the_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/notes/process"))
        .respond_with(ResponseTemplate::new(200).set_body_json(processed_note()))
        .expect(0)
        .mount(&server)
        .await;
    let conn = open_db_in_memory().unwrap();
    let mut flow = NoteFlow::new(gateway(&server), SqliteNoteResultCache::new(&conn));

    for text in ["", "   ", "\n\t "] {
        let err = flow.submit(text).await.unwrap_err();
        assert!(matches!(
            err,
            NoteFlowError::Validation(ValidationFailure::EmptyNote)
        ));
        assert_eq!(flow.state(), &NoteFlowState::Idle);
    }
}

#[tokio::test]
async fn submit_edit_save_persists_the_edited_task() {
    let server = MockServer::start().await;
    mount_process(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/notes/n1/tasks"))
        .and(body_json(json!({
            "tasks": [ { "description": "Alice: send deck", "due_date": "2025-06-02" } ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "t1", "description": "Alice: send deck", "due_date": "2025-06-02",
              "status": "open", "note_id": "n1" }
        ])))
        .expect(1)
        .mount(&server)
        .await;
    let conn = open_db_in_memory().unwrap();
    let mut flow = NoteFlow::new(gateway(&server), SqliteNoteResultCache::new(&conn));

    let note_id = flow
        .submit("Alice to send deck by 2025-06-01")
        .await
        .unwrap();
    assert_eq!(note_id, NoteId::new("n1"));

    let local_id = {
        let draft = flow.draft().unwrap();
        assert_eq!(draft.summary(), "## Sync\nDeck review");
        assert_eq!(draft.proposals().len(), 1);
        draft.proposals()[0].local_id
    };
    flow.edit_due_date(local_id, Some("2025-06-02")).unwrap();
    assert_eq!(
        flow.draft().unwrap().note().extracted_tasks[0].due_date,
        Some(DueDate::parse("2025-06-01").unwrap())
    );

    let saved = flow.save().await.unwrap();
    assert_eq!(saved.note_id, NoteId::new("n1"));
    assert_eq!(saved.tasks.len(), 1);
    assert_eq!(
        saved.tasks[0].due_date,
        Some(DueDate::parse("2025-06-02").unwrap())
    );
    assert!(matches!(flow.state(), NoteFlowState::Saved(_)));
    drop(flow);
    assert_eq!(SqliteNoteResultCache::new(&conn).len().unwrap(), 0);
}

#[tokio::test]
async fn full_cache_is_reported_but_the_draft_stays_reviewable() {
    let server = MockServer::start().await;
    mount_process(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/notes/n1/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "t1", "description": "Alice: send deck", "status": "open", "note_id": "n1" }
        ])))
        .expect(1)
        .mount(&server)
        .await;
    let conn = open_db_in_memory().unwrap();
    let older = NoteResult {
        note_id: NoteId::new("older"),
        original_text: "earlier meeting".to_string(),
        summary: "Earlier".to_string(),
        extracted_tasks: Vec::new(),
        created_at: None,
    };
    SqliteNoteResultCache::with_capacity(&conn, 1)
        .put(&older)
        .unwrap();
    let mut flow = NoteFlow::new(
        gateway(&server),
        SqliteNoteResultCache::with_capacity(&conn, 1),
    );

    let err = flow.submit("Alice to send deck").await.unwrap_err();

    assert!(matches!(
        err,
        NoteFlowError::Cache(RepoError::CacheFull { capacity: 1 })
    ));
    assert_eq!(flow.draft().unwrap().note_id(), &NoteId::new("n1"));
    assert!(matches!(
        flow.open_cached(&NoteId::new("n1")).unwrap_err(),
        NoteFlowError::NoteNotCached(_)
    ));

    assert_eq!(flow.save().await.unwrap().tasks.len(), 1);

    let cache = SqliteNoteResultCache::with_capacity(&conn, 1);
    assert_eq!(cache.clear().unwrap(), 1);
    cache.put(&older).unwrap();
}

#[tokio::test]
async fn processed_notes_are_cached_for_the_results_screen() {
    let server = MockServer::start().await;
    mount_process(&server).await;
    let conn = open_db_in_memory().unwrap();

    {
        let mut flow = NoteFlow::new(gateway(&server), SqliteNoteResultCache::new(&conn));
        flow.submit("Alice to send deck").await.unwrap();
    }

    let cache = SqliteNoteResultCache::new(&conn);
    assert_eq!(cache.len().unwrap(), 1);

    let mut results = NoteFlow::new(gateway(&server), SqliteNoteResultCache::new(&conn));
    let draft = results.open_cached(&NoteId::new("n1")).unwrap();
    assert_eq!(draft.original_text(), "Alice to send deck by 2025-06-01");
    assert_eq!(draft.proposals()[0].description, "Alice: send deck");

    let err = results.open_cached(&NoteId::new("other")).unwrap_err();
    assert!(matches!(err, NoteFlowError::NoteNotCached(_)));
}

#[tokio::test]
async fn failed_submit_returns_to_idle() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/notes/process"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "detail": "Error processing notes" })),
        )
        .mount(&server)
        .await;
    let conn = open_db_in_memory().unwrap();
    let mut flow = NoteFlow::new(gateway(&server), SqliteNoteResultCache::new(&conn));

    let err = flow.submit("Some notes").await.unwrap_err();
    assert!(err.to_string().contains("Error processing notes"));
    assert_eq!(flow.state(), &NoteFlowState::Idle);
}

#[tokio::test]
async fn failed_save_keeps_the_edited_draft() {
    let server = MockServer::start().await;
    mount_process(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/notes/n1/tasks"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let conn = open_db_in_memory().unwrap();
    let mut flow = NoteFlow::new(gateway(&server), SqliteNoteResultCache::new(&conn));
    flow.submit("notes").await.unwrap();
    let local_id = flow.draft().unwrap().proposals()[0].local_id;
    flow.edit_description(local_id, "Send the final deck").unwrap();

    assert!(matches!(
        flow.save().await.unwrap_err(),
        NoteFlowError::Request(_)
    ));

    let draft = flow.draft().unwrap();
    assert!(matches!(flow.state(), NoteFlowState::ReadyForReview(_)));
    assert_eq!(draft.proposals()[0].description, "Send the final deck");
}

#[tokio::test]
async fn saving_requires_at_least_one_task() {
    let server = MockServer::start().await;
    mount_process(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/notes/n1/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;
    let conn = open_db_in_memory().unwrap();
    let mut flow = NoteFlow::new(gateway(&server), SqliteNoteResultCache::new(&conn));
    flow.submit("notes").await.unwrap();
    let local_id = flow.draft().unwrap().proposals()[0].local_id;

    flow.remove_proposal(local_id).unwrap();
    let err = flow.save().await.unwrap_err();

    assert!(matches!(
        err,
        NoteFlowError::Validation(ValidationFailure::NoTasks)
    ));
    assert!(matches!(flow.state(), NoteFlowState::ReadyForReview(_)));
}

#[tokio::test]
async fn invalid_due_dates_are_rejected_locally() {
    let server = MockServer::start().await;
    mount_process(&server).await;
    let conn = open_db_in_memory().unwrap();
    let mut flow = NoteFlow::new(gateway(&server), SqliteNoteResultCache::new(&conn));
    flow.submit("notes").await.unwrap();
    let local_id = flow.draft().unwrap().proposals()[0].local_id;

    let err = flow.edit_due_date(local_id, Some("2025-02-30")).unwrap_err();
    assert!(matches!(
        err,
        NoteFlowError::Validation(ValidationFailure::InvalidDueDate(_))
    ));

    flow.edit_due_date(local_id, None).unwrap();
    assert_eq!(flow.draft().unwrap().proposals()[0].due_date, None);
}

#[tokio::test]
async fn calendar_export_uses_a_placeholder_id_before_saving() {
    let server = MockServer::start().await;
    mount_process(&server).await;
    let conn = open_db_in_memory().unwrap();
    let mut flow = NoteFlow::new(gateway(&server), SqliteNoteResultCache::new(&conn));
    flow.submit("notes").await.unwrap();
    let proposal = flow.draft().unwrap().proposals()[0].clone();
    let key = proposal.calendar_key();
    assert!(key.as_str().starts_with("temp-"));

    Mock::given(method("GET"))
        .and(path(format!("/api/v1/tasks/{key}/calendar_event.ics")))
        .respond_with(ResponseTemplate::new(200).set_body_string("BEGIN:VCALENDAR\r\n"))
        .expect(1)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();

    let written = flow
        .download_calendar_event(proposal.local_id, dir.path())
        .await
        .unwrap();

    assert_eq!(
        written.file_name().unwrap().to_str().unwrap(),
        "TaskFlow_Event_temp-xxx.ics".replace("xxx", &key.as_str()[5..8])
    );
    assert_eq!(std::fs::read(&written).unwrap(), b"BEGIN:VCALENDAR\r\n");

    flow.edit_due_date(proposal.local_id, None).unwrap();
    let err = flow
        .download_calendar_event(proposal.local_id, dir.path())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        NoteFlowError::Validation(ValidationFailure::MissingDueDate)
    ));
}

#[tokio::test]
async fn edits_outside_review_are_rejected() {
    let server = MockServer::start().await;
    let conn = open_db_in_memory().unwrap();
    let mut flow = NoteFlow::new(gateway(&server), SqliteNoteResultCache::new(&conn));

    let err = flow
        .edit_description(uuid::Uuid::new_v4(), "anything")
        .unwrap_err();
    assert!(matches!(err, NoteFlowError::InvalidState { .. }));
    assert!(matches!(
        flow.save().await.unwrap_err(),
        NoteFlowError::InvalidState { .. }
    ));
}
