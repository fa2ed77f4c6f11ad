use reqwest::Url;
use serde_json::{json, Value};
use std::sync::Arc;
use taskflow_core::{
    DataMode, DemoFallback, HttpTaskGateway, NoteId, NoteScope, RemoveOutcome, StaticToken,
    StatusFilter, TaskId, TaskListError, TaskListState, TaskStatus,
};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gateway(uri: &str) -> HttpTaskGateway {
    HttpTaskGateway::new(Url::parse(uri).unwrap(), Arc::new(StaticToken::new("token-1"))).unwrap()
}

fn task_rows() -> Value {
    json!([
        { "id": "t1", "description": "Send deck", "due_date": "2025-06-01", "status": "open", "note_id": "n1" },
        { "id": "t2", "description": "Review budget", "status": "completed", "note_id": "n1" },
        { "id": "t3", "description": "Book room", "due_date": "2025-06-03", "status": "open", "is_important": true },
        { "id": "t4", "description": "Write minutes", "status": "completed" }
    ])
}

async fn mount_tasks(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v1/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_rows()))
        .mount(server)
        .await;
}

async fn loaded_state(server: &MockServer) -> TaskListState<HttpTaskGateway> {
    mount_tasks(server).await;
    let mut state = TaskListState::new(gateway(&server.uri()));
    state.load().await.unwrap();
    state
}

fn ids(state: &TaskListState<HttpTaskGateway>) -> Vec<String> {
    state
        .view()
        .iter()
        .map(|task| task.id.as_str().to_string())
        .collect()
}

#[tokio::test]
async fn filters_are_ordered_subsets_of_the_collection() {
    let server = MockServer::start().await;
    let mut state = loaded_state(&server).await;

    assert_eq!(ids(&state), ["t1", "t2", "t3", "t4"]);

    state.filter_by(StatusFilter::Open);
    assert_eq!(ids(&state), ["t1", "t3"]);

    state.filter_by(StatusFilter::Completed);
    assert_eq!(ids(&state), ["t2", "t4"]);
    assert!(state.view().iter().all(|task| task.is_completed()));

    state.filter_by(StatusFilter::All);
    assert_eq!(state.view().len(), state.tasks().len());
}

#[tokio::test]
async fn completing_a_task_moves_it_into_the_completed_view() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/tasks/t1/status"))
        .and(body_json(json!({ "status": "completed" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(
            { "id": "t1", "description": "Send deck", "status": "completed" }
        )))
        .expect(1)
        .mount(&server)
        .await;
    let mut state = loaded_state(&server).await;
    state.filter_by(StatusFilter::Completed);

    let status = state.toggle_status(&TaskId::new("t1")).await.unwrap();

    assert_eq!(status, TaskStatus::Completed);
    assert_eq!(ids(&state), ["t1", "t2", "t4"]);
}

#[tokio::test]
async fn toggling_twice_restores_the_original_status() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/tasks/t2/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(
            { "id": "t2", "description": "Review budget", "status": "open" }
        )))
        .expect(2)
        .mount(&server)
        .await;
    let mut state = loaded_state(&server).await;
    let before = state.tasks().to_vec();

    state.toggle_status(&TaskId::new("t2")).await.unwrap();
    state.toggle_status(&TaskId::new("t2")).await.unwrap();

    assert_eq!(state.tasks(), before.as_slice());
}

#[tokio::test]
async fn failed_update_leaves_the_collection_unchanged() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/tasks/t1/status"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "detail": "Error updating task" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/tasks/t1/importance"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    let mut state = loaded_state(&server).await;
    let before = state.tasks().to_vec();

    let err = state
        .set_status(&TaskId::new("t1"), TaskStatus::Completed)
        .await
        .unwrap_err();
    assert!(matches!(err, TaskListError::Request(ref failure) if failure.status == Some(500)));
    assert_eq!(state.last_error().unwrap().message, "Error updating task");

    assert!(state.toggle_importance(&TaskId::new("t1")).await.is_err());
    assert_eq!(state.tasks(), before.as_slice());
}

#[tokio::test]
async fn importance_applies_without_response_payload() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/tasks/t1/importance"))
        .and(body_json(json!({ "is_important": true })))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    let mut state = loaded_state(&server).await;

    assert!(state.toggle_importance(&TaskId::new("t1")).await.unwrap());
    assert!(state.find(&TaskId::new("t1")).unwrap().is_important);
}

#[tokio::test]
async fn unknown_ids_cannot_be_toggled() {
    let server = MockServer::start().await;
    let mut state = loaded_state(&server).await;

    let err = state.toggle_status(&TaskId::new("nope")).await.unwrap_err();
    assert!(matches!(err, TaskListError::UnknownTask(_)));
}

#[tokio::test]
async fn absent_id_status_update_is_a_local_no_op() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/tasks/elsewhere/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(
            { "id": "elsewhere", "description": "Other tab", "status": "completed" }
        )))
        .mount(&server)
        .await;
    let mut state = loaded_state(&server).await;
    let before = state.tasks().to_vec();

    state
        .set_status(&TaskId::new("elsewhere"), TaskStatus::Completed)
        .await
        .unwrap();
    assert_eq!(state.tasks(), before.as_slice());
}

#[tokio::test]
async fn remove_asks_first_and_drops_exactly_one_task() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/tasks/t3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;
    let mut state = loaded_state(&server).await;

    let declined = state
        .remove(&TaskId::new("t3"), &|_: &str| false)
        .await
        .unwrap();
    assert_eq!(declined, RemoveOutcome::Cancelled);
    assert_eq!(state.tasks().len(), 4);

    let prompt_seen = std::cell::RefCell::new(String::new());
    let accept = |prompt: &str| {
        prompt_seen.replace(prompt.to_string());
        true
    };
    let removed = state.remove(&TaskId::new("t3"), &accept).await.unwrap();

    assert_eq!(removed, RemoveOutcome::Removed);
    assert!(prompt_seen.borrow().contains("Book room"));
    assert_eq!(state.tasks().len(), 3);
    assert!(state.find(&TaskId::new("t3")).is_none());
}

#[tokio::test]
async fn removing_an_absent_id_leaves_the_collection_unchanged() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/tasks/zzz"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    let mut state = loaded_state(&server).await;
    let before = state.tasks().to_vec();

    let outcome = state
        .remove(&TaskId::new("zzz"), &|_: &str| true)
        .await
        .unwrap();

    assert_eq!(outcome, RemoveOutcome::Removed);
    assert_eq!(state.tasks(), before.as_slice());
}

#[tokio::test]
async fn failed_load_keeps_previous_tasks() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_rows()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tasks"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "detail": "Error retrieving tasks" })),
        )
        .mount(&server)
        .await;
    let mut state = TaskListState::new(gateway(&server.uri()));
    state.load().await.unwrap();

    assert!(state.load().await.is_err());
    assert_eq!(state.tasks().len(), 4);
    assert_eq!(state.last_error().unwrap().status, Some(500));
}

#[tokio::test]
async fn scoping_to_a_note_switches_the_base_collection() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tasks/by-note/n1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "t1", "description": "Send deck", "status": "open", "note_id": "n1" },
            { "id": "t2", "description": "Review budget", "status": "completed", "note_id": "n1" }
        ])))
        .expect(1)
        .mount(&server)
        .await;
    let mut state = loaded_state(&server).await;

    state
        .scope_to(NoteScope::Note(NoteId::new("n1")))
        .await
        .unwrap();
    state.filter_by(StatusFilter::Open);
    assert_eq!(ids(&state), ["t1"]);
    assert_eq!(state.scope(), NoteScope::Note(NoteId::new("n1")));

    state.scope_to(NoteScope::All).await.unwrap();
    assert_eq!(ids(&state), ["t1", "t3"]);
}

#[tokio::test]
async fn load_with_notes_builds_tabs() {
    let server = MockServer::start().await;
    mount_tasks(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tasks/notes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "n1", "summary": "# Weekly product sync with the design team\n- deck",
              "created_at": "2025-05-30T09:00:00Z",
              "tasks": [ { "id": "t1", "description": "Send deck", "status": "open" } ] },
            { "id": "n2", "summary": "", "created_at": "2025-05-31T09:00:00Z", "tasks": [] }
        ])))
        .mount(&server)
        .await;
    let mut state = TaskListState::new(gateway(&server.uri()));

    state.load_with_notes().await.unwrap();

    let tabs = state.note_tabs();
    assert_eq!(tabs.len(), 2);
    assert_eq!(tabs[0].label, "Weekly product sync with th...");
    assert_eq!(tabs[0].task_count, 1);
    assert_eq!(tabs[1].label, "2025-05-31");
    assert_eq!(state.tasks().len(), 4);
}

#[tokio::test]
async fn load_with_notes_changes_nothing_when_one_read_fails() {
    let server = MockServer::start().await;
    mount_tasks(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tasks/notes"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let mut state = TaskListState::new(gateway(&server.uri()));

    assert!(state.load_with_notes().await.is_err());
    assert!(state.tasks().is_empty());
    assert!(state.notes().is_empty());
}

#[tokio::test]
async fn demo_data_is_used_only_when_switched_on() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let uri = format!("http://127.0.0.1:{}", listener.local_addr().unwrap().port());
    drop(listener);

    let mut strict = TaskListState::new(gateway(&uri));
    assert!(strict.load().await.is_err());
    assert_eq!(strict.mode(), DataMode::Live);

    let mut demo = TaskListState::with_fallback(gateway(&uri), DemoFallback::WhenUnreachable);
    demo.load_with_notes().await.unwrap();
    assert_eq!(demo.mode(), DataMode::Demo);
    assert_eq!(demo.tasks().len(), 4);
    assert!(demo.notes().is_empty());
}
