//! HTTP implementation of `TaskGateway` over `reqwest`.
//!
//! # Responsibility
//! - Build versioned backend URLs and JSON bodies.
//! - Attach the bearer token from the configured `TokenSource`.
//! - Map server error payloads (`{"detail": ...}`) into `RequestFailure`.
//!
//! # Invariants
//! - Log lines carry operation name, status and duration only; never note
//!   text, task content or tokens.

use crate::gateway::{GatewayResult, RequestFailure, TaskGateway, TokenSource};
use crate::model::note::{NoteId, NoteResult, NoteWithTasks};
use crate::model::task::{NewTask, Task, TaskId, TaskStatus};
use async_trait::async_trait;
use log::{error, info, warn};
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

const API_PREFIX: [&str; 2] = ["api", "v1"];

#[derive(Serialize)]
struct ProcessNoteBody<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct SaveTasksBody<'a> {
    tasks: &'a [NewTask],
}

#[derive(Serialize)]
struct StatusBody {
    status: TaskStatus,
}

#[derive(Serialize)]
struct ImportanceBody {
    is_important: bool,
}

/// `reqwest`-backed gateway for the versioned backend API.
#[derive(Clone)]
pub struct HttpTaskGateway {
    client: Client,
    base_url: Url,
    tokens: Arc<dyn TokenSource>,
}

impl HttpTaskGateway {
    /// Creates a gateway rooted at `base_url` (without the `/api/v1` prefix).
    pub fn new(base_url: Url, tokens: Arc<dyn TokenSource>) -> GatewayResult<Self> {
        if base_url.cannot_be_a_base() {
            return Err(RequestFailure::transport(format!(
                "api base url `{base_url}` cannot carry a path"
            )));
        }
        Ok(Self {
            client: Client::new(),
            base_url,
            tokens,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // `new` rejects cannot-be-a-base urls, so segments are always editable.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(API_PREFIX);
            path.extend(segments);
        }
        url
    }

    async fn send(&self, op: &'static str, request: RequestBuilder) -> GatewayResult<Response> {
        let started_at = Instant::now();
        let request = match self.tokens.access_token().await {
            Some(token) => request.bearer_auth(token),
            None => {
                warn!("event=api_request module=gateway status=unauthenticated op={op}");
                request
            }
        };

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                error!(
                    "event=api_request module=gateway status=error op={op} duration_ms={} error_code=transport error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(RequestFailure::transport(err.to_string()));
            }
        };

        let status = response.status();
        if status.is_success() {
            info!(
                "event=api_request module=gateway status=ok op={op} http_status={} duration_ms={}",
                status.as_u16(),
                started_at.elapsed().as_millis()
            );
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = server_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
        error!(
            "event=api_request module=gateway status=error op={op} http_status={} duration_ms={}",
            status.as_u16(),
            started_at.elapsed().as_millis()
        );
        Err(RequestFailure::http(status.as_u16(), message))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        op: &'static str,
        request: RequestBuilder,
    ) -> GatewayResult<T> {
        let response = self.send(op, request).await?;
        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| RequestFailure::transport(err.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|err| {
            error!("event=api_decode module=gateway status=error op={op} error={err}");
            RequestFailure::http(status, format!("unexpected response payload: {err}"))
        })
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        self.client.request(method, self.endpoint(segments))
    }
}

#[async_trait]
impl TaskGateway for HttpTaskGateway {
    async fn process_notes(&self, text: &str) -> GatewayResult<NoteResult> {
        let request = self
            .request(Method::POST, &["notes", "process"])
            .json(&ProcessNoteBody { text });
        self.send_json("process_notes", request).await
    }

    async fn save_tasks(&self, note_id: &NoteId, tasks: &[NewTask]) -> GatewayResult<Vec<Task>> {
        let request = self
            .request(Method::POST, &["notes", note_id.as_str(), "tasks"])
            .json(&SaveTasksBody { tasks });
        self.send_json("save_tasks", request).await
    }

    async fn list_tasks(&self) -> GatewayResult<Vec<Task>> {
        let request = self.request(Method::GET, &["tasks"]);
        self.send_json("list_tasks", request).await
    }

    async fn list_notes_with_tasks(&self) -> GatewayResult<Vec<NoteWithTasks>> {
        let request = self.request(Method::GET, &["tasks", "notes"]);
        self.send_json("list_notes_with_tasks", request).await
    }

    async fn list_tasks_for_note(&self, note_id: &NoteId) -> GatewayResult<Vec<Task>> {
        let request = self.request(Method::GET, &["tasks", "by-note", note_id.as_str()]);
        self.send_json("list_tasks_for_note", request).await
    }

    async fn update_status(&self, task_id: &TaskId, status: TaskStatus) -> GatewayResult<Task> {
        let request = self
            .request(Method::PUT, &["tasks", task_id.as_str(), "status"])
            .json(&StatusBody { status });
        self.send_json("update_status", request).await
    }

    async fn update_importance(
        &self,
        task_id: &TaskId,
        is_important: bool,
    ) -> GatewayResult<Option<Task>> {
        let request = self
            .request(Method::PUT, &["tasks", task_id.as_str(), "importance"])
            .json(&ImportanceBody { is_important });
        let response = self.send("update_importance", request).await?;
        // Success is the status code alone; the payload is optional.
        let body = response.bytes().await.unwrap_or_default();
        Ok(serde_json::from_slice::<Task>(&body).ok())
    }

    async fn delete_task(&self, task_id: &TaskId) -> GatewayResult<()> {
        let request = self.request(Method::DELETE, &["tasks", task_id.as_str()]);
        self.send("delete_task", request).await?;
        Ok(())
    }

    async fn fetch_calendar_event(&self, task_id: &TaskId) -> GatewayResult<Vec<u8>> {
        let request = self.request(
            Method::GET,
            &["tasks", task_id.as_str(), "calendar_event.ics"],
        );
        let response = self.send("fetch_calendar_event", request).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|err| RequestFailure::transport(err.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Extracts a human-readable message from an error body.
fn server_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::Object(map)) => {
            ["detail", "message", "error"]
                .iter()
                .find_map(|key| map.get(*key))
                .map(|value| match value {
                    serde_json::Value::String(text) => text.clone(),
                    other => other.to_string(),
                })
        }
        Ok(_) | Err(_) => Some(trimmed.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::{server_message, HttpTaskGateway};
    use crate::gateway::StaticToken;
    use reqwest::Url;
    use std::sync::Arc;

    #[test]
    fn server_message_prefers_detail_field() {
        assert_eq!(
            server_message(r#"{"detail":"Error retrieving tasks: boom"}"#).as_deref(),
            Some("Error retrieving tasks: boom")
        );
        assert_eq!(server_message("plain failure").as_deref(), Some("plain failure"));
        assert_eq!(server_message("   "), None);
    }

    #[test]
    fn server_message_renders_structured_detail() {
        let message = server_message(r#"{"detail":[{"msg":"field required"}]}"#).unwrap();
        assert!(message.contains("field required"));
    }

    #[test]
    fn endpoint_appends_versioned_prefix_and_escapes_ids() {
        let gateway = HttpTaskGateway::new(
            Url::parse("http://localhost:8000/").unwrap(),
            Arc::new(StaticToken::anonymous()),
        )
        .unwrap();
        let url = gateway.endpoint(&["tasks", "a b", "status"]);
        assert_eq!(url.as_str(), "http://localhost:8000/api/v1/tasks/a%20b/status");
    }

    #[test]
    fn rejects_non_hierarchical_base_url() {
        let result = HttpTaskGateway::new(
            Url::parse("mailto:ops@example.com").unwrap(),
            Arc::new(StaticToken::anonymous()),
        );
        assert!(result.is_err());
    }
}
