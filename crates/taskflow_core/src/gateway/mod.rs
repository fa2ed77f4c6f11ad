//! Remote API gateway contracts.
//!
//! # Responsibility
//! - Define one async operation per backend capability.
//! - Normalize every non-2xx or transport failure into `RequestFailure`.
//!
//! # Invariants
//! - Every call attaches the current bearer token when one exists; a missing
//!   token never blocks the call.
//! - No retries and no timeout policy beyond the transport default.

pub mod demo;
pub mod http;

use crate::model::note::{NoteId, NoteResult, NoteWithTasks};
use crate::model::task::{NewTask, Task, TaskId, TaskStatus};
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type GatewayResult<T> = Result<T, RequestFailure>;

/// Failed backend request.
///
/// `status == None` means the request never produced an HTTP response
/// (connection refused, DNS failure, TLS error).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFailure {
    pub status: Option<u16>,
    pub message: String,
}

impl RequestFailure {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Returns whether the backend could not be reached at all.
    pub fn is_unreachable(&self) -> bool {
        self.status.is_none()
    }
}

impl Display for RequestFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "request failed with status {status}: {}", self.message),
            None => write!(f, "backend unreachable: {}", self.message),
        }
    }
}

impl Error for RequestFailure {}

/// Supplies the bearer token for outbound requests.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Option<String>;
}

/// Fixed token source, mainly for tests and scripted callers.
#[derive(Clone, Default)]
pub struct StaticToken(Option<String>);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    pub fn anonymous() -> Self {
        Self(None)
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Backend capabilities consumed by the client.
#[async_trait]
pub trait TaskGateway: Send + Sync {
    /// Submits note text for summarization and task extraction.
    async fn process_notes(&self, text: &str) -> GatewayResult<NoteResult>;
    /// Persists an edited task list under a processed note.
    async fn save_tasks(&self, note_id: &NoteId, tasks: &[NewTask]) -> GatewayResult<Vec<Task>>;
    /// Lists all tasks of the current user.
    async fn list_tasks(&self) -> GatewayResult<Vec<Task>>;
    /// Lists notes that have tasks, with those tasks attached.
    async fn list_notes_with_tasks(&self) -> GatewayResult<Vec<NoteWithTasks>>;
    /// Lists tasks belonging to one note.
    async fn list_tasks_for_note(&self, note_id: &NoteId) -> GatewayResult<Vec<Task>>;
    async fn update_status(&self, task_id: &TaskId, status: TaskStatus) -> GatewayResult<Task>;
    /// Any 2xx response counts as success; the body may be empty.
    async fn update_importance(
        &self,
        task_id: &TaskId,
        is_important: bool,
    ) -> GatewayResult<Option<Task>>;
    async fn delete_task(&self, task_id: &TaskId) -> GatewayResult<()>;
    /// Returns the raw `.ics` document bytes.
    async fn fetch_calendar_event(&self, task_id: &TaskId) -> GatewayResult<Vec<u8>>;
}

/// Lets several state objects share one gateway.
#[async_trait]
impl<T: TaskGateway + ?Sized> TaskGateway for Arc<T> {
    async fn process_notes(&self, text: &str) -> GatewayResult<NoteResult> {
        (**self).process_notes(text).await
    }

    async fn save_tasks(&self, note_id: &NoteId, tasks: &[NewTask]) -> GatewayResult<Vec<Task>> {
        (**self).save_tasks(note_id, tasks).await
    }

    async fn list_tasks(&self) -> GatewayResult<Vec<Task>> {
        (**self).list_tasks().await
    }

    async fn list_notes_with_tasks(&self) -> GatewayResult<Vec<NoteWithTasks>> {
        (**self).list_notes_with_tasks().await
    }

    async fn list_tasks_for_note(&self, note_id: &NoteId) -> GatewayResult<Vec<Task>> {
        (**self).list_tasks_for_note(note_id).await
    }

    async fn update_status(&self, task_id: &TaskId, status: TaskStatus) -> GatewayResult<Task> {
        (**self).update_status(task_id, status).await
    }

    async fn update_importance(
        &self,
        task_id: &TaskId,
        is_important: bool,
    ) -> GatewayResult<Option<Task>> {
        (**self).update_importance(task_id, is_important).await
    }

    async fn delete_task(&self, task_id: &TaskId) -> GatewayResult<()> {
        (**self).delete_task(task_id).await
    }

    async fn fetch_calendar_event(&self, task_id: &TaskId) -> GatewayResult<Vec<u8>> {
        (**self).fetch_calendar_event(task_id).await
    }
}
