//! Core client logic for TaskFlow.
//! This crate owns every client-side invariant; the shell only renders.

pub mod config;
pub mod db;
pub mod gateway;
pub mod logging;
pub mod model;
pub mod repo;
pub mod routes;
pub mod service;
pub mod session;

pub use config::{ClientConfig, ConfigError, DemoFallback};
pub use gateway::http::HttpTaskGateway;
pub use gateway::{GatewayResult, RequestFailure, StaticToken, TaskGateway, TokenSource};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::note::{NoteId, NoteResult, NoteWithTasks, TaskProposal};
pub use model::session::{Identity, Session, SessionEvent};
pub use model::task::{DueDate, NewTask, Task, TaskId, TaskStatus};
pub use model::validation::ValidationFailure;
pub use repo::error::{RepoError, RepoResult};
pub use repo::note_result_repo::{NoteResultCache, SqliteNoteResultCache};
pub use repo::session_repo::{SessionRepository, SqliteSessionRepository};
pub use routes::{guard, RouteDecision};
pub use service::digest::{due_today, DailyDigest};
pub use service::note_flow::{NoteFlow, NoteFlowError, NoteFlowState, ReviewDraft, SavedNote};
pub use service::task_list::{
    Confirm, DataMode, NoteScope, NoteTab, RemoveOutcome, StatusFilter, TaskListError,
    TaskListState,
};
pub use session::{
    AuthFailure, IdentityProvider, SessionStore, SignUpOutcome, SupabaseAuthProvider,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
