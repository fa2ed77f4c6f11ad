//! Meeting note processing results and task proposals.
//!
//! # Responsibility
//! - Model the backend's note-processing response.
//! - Carry editable, not-yet-persisted task proposals.
//!
//! # Invariants
//! - A `NoteResult` is never mutated after it is received; edits happen on
//!   copies of its proposals.
//! - `TaskProposal::local_id` is client-only and never serialized.

use crate::model::task::{DueDate, NewTask, Task, TaskId};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque backend note identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for NoteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NoteId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Extracted task candidate attached to a processed note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskProposal {
    /// Stable handle for local edits; regenerated on every deserialize.
    #[serde(skip, default = "Uuid::new_v4")]
    pub local_id: Uuid,
    /// Present only when the backend already assigned an id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TaskId>,
    pub description: String,
    #[serde(default)]
    pub due_date: Option<DueDate>,
}

impl TaskProposal {
    pub fn new(description: impl Into<String>, due_date: Option<DueDate>) -> Self {
        Self {
            local_id: Uuid::new_v4(),
            id: None,
            description: description.into(),
            due_date,
        }
    }

    /// Identifier used for calendar export: the persisted id or a
    /// `temp-` placeholder derived from `local_id`.
    pub fn calendar_key(&self) -> TaskId {
        match &self.id {
            Some(id) => id.clone(),
            None => TaskId::new(format!("temp-{}", self.local_id.simple())),
        }
    }

    pub fn to_new_task(&self) -> NewTask {
        NewTask {
            description: self.description.clone(),
            due_date: self.due_date,
        }
    }
}

/// Response of the note-processing call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteResult {
    pub note_id: NoteId,
    #[serde(default)]
    pub original_text: String,
    pub summary: String,
    #[serde(default)]
    pub extracted_tasks: Vec<TaskProposal>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Note summary with its persisted tasks, used for per-meeting tabs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteWithTasks {
    #[serde(alias = "note_id")]
    pub id: NoteId,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
}
