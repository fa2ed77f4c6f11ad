//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record returned by the backend.
//! - Provide a validated calendar date type for due dates.
//!
//! # Invariants
//! - `status` is exactly one of `open` / `completed`.
//! - `is_important` is independent of `status`.
//! - `due_date`, when set, is a valid calendar date.

use crate::model::note::NoteId;
use crate::model::validation::ValidationFailure;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};

const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Opaque backend task identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Binary task lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Open,
    Completed,
}

impl TaskStatus {
    /// Returns the opposite status.
    pub fn toggled(self) -> Self {
        match self {
            Self::Open => Self::Completed,
            Self::Completed => Self::Open,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Completed => "completed",
        }
    }
}

impl Display for TaskStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Calendar date in `YYYY-MM-DD` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DueDate(NaiveDate);

impl DueDate {
    /// Parses a due date, accepting surrounding whitespace.
    ///
    /// A trailing time component (`2025-06-01T00:00:00`) is tolerated because
    /// some backends serialize dates as timestamps.
    pub fn parse(value: &str) -> Result<Self, ValidationFailure> {
        let trimmed = value.trim();
        let date_part = trimmed.split('T').next().unwrap_or(trimmed);
        NaiveDate::parse_from_str(date_part, DUE_DATE_FORMAT)
            .map(Self)
            .map_err(|_| ValidationFailure::InvalidDueDate(trimmed.to_string()))
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn date(self) -> NaiveDate {
        self.0
    }
}

impl Display for DueDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(DUE_DATE_FORMAT))
    }
}

impl Serialize for DueDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DueDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Persisted task as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub description: String,
    #[serde(default)]
    pub due_date: Option<DueDate>,
    pub status: TaskStatus,
    /// Missing on older backend responses; treated as not important.
    #[serde(default)]
    pub is_important: bool,
    #[serde(default)]
    pub note_id: Option<NoteId>,
    /// Server timestamp kept verbatim.
    #[serde(default)]
    pub created_at: String,
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Returns whether the task is still open and its due date is before `today`.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status == TaskStatus::Open
            && self.due_date.is_some_and(|due| due.date() < today)
    }
}

/// Save payload item for persisting an edited proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub description: String,
    pub due_date: Option<DueDate>,
}
