//! Local validation failures raised before any network call.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Input rejected client-side; never reaches the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationFailure {
    /// Note text is empty or whitespace-only.
    EmptyNote,
    /// Due date is not a `YYYY-MM-DD` calendar date.
    InvalidDueDate(String),
    /// Sign-up password and confirmation differ.
    PasswordMismatch,
    /// Email or password left blank on an auth form.
    MissingCredentials,
    /// Save requested with no task proposals left.
    NoTasks,
    /// Calendar export requested for a task without due date.
    MissingDueDate,
}

impl Display for ValidationFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyNote => write!(f, "note text must not be empty"),
            Self::InvalidDueDate(value) => {
                write!(f, "invalid due date `{value}`; expected YYYY-MM-DD")
            }
            Self::PasswordMismatch => write!(f, "Passwords do not match"),
            Self::MissingCredentials => write!(f, "email and password are required"),
            Self::NoTasks => write!(f, "there are no tasks to save"),
            Self::MissingDueDate => write!(f, "task has no due date"),
        }
    }
}

impl Error for ValidationFailure {}
