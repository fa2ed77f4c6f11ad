//! Calendar event export.
//!
//! # Responsibility
//! - Fetch a task's `.ics` document and write it to a local directory.
//!
//! # Invariants
//! - File names are `TaskFlow_Event_<first 8 chars of id>.ics`.
//! - Nothing is written when the fetch fails.

use crate::gateway::{RequestFailure, TaskGateway};
use crate::model::task::TaskId;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const FILE_PREFIX: &str = "TaskFlow_Event_";
const ID_PREFIX_CHARS: usize = 8;

/// Calendar export failure.
#[derive(Debug)]
pub enum CalendarExportError {
    Request(RequestFailure),
    Write { path: PathBuf, source: std::io::Error },
}

impl Display for CalendarExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Request(err) => write!(f, "{err}"),
            Self::Write { path, source } => {
                write!(f, "cannot write `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for CalendarExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Request(err) => Some(err),
            Self::Write { source, .. } => Some(source),
        }
    }
}

impl From<RequestFailure> for CalendarExportError {
    fn from(value: RequestFailure) -> Self {
        Self::Request(value)
    }
}

/// File name used for a task's calendar event.
pub fn calendar_file_name(task_id: &TaskId) -> String {
    let prefix = task_id
        .as_str()
        .chars()
        .take(ID_PREFIX_CHARS)
        .collect::<String>();
    format!("{FILE_PREFIX}{prefix}.ics")
}

/// Downloads the calendar event for `task_id` into `dir`.
///
/// Returns the path of the written file.
pub async fn export_calendar_event<G: TaskGateway + ?Sized>(
    gateway: &G,
    task_id: &TaskId,
    dir: &Path,
) -> Result<PathBuf, CalendarExportError> {
    let bytes = gateway.fetch_calendar_event(task_id).await?;
    let path = dir.join(calendar_file_name(task_id));
    if let Err(source) = std::fs::write(&path, &bytes) {
        error!(
            "event=calendar_export module=calendar status=error error_code=write_failed error={}",
            source
        );
        return Err(CalendarExportError::Write { path, source });
    }
    info!(
        "event=calendar_export module=calendar status=ok bytes={}",
        bytes.len()
    );
    Ok(path)
}
