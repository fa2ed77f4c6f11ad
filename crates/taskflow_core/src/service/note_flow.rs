//! Note submission and results review flow.
//!
//! # Responsibility
//! - Validate and submit note text, caching the processed result.
//! - Hold an editable draft of the extracted task proposals.
//! - Save the reviewed proposals and export calendar events.
//!
//! # Invariants
//! - Empty or whitespace-only text never reaches the backend.
//! - The received `NoteResult` is never mutated; edits apply to the draft.
//! - Every failure returns the flow to `Idle` (submit) or
//!   `ReadyForReview` (save) with the draft intact. A failed cache write
//!   after processing is reported, yet the draft stays reviewable.
//! - A saved note leaves the cache.
//!
//! State machine:
//! `Idle -> Submitting -> ReadyForReview -> Saving -> Saved`.

use crate::gateway::{RequestFailure, TaskGateway};
use crate::model::note::{NoteId, NoteResult, TaskProposal};
use crate::model::task::{DueDate, NewTask, Task};
use crate::model::validation::ValidationFailure;
use crate::repo::error::RepoError;
use crate::repo::note_result_repo::NoteResultCache;
use crate::service::calendar::{export_calendar_event, CalendarExportError};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Editable copy of a processed note's proposals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewDraft {
    note: NoteResult,
    proposals: Vec<TaskProposal>,
}

impl ReviewDraft {
    pub fn new(note: NoteResult) -> Self {
        let proposals = note.extracted_tasks.clone();
        Self { note, proposals }
    }

    pub fn note_id(&self) -> &NoteId {
        &self.note.note_id
    }

    /// The result as received from the backend.
    pub fn note(&self) -> &NoteResult {
        &self.note
    }

    pub fn summary(&self) -> &str {
        &self.note.summary
    }

    pub fn original_text(&self) -> &str {
        &self.note.original_text
    }

    pub fn proposals(&self) -> &[TaskProposal] {
        &self.proposals
    }

    fn proposal_mut(&mut self, local_id: Uuid) -> Result<&mut TaskProposal, NoteFlowError> {
        self.proposals
            .iter_mut()
            .find(|proposal| proposal.local_id == local_id)
            .ok_or(NoteFlowError::UnknownProposal(local_id))
    }

    fn payload(&self) -> Vec<NewTask> {
        self.proposals.iter().map(TaskProposal::to_new_task).collect()
    }
}

/// Tasks persisted by a successful save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedNote {
    pub note_id: NoteId,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NoteFlowState {
    #[default]
    Idle,
    Submitting,
    ReadyForReview(ReviewDraft),
    Saving(ReviewDraft),
    Saved(SavedNote),
}

impl NoteFlowState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Submitting => "submitting",
            Self::ReadyForReview(_) => "ready_for_review",
            Self::Saving(_) => "saving",
            Self::Saved(_) => "saved",
        }
    }
}

/// Note flow failure.
#[derive(Debug)]
pub enum NoteFlowError {
    Validation(ValidationFailure),
    Request(RequestFailure),
    Cache(RepoError),
    /// The results screen was opened for a note this client never cached.
    NoteNotCached(NoteId),
    UnknownProposal(Uuid),
    /// Operation not allowed in the current state.
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },
    Calendar(CalendarExportError),
}

impl Display for NoteFlowError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Request(err) => write!(f, "{err}"),
            Self::Cache(err) => write!(f, "{err}"),
            Self::NoteNotCached(note_id) => write!(f, "no processed note found for {note_id}"),
            Self::UnknownProposal(local_id) => write!(f, "unknown task proposal {local_id}"),
            Self::InvalidState { operation, state } => {
                write!(f, "cannot {operation} while {state}")
            }
            Self::Calendar(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NoteFlowError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Request(err) => Some(err),
            Self::Cache(err) => Some(err),
            Self::Calendar(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationFailure> for NoteFlowError {
    fn from(value: ValidationFailure) -> Self {
        Self::Validation(value)
    }
}

impl From<RequestFailure> for NoteFlowError {
    fn from(value: RequestFailure) -> Self {
        Self::Request(value)
    }
}

impl From<RepoError> for NoteFlowError {
    fn from(value: RepoError) -> Self {
        Self::Cache(value)
    }
}

impl From<CalendarExportError> for NoteFlowError {
    fn from(value: CalendarExportError) -> Self {
        match value {
            CalendarExportError::Request(err) => Self::Request(err),
            other => Self::Calendar(other),
        }
    }
}

/// Submission/review flow over a gateway and a note-result cache.
pub struct NoteFlow<G: TaskGateway, C: NoteResultCache> {
    gateway: G,
    cache: C,
    state: NoteFlowState,
}

impl<G: TaskGateway, C: NoteResultCache> NoteFlow<G, C> {
    pub fn new(gateway: G, cache: C) -> Self {
        Self {
            gateway,
            cache,
            state: NoteFlowState::Idle,
        }
    }

    pub fn state(&self) -> &NoteFlowState {
        &self.state
    }

    /// Draft under review, if any.
    pub fn draft(&self) -> Option<&ReviewDraft> {
        match &self.state {
            NoteFlowState::ReadyForReview(draft) | NoteFlowState::Saving(draft) => Some(draft),
            _ => None,
        }
    }

    /// Submits note text for processing; returns the new note id.
    ///
    /// Any previous draft is discarded once validation passes. When the
    /// processed note cannot be cached, `NoteFlowError::Cache` is returned
    /// but the draft is still held for review in this session.
    pub async fn submit(&mut self, text: &str) -> Result<NoteId, NoteFlowError> {
        if text.trim().is_empty() {
            return Err(ValidationFailure::EmptyNote.into());
        }

        info!(
            "event=note_submit module=note_flow status=start chars={}",
            text.chars().count()
        );
        self.state = NoteFlowState::Submitting;
        let note = match self.gateway.process_notes(text).await {
            Ok(note) => note,
            Err(err) => {
                error!(
                    "event=note_submit module=note_flow status=error error={}",
                    err
                );
                self.state = NoteFlowState::Idle;
                return Err(err.into());
            }
        };

        let cached = self.cache.put(&note);
        let note_id = note.note_id.clone();
        info!(
            "event=note_submit module=note_flow status=ok proposals={}",
            note.extracted_tasks.len()
        );
        self.state = NoteFlowState::ReadyForReview(ReviewDraft::new(note));
        match cached {
            Ok(()) => Ok(note_id),
            Err(err) => {
                warn!(
                    "event=note_cache_put module=note_flow status=error error={}",
                    err
                );
                Err(err.into())
            }
        }
    }

    /// Opens a previously processed note from the local cache.
    pub fn open_cached(&mut self, note_id: &NoteId) -> Result<&ReviewDraft, NoteFlowError> {
        let note = self
            .cache
            .get(note_id)?
            .ok_or_else(|| NoteFlowError::NoteNotCached(note_id.clone()))?;
        info!("event=note_open_cached module=note_flow status=ok");
        self.state = NoteFlowState::ReadyForReview(ReviewDraft::new(note));
        self.draft()
            .ok_or(NoteFlowError::InvalidState {
                operation: "open a cached note",
                state: "idle",
            })
    }

    pub fn edit_description(
        &mut self,
        local_id: Uuid,
        description: impl Into<String>,
    ) -> Result<(), NoteFlowError> {
        let proposal = self.reviewing("edit a task")?.proposal_mut(local_id)?;
        proposal.description = description.into();
        Ok(())
    }

    /// Sets or clears (`None` or blank) the due date of one proposal.
    pub fn edit_due_date(
        &mut self,
        local_id: Uuid,
        due_date: Option<&str>,
    ) -> Result<(), NoteFlowError> {
        let parsed = match due_date.map(str::trim).filter(|value| !value.is_empty()) {
            Some(value) => Some(DueDate::parse(value)?),
            None => None,
        };
        let proposal = self.reviewing("edit a task")?.proposal_mut(local_id)?;
        proposal.due_date = parsed;
        Ok(())
    }

    pub fn remove_proposal(&mut self, local_id: Uuid) -> Result<TaskProposal, NoteFlowError> {
        let draft = self.reviewing("remove a task")?;
        let index = draft
            .proposals
            .iter()
            .position(|proposal| proposal.local_id == local_id)
            .ok_or(NoteFlowError::UnknownProposal(local_id))?;
        Ok(draft.proposals.remove(index))
    }

    /// Saves the current proposals verbatim under the draft's note.
    pub async fn save(&mut self) -> Result<&SavedNote, NoteFlowError> {
        let draft = self.reviewing("save")?;
        if draft.proposals.is_empty() {
            return Err(ValidationFailure::NoTasks.into());
        }
        let note_id = draft.note_id().clone();
        let payload = draft.payload();

        self.state = match std::mem::take(&mut self.state) {
            NoteFlowState::ReadyForReview(draft) => NoteFlowState::Saving(draft),
            other => other,
        };
        info!(
            "event=note_save module=note_flow status=start count={}",
            payload.len()
        );

        match self.gateway.save_tasks(&note_id, &payload).await {
            Ok(tasks) => {
                info!(
                    "event=note_save module=note_flow status=ok count={}",
                    tasks.len()
                );
                // Saved notes no longer need the results screen.
                if let Err(err) = self.cache.remove(&note_id) {
                    warn!(
                        "event=note_cache_remove module=note_flow status=error error={}",
                        err
                    );
                }
                self.state = NoteFlowState::Saved(SavedNote { note_id, tasks });
                match &self.state {
                    NoteFlowState::Saved(saved) => Ok(saved),
                    other => Err(NoteFlowError::InvalidState {
                        operation: "save",
                        state: other.name(),
                    }),
                }
            }
            Err(err) => {
                error!("event=note_save module=note_flow status=error error={}", err);
                self.state = match std::mem::take(&mut self.state) {
                    NoteFlowState::Saving(draft) => NoteFlowState::ReadyForReview(draft),
                    other => other,
                };
                Err(err.into())
            }
        }
    }

    /// Downloads the calendar event of one proposal into `dir`.
    ///
    /// Proposals without a backend id use a `temp-` placeholder id.
    pub async fn download_calendar_event(
        &self,
        local_id: Uuid,
        dir: &Path,
    ) -> Result<PathBuf, NoteFlowError> {
        let proposal = self
            .draft()
            .ok_or(NoteFlowError::InvalidState {
                operation: "export a calendar event",
                state: self.state.name(),
            })?
            .proposals
            .iter()
            .find(|proposal| proposal.local_id == local_id)
            .ok_or(NoteFlowError::UnknownProposal(local_id))?;
        if proposal.due_date.is_none() {
            return Err(ValidationFailure::MissingDueDate.into());
        }
        let path = export_calendar_event(&self.gateway, &proposal.calendar_key(), dir).await?;
        Ok(path)
    }

    /// Abandons the current draft.
    pub fn reset(&mut self) {
        self.state = NoteFlowState::Idle;
    }

    fn reviewing(&mut self, operation: &'static str) -> Result<&mut ReviewDraft, NoteFlowError> {
        match &mut self.state {
            NoteFlowState::ReadyForReview(draft) => Ok(draft),
            other => Err(NoteFlowError::InvalidState {
                operation,
                state: other.name(),
            }),
        }
    }
}
