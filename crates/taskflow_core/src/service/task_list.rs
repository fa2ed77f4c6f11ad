//! Task list state for the dashboard and tasks views.
//!
//! # Responsibility
//! - Hold the canonical task collection and the optional per-note scope.
//! - Derive filtered views without network access.
//! - Apply status/importance/delete only after the backend confirmed them.
//!
//! # Invariants
//! - A failed backend call leaves every collection unchanged.
//! - `view()` is always a subset of the active base collection in its
//!   original order.
//! - Mutations on ids absent locally are no-ops after the backend call.
//! - Demo data is substituted only when `DemoFallback::WhenUnreachable` is
//!   set and the backend could not be reached.

use crate::config::DemoFallback;
use crate::gateway::demo::demo_tasks;
use crate::gateway::{GatewayResult, RequestFailure, TaskGateway};
use crate::model::note::{NoteId, NoteWithTasks};
use crate::model::task::{Task, TaskId, TaskStatus};
use crate::service::calendar::{export_calendar_event, CalendarExportError};
use crate::service::labels::note_tab_label;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Status filter applied to the base collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Open,
    Completed,
}

impl StatusFilter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Open => task.status == TaskStatus::Open,
            Self::Completed => task.status == TaskStatus::Completed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Open => "open",
            Self::Completed => "completed",
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "open" => Ok(Self::Open),
            "completed" | "done" => Ok(Self::Completed),
            other => Err(format!(
                "unknown filter `{other}`; expected all|open|completed"
            )),
        }
    }
}

/// Which collection `view()` derives from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NoteScope {
    #[default]
    All,
    Note(NoteId),
}

/// Origin of the canonical collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataMode {
    #[default]
    Live,
    Demo,
}

/// Outcome of a delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    Cancelled,
}

/// Confirmation step run before destructive actions.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F: Fn(&str) -> bool> Confirm for F {
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// One per-meeting tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteTab {
    pub note_id: NoteId,
    pub label: String,
    pub task_count: usize,
}

/// Task list failure.
#[derive(Debug)]
pub enum TaskListError {
    Request(RequestFailure),
    /// Toggle requested for an id not present locally.
    UnknownTask(TaskId),
    /// Calendar export requested for a task without due date.
    MissingDueDate(TaskId),
    Calendar(CalendarExportError),
}

impl Display for TaskListError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Request(err) => write!(f, "{err}"),
            Self::UnknownTask(task_id) => write!(f, "task not found: {task_id}"),
            Self::MissingDueDate(task_id) => write!(f, "task {task_id} has no due date"),
            Self::Calendar(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TaskListError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Request(err) => Some(err),
            Self::Calendar(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RequestFailure> for TaskListError {
    fn from(value: RequestFailure) -> Self {
        Self::Request(value)
    }
}

impl From<CalendarExportError> for TaskListError {
    fn from(value: CalendarExportError) -> Self {
        match value {
            CalendarExportError::Request(err) => Self::Request(err),
            other => Self::Calendar(other),
        }
    }
}

/// Resolves a task listing, substituting demo data when allowed.
pub(crate) fn resolve_listing(
    result: GatewayResult<Vec<Task>>,
    fallback: DemoFallback,
) -> GatewayResult<(Vec<Task>, DataMode)> {
    match result {
        Ok(tasks) => Ok((tasks, DataMode::Live)),
        Err(err) if err.is_unreachable() && fallback == DemoFallback::WhenUnreachable => {
            warn!(
                "event=task_list_load module=task_list status=demo_fallback error={}",
                err
            );
            Ok((demo_tasks(), DataMode::Demo))
        }
        Err(err) => Err(err),
    }
}

/// Client-side task list with confirm-then-apply mutations.
pub struct TaskListState<G: TaskGateway> {
    gateway: G,
    fallback: DemoFallback,
    tasks: Vec<Task>,
    notes: Vec<NoteWithTasks>,
    scoped: Option<(NoteId, Vec<Task>)>,
    filter: StatusFilter,
    mode: DataMode,
    last_error: Option<RequestFailure>,
}

impl<G: TaskGateway> TaskListState<G> {
    /// Creates an empty state; call `load` to populate it.
    pub fn new(gateway: G) -> Self {
        Self::with_fallback(gateway, DemoFallback::Disabled)
    }

    pub fn with_fallback(gateway: G, fallback: DemoFallback) -> Self {
        Self {
            gateway,
            fallback,
            tasks: Vec::new(),
            notes: Vec::new(),
            scoped: None,
            filter: StatusFilter::All,
            mode: DataMode::Live,
            last_error: None,
        }
    }

    /// Replaces the canonical collection with the backend's task list.
    pub async fn load(&mut self) -> Result<(), TaskListError> {
        info!("event=task_list_load module=task_list status=start");
        let result = self.gateway.list_tasks().await;
        let (tasks, mode) = self.track(resolve_listing(result, self.fallback))?;
        self.replace_tasks(tasks, mode);
        Ok(())
    }

    /// Loads tasks and notes-with-tasks concurrently; state changes only
    /// when both succeed.
    pub async fn load_with_notes(&mut self) -> Result<(), TaskListError> {
        info!("event=task_list_load_with_notes module=task_list status=start");
        let (tasks, notes) = tokio::join!(
            self.gateway.list_tasks(),
            self.gateway.list_notes_with_tasks()
        );
        let (tasks, mode) = self.track(resolve_listing(tasks, self.fallback))?;
        let notes = match notes {
            Ok(notes) => notes,
            Err(err) if mode == DataMode::Demo && err.is_unreachable() => Vec::new(),
            Err(err) => return Err(self.fail(err)),
        };
        self.notes = notes;
        self.replace_tasks(tasks, mode);
        Ok(())
    }

    pub fn filter_by(&mut self, filter: StatusFilter) {
        self.filter = filter;
    }

    pub fn filter(&self) -> StatusFilter {
        self.filter
    }

    /// Filtered view of the active base collection, order preserved.
    pub fn view(&self) -> Vec<&Task> {
        self.base()
            .iter()
            .filter(|task| self.filter.matches(task))
            .collect()
    }

    /// Canonical collection regardless of scope and filter.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn notes(&self) -> &[NoteWithTasks] {
        &self.notes
    }

    pub fn find(&self, task_id: &TaskId) -> Option<&Task> {
        self.tasks
            .iter()
            .chain(self.scoped.iter().flat_map(|(_, tasks)| tasks.iter()))
            .find(|task| &task.id == task_id)
    }

    pub fn mode(&self) -> DataMode {
        self.mode
    }

    pub fn last_error(&self) -> Option<&RequestFailure> {
        self.last_error.as_ref()
    }

    pub fn scope(&self) -> NoteScope {
        match &self.scoped {
            Some((note_id, _)) => NoteScope::Note(note_id.clone()),
            None => NoteScope::All,
        }
    }

    /// Switches the base collection. `Note` fetches that note's tasks; on
    /// failure the previous scope stays active.
    pub async fn scope_to(&mut self, scope: NoteScope) -> Result<(), TaskListError> {
        match scope {
            NoteScope::All => {
                self.scoped = None;
                Ok(())
            }
            NoteScope::Note(note_id) => {
                let result = self.gateway.list_tasks_for_note(&note_id).await;
                let tasks = self.track(result)?;
                info!(
                    "event=task_list_scope module=task_list status=ok count={}",
                    tasks.len()
                );
                self.scoped = Some((note_id, tasks));
                Ok(())
            }
        }
    }

    /// One tab per loaded note, in backend order.
    pub fn note_tabs(&self) -> Vec<NoteTab> {
        self.notes
            .iter()
            .map(|note| NoteTab {
                note_id: note.id.clone(),
                label: note_tab_label(&note.summary, &note.created_at),
                task_count: note.tasks.len(),
            })
            .collect()
    }

    /// Persists `status`, then applies it locally.
    pub async fn set_status(
        &mut self,
        task_id: &TaskId,
        status: TaskStatus,
    ) -> Result<(), TaskListError> {
        let result = self.gateway.update_status(task_id, status).await;
        self.track(result)?;
        self.patch(task_id, |task| task.status = status);
        Ok(())
    }

    /// Flips the local status of `task_id` and persists it; returns the new
    /// status.
    pub async fn toggle_status(&mut self, task_id: &TaskId) -> Result<TaskStatus, TaskListError> {
        let next = self
            .find(task_id)
            .map(|task| task.status.toggled())
            .ok_or_else(|| TaskListError::UnknownTask(task_id.clone()))?;
        self.set_status(task_id, next).await?;
        Ok(next)
    }

    /// Persists the importance flag, then applies it locally. A success
    /// response without payload still counts.
    pub async fn set_importance(
        &mut self,
        task_id: &TaskId,
        is_important: bool,
    ) -> Result<(), TaskListError> {
        let result = self.gateway.update_importance(task_id, is_important).await;
        self.track(result)?;
        self.patch(task_id, |task| task.is_important = is_important);
        Ok(())
    }

    pub async fn toggle_importance(&mut self, task_id: &TaskId) -> Result<bool, TaskListError> {
        let next = self
            .find(task_id)
            .map(|task| !task.is_important)
            .ok_or_else(|| TaskListError::UnknownTask(task_id.clone()))?;
        self.set_importance(task_id, next).await?;
        Ok(next)
    }

    /// Asks `confirm` first; deletes at the backend, then locally.
    pub async fn remove(
        &mut self,
        task_id: &TaskId,
        confirm: &dyn Confirm,
    ) -> Result<RemoveOutcome, TaskListError> {
        let prompt = match self.find(task_id) {
            Some(task) => format!("Delete task \"{}\"?", task.description),
            None => format!("Delete task {task_id}?"),
        };
        if !confirm.confirm(&prompt) {
            info!("event=task_remove module=task_list status=cancelled");
            return Ok(RemoveOutcome::Cancelled);
        }

        let result = self.gateway.delete_task(task_id).await;
        self.track(result)?;
        self.tasks.retain(|task| &task.id != task_id);
        if let Some((_, tasks)) = self.scoped.as_mut() {
            tasks.retain(|task| &task.id != task_id);
        }
        info!("event=task_remove module=task_list status=ok");
        Ok(RemoveOutcome::Removed)
    }

    /// Writes the task's calendar event into `dir`.
    ///
    /// Tasks known locally must carry a due date; unknown ids are passed
    /// through to the backend.
    pub async fn download_calendar_event(
        &mut self,
        task_id: &TaskId,
        dir: &Path,
    ) -> Result<PathBuf, TaskListError> {
        if let Some(task) = self.find(task_id) {
            if task.due_date.is_none() {
                return Err(TaskListError::MissingDueDate(task_id.clone()));
            }
        }
        match export_calendar_event(&self.gateway, task_id, dir).await {
            Ok(path) => Ok(path),
            Err(CalendarExportError::Request(err)) => Err(self.fail(err)),
            Err(other) => Err(other.into()),
        }
    }

    fn base(&self) -> &[Task] {
        match &self.scoped {
            Some((_, tasks)) => tasks,
            None => &self.tasks,
        }
    }

    fn replace_tasks(&mut self, tasks: Vec<Task>, mode: DataMode) {
        info!(
            "event=task_list_load module=task_list status=ok count={} mode={:?}",
            tasks.len(),
            mode
        );
        self.tasks = tasks;
        self.mode = mode;
    }

    fn patch(&mut self, task_id: &TaskId, apply: impl Fn(&mut Task)) {
        let scoped = self.scoped.iter_mut().flat_map(|(_, tasks)| tasks.iter_mut());
        let mut patched = 0usize;
        for task in self.tasks.iter_mut().chain(scoped) {
            if &task.id == task_id {
                apply(task);
                patched += 1;
            }
        }
        if patched == 0 {
            info!("event=task_patch module=task_list status=skipped reason=absent");
        }
    }

    /// Records the outcome of a backend call in `last_error`.
    fn track<T>(&mut self, result: GatewayResult<T>) -> Result<T, TaskListError> {
        match result {
            Ok(value) => {
                self.last_error = None;
                Ok(value)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    fn fail(&mut self, err: RequestFailure) -> TaskListError {
        error!(
            "event=task_list_request module=task_list status=error http_status={}",
            err.status
                .map_or_else(|| "none".to_string(), |status| status.to_string())
        );
        self.last_error = Some(err.clone());
        TaskListError::Request(err)
    }
}
