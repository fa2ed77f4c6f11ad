//! Tasks screen and daily digest.

use crate::context::AppContext;
use crate::output;
use anyhow::Result;
use chrono::{Local, NaiveDate};
use std::path::Path;
use std::sync::Arc;
use taskflow_core::service::labels::task_due_label;
use taskflow_core::{
    DailyDigest, HttpTaskGateway, NoteId, NoteScope, RemoveOutcome, StatusFilter, TaskId,
    TaskListState, TaskStatus,
};

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn state(ctx: &AppContext) -> TaskListState<Arc<HttpTaskGateway>> {
    TaskListState::with_fallback(ctx.gateway.clone(), ctx.config.demo_fallback)
}

pub async fn list(
    ctx: &AppContext,
    filter: StatusFilter,
    note: Option<String>,
    tabs: bool,
) -> Result<()> {
    let mut tasks = state(ctx);
    if tabs {
        tasks.load_with_notes().await?;
        output::demo_banner(tasks.mode());
        let tabs = tasks.note_tabs();
        if tabs.is_empty() {
            output::notice("No meeting notes with tasks yet.");
        }
        for tab in tabs {
            output::notice(&format!(
                "{}  {}  ({} task(s))",
                tab.note_id, tab.label, tab.task_count
            ));
        }
        return Ok(());
    }

    tasks.load().await?;
    output::demo_banner(tasks.mode());
    if let Some(note_id) = note {
        tasks.scope_to(NoteScope::Note(NoteId::new(note_id))).await?;
    }
    tasks.filter_by(filter);
    output::tasks(tasks.view(), today());
    Ok(())
}

pub async fn toggle(ctx: &AppContext, task_id: &str) -> Result<()> {
    let mut tasks = state(ctx);
    tasks.load().await?;
    let status = tasks.toggle_status(&TaskId::new(task_id)).await?;
    let message = match status {
        TaskStatus::Completed => "Task marked as completed.",
        TaskStatus::Open => "Task reopened.",
    };
    output::notice(message);
    Ok(())
}

pub async fn important(ctx: &AppContext, task_id: &str) -> Result<()> {
    let mut tasks = state(ctx);
    tasks.load().await?;
    let flagged = tasks.toggle_importance(&TaskId::new(task_id)).await?;
    output::notice(if flagged {
        "Task marked as important."
    } else {
        "Task no longer marked as important."
    });
    Ok(())
}

pub async fn delete(ctx: &AppContext, task_id: &str, yes: bool) -> Result<()> {
    let mut tasks = state(ctx);
    tasks.load().await?;
    let confirm = |prompt: &str| yes || output::confirm(prompt);
    match tasks.remove(&TaskId::new(task_id), &confirm).await? {
        RemoveOutcome::Removed => output::notice("Task deleted."),
        RemoveOutcome::Cancelled => output::notice("Kept the task."),
    }
    Ok(())
}

pub async fn calendar(ctx: &AppContext, task_id: &str, dir: &Path) -> Result<()> {
    let mut tasks = state(ctx);
    tasks.load().await?;
    let path = tasks
        .download_calendar_event(&TaskId::new(task_id), dir)
        .await?;
    output::notice(&format!("Saved {}", path.display()));
    Ok(())
}

pub async fn digest(ctx: &AppContext, toggle: Option<String>) -> Result<()> {
    let today = today();
    let mut digest = DailyDigest::new(ctx.gateway.clone(), ctx.config.demo_fallback);
    digest.refresh(today).await?;
    if let Some(task_id) = toggle {
        let status = digest.toggle_status(&TaskId::new(task_id), today).await?;
        output::notice(match status {
            TaskStatus::Completed => "Task marked as completed.",
            TaskStatus::Open => "Task reopened.",
        });
    }
    let due = digest.tasks();
    output::notice(&format!("Due today ({today}):"));
    if due.is_empty() {
        output::notice("Nothing due today.");
    }
    for task in due {
        let mark = if task.is_completed() { "x" } else { " " };
        let label = task_due_label(task, today).unwrap_or_default();
        output::notice(&format!("[{mark}] {}  {}  {label}", task.id, task.description));
    }
    output::demo_banner(digest.mode());
    Ok(())
}
