//! Display label derivation shared by the task views.
//!
//! # Responsibility
//! - Derive short note tab labels from markdown summaries.
//! - Render due dates relative to "today" at day granularity.
//!
//! # Invariants
//! - Tab labels never exceed `TAB_LABEL_MAX_CHARS` characters.
//! - Label derivation is pure; callers supply `today`.

use crate::model::task::{DueDate, Task};
use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

/// Longest tab label, ellipsis included.
pub const TAB_LABEL_MAX_CHARS: usize = 30;
const ELLIPSIS: &str = "...";

static MARKDOWN_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("valid link regex"));
static MARKDOWN_SYMBOL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\*_`#>~]+").expect("valid markdown symbol regex"));
static LIST_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:[-+]|\d+\.)\s+").expect("valid list marker regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Tab label for a meeting note.
///
/// Uses the first non-blank summary line with markdown removed; falls back
/// to the note's creation date when the summary yields nothing.
pub fn note_tab_label(summary: &str, created_at: &str) -> String {
    let first_line = summary
        .lines()
        .map(strip_markdown)
        .find(|line| !line.is_empty());

    match first_line {
        Some(line) => truncate_label(&line),
        None => truncate_label(&created_date_label(created_at)),
    }
}

/// Relative due label: `Due today`, `Due in N day(s)` or
/// `Overdue (N day(s) ago)`.
pub fn due_label(due: DueDate, today: NaiveDate) -> String {
    let days = (due.date() - today).num_days();
    match days {
        0 => "Due today".to_string(),
        d if d > 0 => format!("Due in {}", day_count(d)),
        d => format!("Overdue ({} ago)", day_count(-d)),
    }
}

/// Due label for a task row; completed tasks show the plain date.
pub fn task_due_label(task: &Task, today: NaiveDate) -> Option<String> {
    let due = task.due_date?;
    if task.is_completed() {
        Some(due.to_string())
    } else {
        Some(due_label(due, today))
    }
}

fn day_count(days: i64) -> String {
    if days == 1 {
        "1 day".to_string()
    } else {
        format!("{days} days")
    }
}

fn strip_markdown(line: &str) -> String {
    let without_marker = LIST_MARKER_RE.replace(line, "");
    let without_links = MARKDOWN_LINK_RE.replace_all(&without_marker, "$1");
    let without_symbols = MARKDOWN_SYMBOL_RE.replace_all(&without_links, " ");
    WHITESPACE_RE
        .replace_all(&without_symbols, " ")
        .trim()
        .to_string()
}

fn truncate_label(label: &str) -> String {
    if label.chars().count() <= TAB_LABEL_MAX_CHARS {
        return label.to_string();
    }
    let keep = TAB_LABEL_MAX_CHARS - ELLIPSIS.len();
    let mut truncated = label.chars().take(keep).collect::<String>();
    truncated.push_str(ELLIPSIS);
    truncated
}

fn created_date_label(created_at: &str) -> String {
    let trimmed = created_at.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return timestamp.date_naive().to_string();
    }
    match DueDate::parse(trimmed) {
        Ok(date) => date.to_string(),
        Err(_) => trimmed.to_string(),
    }
}
