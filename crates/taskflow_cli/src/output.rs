//! Terminal rendering and prompts.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::io::{self, BufRead, Write};
use taskflow_core::service::labels::task_due_label;
use taskflow_core::{DataMode, ReviewDraft, Task};

pub fn notice(message: &str) {
    println!("{message}");
}

/// One-line user notification for a failed action.
pub fn error(message: &str) {
    eprintln!("error: {message}");
}

pub fn demo_banner(mode: DataMode) {
    if mode == DataMode::Demo {
        notice("(backend unreachable: showing demo data)");
    }
}

pub fn tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>, today: NaiveDate) {
    let mut shown = 0usize;
    for task in tasks {
        shown += 1;
        let mark = if task.is_completed() { "x" } else { " " };
        let star = if task.is_important {
            "*"
        } else if task.is_overdue(today) {
            "!"
        } else {
            " "
        };
        let due = task_due_label(task, today)
            .map(|label| format!("  [{label}]"))
            .unwrap_or_default();
        println!("[{mark}]{star} {}  {}{due}", task.id, task.description);
    }
    if shown == 0 {
        notice("No tasks.");
    }
}

pub fn draft(draft: &ReviewDraft) {
    println!("Note {}", draft.note_id());
    println!();
    println!("{}", draft.summary().trim());
    println!();
    if draft.proposals().is_empty() {
        notice("No tasks left to save.");
        return;
    }
    for (index, proposal) in draft.proposals().iter().enumerate() {
        let due = proposal
            .due_date
            .map(|due| format!("  (due {due})"))
            .unwrap_or_default();
        println!("{:>3}. {}{due}", index + 1, proposal.description);
    }
}

/// Reads one trimmed line from stdin after printing `label`.
///
/// Returns `None` at end of input.
pub fn prompt(label: &str) -> Result<Option<String>> {
    print!("{label}");
    io::stdout().flush().context("cannot flush stdout")?;
    let mut line = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut line)
        .context("cannot read stdin")?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// `y`/`yes` confirms; anything else (including end of input) declines.
pub fn confirm(question: &str) -> bool {
    match prompt(&format!("{question} [y/N] ")) {
        Ok(Some(answer)) => matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"),
        _ => false,
    }
}
