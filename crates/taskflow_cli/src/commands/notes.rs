//! Dashboard note submission and the results review screen.

use crate::context::AppContext;
use crate::output;
use anyhow::{bail, Context, Result};
use std::io::Read;
use std::path::PathBuf;
use taskflow_core::{NoteFlow, NoteFlowError, NoteId, NoteResultCache, TaskGateway};
use uuid::Uuid;

const REVIEW_HELP: &str = "\
Commands:
  list                    show the summary and tasks
  edit <n> <text>         replace the description of task n
  due <n> <YYYY-MM-DD>    set the due date of task n (`due <n> none` clears it)
  rm <n>                  drop task n
  cal <n> [dir]           download a calendar event for task n
  save                    save the remaining tasks
  quit                    leave without saving";

pub async fn submit(ctx: &AppContext, text: Option<String>, file: Option<PathBuf>) -> Result<()> {
    let text = match (text, file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read `{}`", path.display()))?,
        (None, None) => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("cannot read note text from stdin")?;
            buffer
        }
    };

    let mut flow = NoteFlow::new(ctx.gateway.clone(), ctx.note_cache());
    match flow.submit(&text).await {
        Ok(note_id) => {
            if let Some(draft) = flow.draft() {
                output::draft(draft);
            }
            output::notice("");
            output::notice(&format!("Review and save with: taskflow results {note_id}"));
            Ok(())
        }
        // Processed but not cached: review now, it cannot be reopened later.
        Err(NoteFlowError::Cache(err)) => {
            output::error(&format!(
                "{err}; run `taskflow forget-notes` to free space"
            ));
            output::notice("Review the tasks now; this note cannot be reopened later.");
            if let Some(draft) = flow.draft() {
                output::draft(draft);
            }
            review(&mut flow).await
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn results(ctx: &AppContext, note_id: &str) -> Result<()> {
    let mut flow = NoteFlow::new(ctx.gateway.clone(), ctx.note_cache());
    match flow.open_cached(&NoteId::new(note_id)) {
        Ok(draft) => output::draft(draft),
        Err(NoteFlowError::NoteNotCached(_)) => {
            bail!("no processed note {note_id} on this device; submit the notes again")
        }
        Err(err) => return Err(err.into()),
    }
    review(&mut flow).await
}

/// Drops every processed note kept for the results screen.
pub fn forget(ctx: &AppContext) -> Result<()> {
    let removed = ctx.note_cache().clear()?;
    output::notice(&format!("Forgot {removed} processed note(s)."));
    Ok(())
}

/// Interactive edit/save loop over the draft held by `flow`.
async fn review<G, C>(flow: &mut NoteFlow<G, C>) -> Result<()>
where
    G: TaskGateway,
    C: NoteResultCache,
{
    output::notice("");
    output::notice("Type `help` for commands.");

    loop {
        let Some(line) = output::prompt("> ")? else {
            return Ok(());
        };
        let mut parts = line.splitn(3, char::is_whitespace);
        let verb = parts.next().unwrap_or_default();
        let index = parts.next();
        let rest = parts.next().map(str::trim);

        let outcome: Result<()> = match verb {
            "" => Ok(()),
            "help" => {
                output::notice(REVIEW_HELP);
                Ok(())
            }
            "list" => {
                if let Some(draft) = flow.draft() {
                    output::draft(draft);
                }
                Ok(())
            }
            "edit" => match (proposal_id(flow, index), rest) {
                (Ok(local_id), Some(text)) if !text.is_empty() => {
                    flow.edit_description(local_id, text).map_err(Into::into)
                }
                (Ok(_), _) => Err(anyhow::anyhow!("usage: edit <n> <text>")),
                (Err(err), _) => Err(err),
            },
            "due" => match proposal_id(flow, index) {
                Ok(local_id) => {
                    let value = rest.filter(|value| !value.eq_ignore_ascii_case("none"));
                    flow.edit_due_date(local_id, value).map_err(Into::into)
                }
                Err(err) => Err(err),
            },
            "rm" => match proposal_id(flow, index) {
                Ok(local_id) => flow.remove_proposal(local_id).map(|_| ()).map_err(Into::into),
                Err(err) => Err(err),
            },
            "cal" => match proposal_id(flow, index) {
                Ok(local_id) => {
                    let dir = PathBuf::from(rest.filter(|dir| !dir.is_empty()).unwrap_or("."));
                    match flow.download_calendar_event(local_id, &dir).await {
                        Ok(path) => {
                            output::notice(&format!("Saved {}", path.display()));
                            Ok(())
                        }
                        Err(err) => Err(err.into()),
                    }
                }
                Err(err) => Err(err),
            },
            "save" => match flow.save().await {
                Ok(saved) => {
                    output::notice(&format!(
                        "Saved {} task(s). See them with: taskflow tasks --note {}",
                        saved.tasks.len(),
                        saved.note_id
                    ));
                    return Ok(());
                }
                Err(err) => Err(err.into()),
            },
            "quit" | "exit" => {
                flow.reset();
                return Ok(());
            }
            other => Err(anyhow::anyhow!("unknown command `{other}`; type `help`")),
        };

        if let Err(err) = outcome {
            output::error(&err.to_string());
        }
    }
}

/// Maps a 1-based list position to the proposal's local id.
fn proposal_id<G, C>(flow: &NoteFlow<G, C>, index: Option<&str>) -> Result<Uuid>
where
    G: TaskGateway,
    C: NoteResultCache,
{
    let position = index
        .and_then(|raw| raw.parse::<usize>().ok())
        .filter(|position| *position >= 1)
        .context("expected a task number from `list`")?;
    flow.draft()
        .and_then(|draft| draft.proposals().get(position - 1))
        .map(|proposal| proposal.local_id)
        .with_context(|| format!("no task number {position}"))
}
