//! Command dispatch behind the route guard.

mod auth;
mod notes;
mod tasks;

use crate::cli::Command;
use crate::context::AppContext;
use crate::output;
use anyhow::{bail, Result};
use log::info;
use taskflow_core::routes::{guard, RouteDecision, ENTRY_ROUTE};

pub async fn handle(command: Command, ctx: &AppContext) -> Result<()> {
    let route = command.route();
    match guard(&route, ctx.session.is_signed_in()) {
        RouteDecision::Allow => {}
        RouteDecision::Redirect(ENTRY_ROUTE) => {
            info!("event=route_guard module=cli status=redirect target=entry");
            bail!("you are not signed in; run `taskflow login` first");
        }
        RouteDecision::Redirect(target) => {
            info!("event=route_guard module=cli status=redirect target={target}");
            let who = ctx
                .session
                .identity()
                .and_then(|identity| identity.email)
                .unwrap_or_else(|| "the current account".to_string());
            output::notice(&format!(
                "Already signed in as {who}. Run `taskflow logout` to switch accounts."
            ));
            return Ok(());
        }
    }

    match command {
        Command::Login { email, password } => auth::login(ctx, email, password).await,
        Command::Signup {
            email,
            password,
            confirm,
        } => auth::signup(ctx, email, password, confirm).await,
        Command::Logout => auth::logout(ctx).await,
        Command::Settings => auth::settings(ctx),
        Command::Submit { text, file } => notes::submit(ctx, text, file).await,
        Command::Results { note_id } => notes::results(ctx, &note_id).await,
        Command::Tasks { filter, note, tabs } => tasks::list(ctx, filter, note, tabs).await,
        Command::Toggle { task_id } => tasks::toggle(ctx, &task_id).await,
        Command::Important { task_id } => tasks::important(ctx, &task_id).await,
        Command::Delete { task_id, yes } => tasks::delete(ctx, &task_id, yes).await,
        Command::Calendar { task_id, dir } => tasks::calendar(ctx, &task_id, &dir).await,
        Command::Digest { toggle } => tasks::digest(ctx, toggle).await,
        Command::ForgetNotes => notes::forget(ctx),
    }
}
