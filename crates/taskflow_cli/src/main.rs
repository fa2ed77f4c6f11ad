//! `taskflow` terminal shell.
//!
//! # Responsibility
//! - Resolve configuration and start file logging.
//! - Run one command per invocation through the route guard.
//! - Report failures as a single `error: ...` line with exit code 1.

mod cli;
mod commands;
mod context;
mod output;

use anyhow::Result;
use clap::Parser;
use log::{error, warn};
use taskflow_core::{init_logging, ClientConfig};

use crate::cli::Cli;
use crate::context::AppContext;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        error!("event=command module=cli status=error error={}", err);
        output::error(&err.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = ClientConfig::from_env()?;
    if let Err(err) = init_logging(&config.log_level, &config.log_dir) {
        // The shell still works without file logs.
        output::error(&format!("logging disabled: {err}"));
    }

    let ctx = AppContext::open(config).await?;
    let result = commands::handle(cli.command, &ctx).await;
    if let Err(err) = ctx.persist_session().await {
        warn!("event=session_persist module=cli status=error error={}", err);
    }
    ctx.shutdown();
    result
}
