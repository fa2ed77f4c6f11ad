//! Command-line definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use taskflow_core::routes::{
    note_results_route, DASHBOARD_ROUTE, ENTRY_ROUTE, SETTINGS_ROUTE, TASKS_ROUTE,
};
use taskflow_core::StatusFilter;

/// Turn meeting notes into tracked tasks.
#[derive(Parser)]
#[command(name = "taskflow", about, version, propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: Option<String>,
        /// Prompted on stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Create an account
    Signup {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        password: Option<String>,
        /// Must equal --password
        #[arg(long)]
        confirm: Option<String>,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in account
    Settings,
    /// Submit meeting notes for summarizing and task extraction
    Submit {
        /// Note text; read from --file or stdin when omitted
        text: Option<String>,
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,
    },
    /// Review, edit and save the tasks extracted from a submitted note
    Results { note_id: String },
    /// List tasks
    Tasks {
        #[arg(long, default_value = "all", value_parser = parse_filter, conflicts_with = "tabs")]
        filter: StatusFilter,
        /// Only tasks extracted from this note
        #[arg(long, conflicts_with = "tabs")]
        note: Option<String>,
        /// List meeting-note tabs instead of tasks
        #[arg(long)]
        tabs: bool,
    },
    /// Toggle a task between open and completed
    Toggle { task_id: String },
    /// Toggle a task's importance flag
    Important { task_id: String },
    /// Delete a task
    Delete {
        task_id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Download a task's calendar event (.ics)
    Calendar {
        task_id: String,
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
    /// Show tasks due today
    Digest {
        /// Toggle this task between open and completed first
        #[arg(long, value_name = "TASK_ID")]
        toggle: Option<String>,
    },
    /// Forget processed notes kept for the results screen
    ForgetNotes,
}

impl Command {
    /// Screen this command stands in for; checked by the route guard.
    pub fn route(&self) -> String {
        match self {
            Self::Login { .. } | Self::Signup { .. } => ENTRY_ROUTE.to_string(),
            Self::Logout | Self::Submit { .. } | Self::Digest { .. } | Self::ForgetNotes => {
                DASHBOARD_ROUTE.to_string()
            }
            Self::Settings => SETTINGS_ROUTE.to_string(),
            Self::Results { note_id } => note_results_route(note_id),
            Self::Tasks { .. }
            | Self::Toggle { .. }
            | Self::Important { .. }
            | Self::Delete { .. }
            | Self::Calendar { .. } => TASKS_ROUTE.to_string(),
        }
    }
}

fn parse_filter(value: &str) -> Result<StatusFilter, String> {
    value.parse()
}
