//! Client use-case state.
//!
//! # Responsibility
//! - Orchestrate gateway and local-store calls into the flows the shell
//!   drives (task list, note review, daily digest).
//! - Keep the shell decoupled from HTTP and storage details.

pub mod calendar;
pub mod digest;
pub mod labels;
pub mod note_flow;
pub mod task_list;
