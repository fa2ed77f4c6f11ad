//! Client-side domain model for tasks, notes and sessions.
//!
//! # Responsibility
//! - Define the wire-compatible records exchanged with the backend API.
//! - Keep local-only fields (proposal `local_id`) out of the wire payloads.
//!
//! # Invariants
//! - Task status is binary (`open` / `completed`).
//! - Due dates are always valid calendar dates once parsed.

pub mod note;
pub mod session;
pub mod task;
pub mod validation;
