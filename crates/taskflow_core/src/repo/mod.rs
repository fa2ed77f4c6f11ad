//! Local persistence contracts over the SQLite store.
//!
//! # Responsibility
//! - Cache note-processing results keyed by note id.
//! - Persist the single signed-in session between process runs.
//!
//! # Invariants
//! - Stored payloads are the JSON form of the domain types; unreadable rows
//!   surface as `RepoError::InvalidData` instead of being skipped.

pub mod error;
pub mod note_result_repo;
pub mod session_repo;
