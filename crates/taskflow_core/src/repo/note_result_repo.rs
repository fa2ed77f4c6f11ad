//! Note-result cache contract and SQLite implementation.
//!
//! # Responsibility
//! - Keep processed note results readable by the results screen.
//!
//! # Invariants
//! - Bounded: a new key at capacity is rejected, never silently evicted.
//! - No TTL; entries leave only through `remove` or `clear`.
//! - Re-caching an existing note id replaces its payload.
//!
//! This cache stands in for a fetch-note-by-id endpoint the backend does
//! not offer.

use crate::model::note::{NoteId, NoteResult};
use crate::repo::error::{RepoError, RepoResult};
use log::{info, warn};
use rusqlite::{params, Connection, OptionalExtension};

/// Default number of cached note results.
pub const DEFAULT_NOTE_CACHE_CAPACITY: usize = 50;

/// Keyed store of processed note results.
pub trait NoteResultCache {
    fn put(&self, result: &NoteResult) -> RepoResult<()>;
    fn get(&self, note_id: &NoteId) -> RepoResult<Option<NoteResult>>;
    /// Returns whether an entry was removed.
    fn remove(&self, note_id: &NoteId) -> RepoResult<bool>;
    /// Removes every entry; returns how many were removed.
    fn clear(&self) -> RepoResult<usize>;
    fn len(&self) -> RepoResult<usize>;
}

/// SQLite-backed note-result cache.
pub struct SqliteNoteResultCache<'conn> {
    conn: &'conn Connection,
    capacity: usize,
}

impl<'conn> SqliteNoteResultCache<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self::with_capacity(conn, DEFAULT_NOTE_CACHE_CAPACITY)
    }

    /// A zero capacity is raised to one.
    pub fn with_capacity(conn: &'conn Connection, capacity: usize) -> Self {
        Self {
            conn,
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn contains(&self, note_id: &NoteId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM note_results WHERE note_id = ?1);",
            [note_id.as_str()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}

impl NoteResultCache for SqliteNoteResultCache<'_> {
    fn put(&self, result: &NoteResult) -> RepoResult<()> {
        if !self.contains(&result.note_id)? && self.len()? >= self.capacity {
            warn!(
                "event=note_cache_put module=repo status=rejected reason=full capacity={}",
                self.capacity
            );
            return Err(RepoError::CacheFull {
                capacity: self.capacity,
            });
        }

        let payload = serde_json::to_string(result)
            .map_err(|err| RepoError::InvalidData(format!("cannot encode note result: {err}")))?;
        self.conn.execute(
            "INSERT INTO note_results (note_id, payload)
             VALUES (?1, ?2)
             ON CONFLICT(note_id) DO UPDATE SET
                payload = excluded.payload,
                cached_at = (strftime('%s', 'now') * 1000);",
            params![result.note_id.as_str(), payload],
        )?;
        info!("event=note_cache_put module=repo status=ok");
        Ok(())
    }

    fn get(&self, note_id: &NoteId) -> RepoResult<Option<NoteResult>> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM note_results WHERE note_id = ?1;",
                [note_id.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        payload
            .map(|raw| {
                serde_json::from_str(&raw).map_err(|err| {
                    RepoError::InvalidData(format!("note result `{note_id}`: {err}"))
                })
            })
            .transpose()
    }

    fn remove(&self, note_id: &NoteId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM note_results WHERE note_id = ?1;",
            [note_id.as_str()],
        )?;
        Ok(changed > 0)
    }

    fn clear(&self) -> RepoResult<usize> {
        let changed = self.conn.execute("DELETE FROM note_results;", [])?;
        info!("event=note_cache_clear module=repo status=ok removed={changed}");
        Ok(changed)
    }

    fn len(&self) -> RepoResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM note_results;", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}
