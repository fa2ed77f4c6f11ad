//! Persisted session slot so the shell stays signed in between runs.
//!
//! # Invariants
//! - At most one session row exists (`slot = 1`).

use crate::model::session::Session;
use crate::repo::error::{RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};

/// Single-slot session persistence.
pub trait SessionRepository {
    fn load(&self) -> RepoResult<Option<Session>>;
    fn save(&self, session: &Session) -> RepoResult<()>;
    fn clear(&self) -> RepoResult<()>;
}

/// SQLite-backed session slot.
pub struct SqliteSessionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSessionRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl SessionRepository for SqliteSessionRepository<'_> {
    fn load(&self) -> RepoResult<Option<Session>> {
        let payload: Option<String> = self
            .conn
            .query_row("SELECT payload FROM auth_session WHERE slot = 1;", [], |row| {
                row.get(0)
            })
            .optional()?;
        payload
            .map(|raw| {
                serde_json::from_str(&raw)
                    .map_err(|err| RepoError::InvalidData(format!("persisted session: {err}")))
            })
            .transpose()
    }

    fn save(&self, session: &Session) -> RepoResult<()> {
        let payload = serde_json::to_string(session)
            .map_err(|err| RepoError::InvalidData(format!("cannot encode session: {err}")))?;
        self.conn.execute(
            "INSERT INTO auth_session (slot, payload)
             VALUES (1, ?1)
             ON CONFLICT(slot) DO UPDATE SET
                payload = excluded.payload,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![payload],
        )?;
        Ok(())
    }

    fn clear(&self) -> RepoResult<()> {
        self.conn.execute("DELETE FROM auth_session;", [])?;
        Ok(())
    }
}
