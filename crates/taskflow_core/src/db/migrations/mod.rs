//! Schema migration registry and executor for the local store.
//!
//! # Invariants
//! - Step versions are strictly increasing, starting at 1.
//! - Applied version is mirrored to `PRAGMA user_version`.
//! - All pending steps apply in one transaction, or none do.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

/// Ordered schema steps; index `i` holds version `i + 1`.
const STEPS: &[(&str, &str)] = &[
    ("note_results", include_str!("0001_note_results.sql")),
    ("auth_session", include_str!("0002_auth_session.sql")),
];

/// Schema version produced by this build.
pub fn latest_version() -> u32 {
    u32::try_from(STEPS.len()).unwrap_or(u32::MAX)
}

/// Brings the store up to `latest_version`; returns how many steps ran.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<usize> {
    let found: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let supported = latest_version();
    if found > supported {
        return Err(DbError::SchemaTooNew { found, supported });
    }

    let pending: Vec<(u32, &str, &str)> = (found + 1..=supported)
        .zip(STEPS.iter().skip(found as usize))
        .map(|(version, (name, sql))| (version, *name, *sql))
        .collect();
    if pending.is_empty() {
        return Ok(0);
    }

    let tx = conn.transaction()?;
    for (version, name, sql) in &pending {
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", version)?;
        info!("event=db_migrate module=db status=ok version={version} step={name}");
    }
    tx.commit()?;
    Ok(pending.len())
}
