//! Per-invocation application context.
//!
//! # Responsibility
//! - Open the local store and restore the persisted session.
//! - Wire the session store into the HTTP gateway as its token source.
//! - Write the final session state back before exit.

use anyhow::{Context, Result};
use log::{info, warn};
use rusqlite::Connection;
use std::sync::Arc;
use taskflow_core::db::open_db;
use taskflow_core::{
    ClientConfig, HttpTaskGateway, IdentityProvider, SessionRepository, SessionStore,
    SqliteNoteResultCache, SqliteSessionRepository, SupabaseAuthProvider,
};

pub struct AppContext {
    pub config: ClientConfig,
    pub conn: Connection,
    pub session: Arc<SessionStore>,
    pub gateway: Arc<HttpTaskGateway>,
}

impl AppContext {
    pub async fn open(config: ClientConfig) -> Result<Self> {
        let conn = open_db(&config.db_path)
            .with_context(|| format!("cannot open local store `{}`", config.db_path.display()))?;

        let persisted = match SqliteSessionRepository::new(&conn).load() {
            Ok(session) => session,
            Err(err) => {
                warn!("event=session_restore module=cli status=error error={}", err);
                None
            }
        };

        let provider = SupabaseAuthProvider::new(config.auth_url.clone(), &config.auth_anon_key);
        provider.restore(persisted);
        let provider: Arc<dyn IdentityProvider> = Arc::new(provider);
        let session = Arc::new(SessionStore::start(provider).await);

        let gateway = HttpTaskGateway::new(config.api_base_url.clone(), session.clone())?;
        info!(
            "event=context_open module=cli status=ok signed_in={}",
            session.is_signed_in()
        );

        Ok(Self {
            config,
            conn,
            session,
            gateway: Arc::new(gateway),
        })
    }

    pub fn note_cache(&self) -> SqliteNoteResultCache<'_> {
        SqliteNoteResultCache::new(&self.conn)
    }

    /// Persists (or clears) the provider's final session.
    ///
    /// Read from the provider so a refresh whose event has not reached the
    /// slot yet is still stored.
    pub async fn persist_session(&self) -> Result<()> {
        let repo = SqliteSessionRepository::new(&self.conn);
        match self.session.provider_session().await? {
            Some(session) => repo.save(&session)?,
            None => repo.clear()?,
        }
        Ok(())
    }

    pub fn shutdown(&self) {
        self.session.shutdown();
    }
}
