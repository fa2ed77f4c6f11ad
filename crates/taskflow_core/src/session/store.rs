//! Current-session slot owned by the application context.
//!
//! # Responsibility
//! - Initialize the slot from the provider's existing session.
//! - Apply every provider session event to the slot, in order.
//! - Expose sign-up/sign-in/logout and the current bearer token.
//!
//! # Invariants
//! - Exactly one writer task applies provider events; consumers only read
//!   or watch.
//! - `logout` clears the slot only after the provider confirmed sign-out.
//! - After `shutdown`, no further events are applied.

use crate::gateway::TokenSource;
use crate::model::session::{Identity, Session};
use crate::session::provider::{AuthResult, IdentityProvider, SignUpOutcome};
use async_trait::async_trait;
use log::{error, info};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Owned session context; pass it explicitly to whoever needs identity.
pub struct SessionStore {
    provider: Arc<dyn IdentityProvider>,
    slot: Arc<watch::Sender<Option<Session>>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl SessionStore {
    /// Starts the store: subscribes to provider events, loads the existing
    /// session and spawns the event listener.
    ///
    /// A provider error during the initial query leaves the slot empty.
    /// Must be called inside a tokio runtime.
    pub async fn start(provider: Arc<dyn IdentityProvider>) -> Self {
        // Subscribe before querying so no event between the two is lost.
        let mut subscription = provider.subscribe();
        let initial = match provider.get_session().await {
            Ok(session) => session,
            Err(err) => {
                error!(
                    "event=session_init module=session status=error error={}",
                    err
                );
                None
            }
        };
        info!(
            "event=session_init module=session status=ok signed_in={}",
            initial.is_some()
        );

        let (sender, _receiver) = watch::channel(initial);
        let slot = Arc::new(sender);
        let listener_slot = Arc::clone(&slot);
        let listener = tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                info!(
                    "event=session_change module=session status=ok kind={}",
                    event.name()
                );
                listener_slot.send_replace(event.into_session());
            }
        });

        Self {
            provider,
            slot,
            listener: Mutex::new(Some(listener)),
        }
    }

    /// Returns a snapshot of the current session.
    pub fn current(&self) -> Option<Session> {
        self.slot.borrow().clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.slot
            .borrow()
            .as_ref()
            .map(|session| session.identity.clone())
    }

    pub fn is_signed_in(&self) -> bool {
        self.slot.borrow().is_some()
    }

    /// Watches slot changes. Dropping the receiver unsubscribes.
    pub fn watch(&self) -> watch::Receiver<Option<Session>> {
        self.slot.subscribe()
    }

    /// Asks the provider for its session, refreshing it when expired.
    ///
    /// The slot itself only changes through the resulting provider events.
    pub async fn provider_session(&self) -> AuthResult<Option<Session>> {
        self.provider.get_session().await
    }

    /// Signs in; the slot is updated by the provider's `SignedIn` event.
    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<Session> {
        let result = self.provider.sign_in_with_password(email, password).await;
        log_auth_outcome("sign_in", result.as_ref().err());
        result
    }

    /// Signs up; the slot is updated only if the provider issues a session.
    pub async fn sign_up(&self, email: &str, password: &str) -> AuthResult<SignUpOutcome> {
        let result = self.provider.sign_up(email, password).await;
        log_auth_outcome("sign_up", result.as_ref().err());
        result
    }

    /// Signs out at the provider, then clears the slot.
    pub async fn logout(&self) -> AuthResult<()> {
        let result = self.provider.sign_out().await;
        log_auth_outcome("logout", result.as_ref().err());
        result?;
        self.slot.send_replace(None);
        Ok(())
    }

    /// Stops applying provider events. Idempotent.
    pub fn shutdown(&self) {
        if let Ok(mut guard) = self.listener.lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
                info!("event=session_shutdown module=session status=ok");
            }
        }
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[async_trait]
impl TokenSource for SessionStore {
    async fn access_token(&self) -> Option<String> {
        let now = chrono::Utc::now().timestamp();
        let current = self.current()?;
        if !current.is_expired(now) {
            return Some(current.access_token);
        }
        // Expired: let the provider refresh; its event updates the slot.
        match self.provider.get_session().await {
            Ok(Some(session)) => Some(session.access_token),
            Ok(None) => None,
            Err(err) => {
                error!(
                    "event=session_refresh module=session status=error error={}",
                    err
                );
                None
            }
        }
    }
}

fn log_auth_outcome(op: &str, err: Option<&crate::session::provider::AuthFailure>) {
    match err {
        None => info!("event=auth_{op} module=session status=ok"),
        Some(err) => error!(
            "event=auth_{op} module=session status=error http_status={} code={}",
            err.status.map_or_else(|| "none".to_string(), |s| s.to_string()),
            err.code.as_deref().unwrap_or("none")
        ),
    }
}
