//! Identity-provider contract and its error type.

use crate::model::session::{Session, SessionEvent};
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};
use tokio::sync::broadcast;

pub type AuthResult<T> = Result<T, AuthFailure>;

/// Error reported by the identity provider, kept verbatim for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthFailure {
    /// HTTP status when the provider answered; `None` on transport failure.
    pub status: Option<u16>,
    /// Provider error code (`invalid_grant`, `user_already_exists`, ...).
    pub code: Option<String>,
    pub message: String,
}

impl AuthFailure {
    pub fn new(status: Option<u16>, code: Option<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(None, None, message)
    }
}

impl Display for AuthFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for AuthFailure {}

/// Result of a sign-up request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// Account created and a session issued immediately.
    SignedIn(Session),
    /// Account created; the provider waits for email confirmation.
    ConfirmationRequired { email: String },
}

/// Receiving end of the provider's session-change channel.
pub struct SessionSubscription {
    receiver: Option<broadcast::Receiver<SessionEvent>>,
}

impl SessionSubscription {
    pub fn new(receiver: broadcast::Receiver<SessionEvent>) -> Self {
        Self {
            receiver: Some(receiver),
        }
    }

    /// Waits for the next event.
    ///
    /// Returns `None` once unsubscribed or when the provider is gone. Events
    /// dropped by a lagging receiver are skipped; the next event still
    /// carries a full slot value.
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        loop {
            let receiver = self.receiver.as_mut()?;
            match receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::warn!(
                        "event=session_subscription module=session status=lagged skipped={skipped}"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    self.receiver = None;
                    return None;
                }
            }
        }
    }

    /// Stops receiving events. Idempotent.
    pub fn unsubscribe(&mut self) {
        self.receiver = None;
    }

    pub fn is_active(&self) -> bool {
        self.receiver.is_some()
    }
}

/// Hosted identity provider operations.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Returns the existing session, refreshing it when expired.
    async fn get_session(&self) -> AuthResult<Option<Session>>;
    async fn sign_up(&self, email: &str, password: &str) -> AuthResult<SignUpOutcome>;
    async fn sign_in_with_password(&self, email: &str, password: &str) -> AuthResult<Session>;
    async fn sign_out(&self) -> AuthResult<()>;
    /// Subscribes to session-change notifications.
    fn subscribe(&self) -> SessionSubscription;
}
