//! Authenticated session model.
//!
//! # Invariants
//! - A `Session` always carries the identity it was issued for.
//! - Session values are replaced wholesale, never patched field by field.

use serde::{Deserialize, Serialize};

/// Seconds before `expires_at` at which a session is treated as expired.
const EXPIRY_SKEW_SECS: i64 = 30;

/// Signed-in user identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub email: Option<String>,
}

/// Provider-issued session.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Unix epoch seconds.
    pub expires_at: i64,
    pub identity: Identity,
}

impl Session {
    /// Returns whether the access token is expired (or about to be) at `now`.
    pub fn is_expired(&self, now_epoch_secs: i64) -> bool {
        now_epoch_secs + EXPIRY_SKEW_SECS >= self.expires_at
    }
}

// Tokens stay out of debug output.
impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("expires_at", &self.expires_at)
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

/// Out-of-band session change published by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn(Session),
    SignedOut,
    TokenRefreshed(Session),
    UserUpdated(Session),
}

impl SessionEvent {
    /// The slot value this event installs.
    pub fn into_session(self) -> Option<Session> {
        match self {
            Self::SignedIn(session) | Self::TokenRefreshed(session) | Self::UserUpdated(session) => {
                Some(session)
            }
            Self::SignedOut => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::SignedIn(_) => "signed_in",
            Self::SignedOut => "signed_out",
            Self::TokenRefreshed(_) => "token_refreshed",
            Self::UserUpdated(_) => "user_updated",
        }
    }
}
