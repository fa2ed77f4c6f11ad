//! Supabase GoTrue identity provider over REST.
//!
//! # Responsibility
//! - Sign up, sign in with password, refresh and sign out via `/auth/v1`.
//! - Keep the provider-side copy of the current session.
//! - Publish `SessionEvent`s for every session change.
//!
//! # Invariants
//! - Events are published only after the provider call succeeded.
//! - Passwords and tokens are never logged.

use crate::model::session::{Identity, Session, SessionEvent};
use crate::session::provider::{
    AuthFailure, AuthResult, IdentityProvider, SessionSubscription, SignUpOutcome,
};
use async_trait::async_trait;
use log::{info, warn};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::Deserialize;
use serde_json::json;
use std::sync::Mutex;
use tokio::sync::broadcast;

const EVENT_CHANNEL_CAPACITY: usize = 16;
const AUTH_PREFIX: [&str; 2] = ["auth", "v1"];

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

/// Token grant / sign-up response. Sign-up without auto-confirm returns only
/// the user fields, so everything is optional here.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    user: Option<GoTrueUser>,
    #[serde(default)]
    email: Option<String>,
}

impl TokenResponse {
    fn into_session(self) -> Option<Session> {
        let access_token = self.access_token?;
        let user = self.user?;
        let expires_at = self.expires_at.unwrap_or_else(|| {
            chrono::Utc::now().timestamp() + self.expires_in.unwrap_or(3600)
        });
        Some(Session {
            access_token,
            refresh_token: self.refresh_token,
            expires_at,
            identity: Identity {
                user_id: user.id,
                email: user.email,
            },
        })
    }
}

/// GoTrue client holding the provider-side session copy.
pub struct SupabaseAuthProvider {
    client: Client,
    auth_url: Url,
    anon_key: String,
    current: Mutex<Option<Session>>,
    events: broadcast::Sender<SessionEvent>,
}

impl SupabaseAuthProvider {
    pub fn new(auth_url: Url, anon_key: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            client: Client::new(),
            auth_url,
            anon_key: anon_key.into(),
            current: Mutex::new(None),
            events,
        }
    }

    /// Seeds the provider with a previously persisted session.
    ///
    /// No event is published; this is startup state, not a change.
    pub fn restore(&self, session: Option<Session>) {
        self.set_current(session);
    }

    /// Appends `auth/v1/<segments>` to the configured url, keeping any
    /// path prefix it already carries.
    fn endpoint(&self, segments: &[&str]) -> AuthResult<Url> {
        let mut url = self.auth_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|()| {
                AuthFailure::transport(format!("auth url `{}` cannot carry a path", self.auth_url))
            })?;
            path.pop_if_empty();
            path.extend(AUTH_PREFIX);
            path.extend(segments);
        }
        Ok(url)
    }

    fn request(&self, url: Url) -> RequestBuilder {
        self.client
            .post(url)
            .header("apikey", self.anon_key.as_str())
    }

    fn snapshot(&self) -> Option<Session> {
        self.current.lock().ok().and_then(|guard| guard.clone())
    }

    fn set_current(&self, session: Option<Session>) {
        if let Ok(mut guard) = self.current.lock() {
            *guard = session;
        }
    }

    fn publish(&self, event: SessionEvent) {
        self.set_current(event.clone().into_session());
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }

    async fn token_grant(
        &self,
        grant_type: &str,
        body: serde_json::Value,
    ) -> AuthResult<Session> {
        let mut url = self.endpoint(&["token"])?;
        url.query_pairs_mut().append_pair("grant_type", grant_type);
        let response = self.send(self.request(url).json(&body)).await?;
        response
            .into_session()
            .ok_or_else(|| AuthFailure::transport("provider returned no session"))
    }

    async fn send(&self, request: RequestBuilder) -> AuthResult<TokenResponse> {
        let response = request
            .send()
            .await
            .map_err(|err| AuthFailure::transport(err.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| AuthFailure::transport(err.to_string()))?;
        if !status.is_success() {
            return Err(parse_auth_error(status, &body));
        }
        if body.trim().is_empty() {
            return Ok(TokenResponse {
                access_token: None,
                refresh_token: None,
                expires_in: None,
                expires_at: None,
                user: None,
                email: None,
            });
        }
        serde_json::from_str(&body).map_err(|err| {
            AuthFailure::new(
                Some(status.as_u16()),
                None,
                format!("unexpected provider response: {err}"),
            )
        })
    }

    async fn refresh(&self, refresh_token: &str) -> AuthResult<Session> {
        match self
            .token_grant("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
        {
            Ok(session) => {
                info!("event=auth_refresh module=supabase status=ok");
                self.publish(SessionEvent::TokenRefreshed(session.clone()));
                Ok(session)
            }
            Err(err) => {
                // A rejected refresh token means the session is gone for good.
                if err.status.is_some() {
                    warn!("event=auth_refresh module=supabase status=rejected");
                    self.publish(SessionEvent::SignedOut);
                }
                Err(err)
            }
        }
    }
}

#[async_trait]
impl IdentityProvider for SupabaseAuthProvider {
    async fn get_session(&self) -> AuthResult<Option<Session>> {
        let Some(session) = self.snapshot() else {
            return Ok(None);
        };
        if !session.is_expired(chrono::Utc::now().timestamp()) {
            return Ok(Some(session));
        }
        match session.refresh_token.as_deref() {
            Some(refresh_token) => self.refresh(refresh_token).await.map(Some),
            None => {
                self.publish(SessionEvent::SignedOut);
                Ok(None)
            }
        }
    }

    async fn sign_up(&self, email: &str, password: &str) -> AuthResult<SignUpOutcome> {
        let url = self.endpoint(&["signup"])?;
        let response = self
            .send(
                self.request(url)
                    .json(&json!({ "email": email, "password": password })),
            )
            .await?;
        let fallback_email = response
            .email
            .clone()
            .or_else(|| response.user.as_ref().and_then(|user| user.email.clone()))
            .unwrap_or_else(|| email.to_string());
        match response.into_session() {
            Some(session) => {
                self.publish(SessionEvent::SignedIn(session.clone()));
                Ok(SignUpOutcome::SignedIn(session))
            }
            None => Ok(SignUpOutcome::ConfirmationRequired {
                email: fallback_email,
            }),
        }
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> AuthResult<Session> {
        let session = self
            .token_grant("password", json!({ "email": email, "password": password }))
            .await?;
        self.publish(SessionEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> AuthResult<()> {
        if let Some(session) = self.snapshot() {
            let url = self.endpoint(&["logout"])?;
            let result = self
                .send(self.request(url).bearer_auth(session.access_token.as_str()))
                .await;
            match result {
                Ok(_) => {}
                // Token already invalid server-side: the session is gone anyway.
                Err(err) if matches!(err.status, Some(401 | 403 | 404)) => {
                    warn!("event=auth_logout module=supabase status=session_missing");
                }
                Err(err) => return Err(err),
            }
        }
        self.publish(SessionEvent::SignedOut);
        Ok(())
    }

    fn subscribe(&self) -> SessionSubscription {
        SessionSubscription::new(self.events.subscribe())
    }
}

fn parse_auth_error(status: StatusCode, body: &str) -> AuthFailure {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    let field = |key: &str| -> Option<String> {
        parsed.as_ref()?.get(key).and_then(|value| match value {
            serde_json::Value::String(text) => Some(text.clone()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        })
    };
    let message = field("msg")
        .or_else(|| field("message"))
        .or_else(|| field("error_description"))
        .or_else(|| field("error"))
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                status.canonical_reason().unwrap_or("authentication failed").to_string()
            } else {
                trimmed.to_string()
            }
        });
    let code = field("error_code").or_else(|| field("error"));
    AuthFailure::new(Some(status.as_u16()), code, message)
}

#[cfg(test)]
mod tests {
    use super::{parse_auth_error, SupabaseAuthProvider};
    use reqwest::{StatusCode, Url};

    #[test]
    fn endpoints_keep_the_configured_path_prefix() {
        for base in ["https://auth.example.com/project", "https://auth.example.com/project/"] {
            let provider = SupabaseAuthProvider::new(Url::parse(base).unwrap(), "key");
            assert_eq!(
                provider.endpoint(&["token"]).unwrap().as_str(),
                "https://auth.example.com/project/auth/v1/token"
            );
        }
        let provider = SupabaseAuthProvider::new(Url::parse("https://auth.example.com").unwrap(), "key");
        assert_eq!(
            provider.endpoint(&["logout"]).unwrap().as_str(),
            "https://auth.example.com/auth/v1/logout"
        );
    }

    #[test]
    fn auth_error_prefers_msg_then_description() {
        let err = parse_auth_error(
            StatusCode::BAD_REQUEST,
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
        );
        assert_eq!(err.message, "Invalid login credentials");
        assert_eq!(err.code.as_deref(), Some("invalid_grant"));
        assert_eq!(err.status, Some(400));

        let err = parse_auth_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"code":422,"error_code":"user_already_exists","msg":"User already registered"}"#,
        );
        assert_eq!(err.message, "User already registered");
        assert_eq!(err.code.as_deref(), Some("user_already_exists"));
    }

    #[test]
    fn auth_error_falls_back_to_body_or_reason() {
        assert_eq!(
            parse_auth_error(StatusCode::BAD_GATEWAY, "upstream down").message,
            "upstream down"
        );
        assert_eq!(
            parse_auth_error(StatusCode::TOO_MANY_REQUESTS, "").message,
            "Too Many Requests"
        );
    }
}
