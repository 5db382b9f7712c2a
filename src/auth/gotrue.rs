//! GoTrue auth client (`/auth/v1`).
//!
//! Password sign-in, sign-up, refresh and logout over HTTP. Every session
//! change is published on the provider's watch channel.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::watch;
use tracing::{info, warn};
use url::Url;

use super::{AuthError, AuthProvider, Session, SessionSubscription, SessionUser, TokenSource};
use crate::config::HttpTimeouts;

// =============================================================================
// CLIENT
// =============================================================================

pub struct GoTrueAuth {
    http: reqwest::Client,
    base_url: Url,
    anon_key: String,
    sessions: watch::Sender<Option<Session>>,
}

impl GoTrueAuth {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: Url, anon_key: impl Into<String>, timeouts: HttpTimeouts) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| AuthError::HttpClientBuild(e.to_string()))?;
        let (sessions, _) = watch::channel(None);
        Ok(Self { http, base_url, anon_key: anon_key.into(), sessions })
    }

    /// Token source that follows this provider's sessions.
    #[must_use]
    pub fn token_source(&self) -> TokenSource {
        TokenSource::with_sessions(self.anon_key.clone(), self.sessions.subscribe())
    }

    async fn post(&self, url: Url, bearer: Option<&str>, body: &serde_json::Value) -> Result<(u16, String), AuthError> {
        let response = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer.unwrap_or(&self.anon_key))
            .json(body)
            .send()
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;
        Ok((status, text))
    }

    async fn token_grant(&self, grant_type: &str, body: serde_json::Value) -> Result<Session, AuthError> {
        let url = token_url(&self.base_url, grant_type)?;
        let (status, text) = self.post(url, None, &body).await?;
        if !(200..300).contains(&status) {
            return Err(parse_error(status, &text));
        }
        parse_session(&text, Utc::now())
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session, AuthError> {
        let session = self
            .token_grant("refresh_token", serde_json::json!({ "refresh_token": refresh_token }))
            .await?;
        self.sessions.send_replace(Some(session.clone()));
        Ok(session)
    }
}

#[async_trait::async_trait]
impl AuthProvider for GoTrueAuth {
    async fn current_session(&self) -> Result<Option<Session>, AuthError> {
        let current = self.sessions.borrow().clone();
        let Some(session) = current else {
            return Ok(None);
        };
        if !session.is_expired(Utc::now()) {
            return Ok(Some(session));
        }
        let Some(refresh_token) = session.refresh_token.as_deref() else {
            self.sessions.send_replace(None);
            return Ok(None);
        };
        match self.refresh(refresh_token).await {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                warn!(error = %e, "auth: session refresh failed, signing out locally");
                self.sessions.send_replace(None);
                Ok(None)
            }
        }
    }

    fn subscribe(&self) -> SessionSubscription {
        SessionSubscription::new(self.sessions.subscribe())
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let session = self
            .token_grant("password", serde_json::json!({ "email": email, "password": password }))
            .await?;
        info!(user_id = %session.user.id, "auth: signed in");
        self.sessions.send_replace(Some(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>, AuthError> {
        let url = endpoint(&self.base_url, &["auth", "v1", "signup"])?;
        let body = serde_json::json!({ "email": email, "password": password });
        let (status, text) = self.post(url, None, &body).await?;
        if !(200..300).contains(&status) {
            return Err(parse_error(status, &text));
        }
        // Without auto-confirm the provider returns only the user record.
        let session = parse_session(&text, Utc::now()).ok();
        if let Some(session) = &session {
            self.sessions.send_replace(Some(session.clone()));
        }
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let token = self.sessions.borrow().as_ref().map(|s| s.access_token.clone());
        // Local sign-out happens regardless of what the provider answers.
        self.sessions.send_replace(None);
        let Some(token) = token else {
            return Ok(());
        };
        let url = endpoint(&self.base_url, &["auth", "v1", "logout"])?;
        let (status, text) = self.post(url, Some(&token), &serde_json::json!({})).await?;
        if !(200..300).contains(&status) {
            return Err(parse_error(status, &text));
        }
        Ok(())
    }
}

// =============================================================================
// URL BUILDING
// =============================================================================

fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, AuthError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| AuthError::Request(format!("invalid base url: {base}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn token_url(base: &Url, grant_type: &str) -> Result<Url, AuthError> {
    let mut url = endpoint(base, &["auth", "v1", "token"])?;
    url.query_pairs_mut().append_pair("grant_type", grant_type);
    Ok(url)
}

// =============================================================================
// PARSING
// =============================================================================

#[derive(serde::Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: SessionUser,
}

fn parse_session(body: &str, now: DateTime<Utc>) -> Result<Session, AuthError> {
    let token: TokenResponse = serde_json::from_str(body).map_err(|e| AuthError::Parse(e.to_string()))?;
    let expires_at = match (token.expires_at, token.expires_in) {
        (Some(secs), _) => Some(
            DateTime::from_timestamp(secs, 0)
                .ok_or_else(|| AuthError::Parse(format!("expires_at out of range: {secs}")))?,
        ),
        (None, Some(secs)) => Some(
            TimeDelta::try_seconds(secs)
                .and_then(|ttl| now.checked_add_signed(ttl))
                .ok_or_else(|| AuthError::Parse(format!("expires_in out of range: {secs}")))?,
        ),
        (None, None) => None,
    };
    Ok(Session { access_token: token.access_token, refresh_token: token.refresh_token, expires_at, user: token.user })
}

#[derive(serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
}

fn parse_error(status: u16, body: &str) -> AuthError {
    let parsed: Option<ErrorBody> = serde_json::from_str(body).ok();
    if status == 400 && parsed.as_ref().and_then(|b| b.error.as_deref()) == Some("invalid_grant") {
        return AuthError::InvalidCredentials;
    }
    let message = parsed
        .and_then(|b| b.error_description.or(b.msg).or(b.error))
        .unwrap_or_else(|| body.to_owned());
    AuthError::Api { status, message }
}

#[cfg(test)]
#[path = "gotrue_test.rs"]
mod tests;
