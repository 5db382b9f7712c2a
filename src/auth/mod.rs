//! Auth collaborator — session issuance, change notification, sign-out.
//!
//! DESIGN
//! ======
//! The current session lives in a `tokio::sync::watch` channel owned by the
//! provider. Subscribers get a [`SessionSubscription`] and see every change
//! until they drop it. [`TokenSource`] reads the same channel so outbound
//! store and storage requests carry the signed-in user's token (falling back
//! to the anon key).

pub mod gotrue;
pub mod memory;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use uuid::Uuid;

use crate::error::{ErrorCode, Severity};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// An authenticated session as issued by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub user: SessionUser,
}

impl Session {
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("session expired, sign in again")]
    SessionExpired,
    #[error("auth request failed: {0}")]
    Request(String),
    #[error("auth provider error (status {status}): {message}")]
    Api { status: u16, message: String },
    #[error("auth response parse failed: {0}")]
    Parse(String),
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ErrorCode for AuthError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "E_INVALID_CREDENTIALS",
            Self::SessionExpired => "E_SESSION_EXPIRED",
            Self::Request(_) => "E_AUTH_REQUEST",
            Self::Api { .. } => "E_AUTH_API",
            Self::Parse(_) => "E_AUTH_PARSE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    fn severity(&self) -> Severity {
        match self {
            Self::InvalidCredentials | Self::SessionExpired => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

// =============================================================================
// SUBSCRIPTION
// =============================================================================

/// Live view of session changes. Dropping it unsubscribes.
pub struct SessionSubscription {
    rx: watch::Receiver<Option<Session>>,
}

impl SessionSubscription {
    #[must_use]
    pub fn new(rx: watch::Receiver<Option<Session>>) -> Self {
        Self { rx }
    }

    /// Wait for the next change. Returns `None` once the provider is gone.
    pub async fn changed(&mut self) -> Option<Option<Session>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.rx.borrow().clone()
    }
}

/// Bearer token for outbound backend requests.
#[derive(Clone)]
pub struct TokenSource {
    anon_key: String,
    session: Option<watch::Receiver<Option<Session>>>,
}

impl TokenSource {
    /// Anonymous access only.
    #[must_use]
    pub fn anonymous(anon_key: impl Into<String>) -> Self {
        Self { anon_key: anon_key.into(), session: None }
    }

    /// Follow the sessions published by an auth provider.
    #[must_use]
    pub fn with_sessions(anon_key: impl Into<String>, rx: watch::Receiver<Option<Session>>) -> Self {
        Self { anon_key: anon_key.into(), session: Some(rx) }
    }

    #[must_use]
    pub fn anon_key(&self) -> &str {
        &self.anon_key
    }

    /// Session access token if signed in, otherwise the anon key.
    #[must_use]
    pub fn bearer(&self) -> String {
        self.session
            .as_ref()
            .and_then(|rx| rx.borrow().as_ref().map(|s| s.access_token.clone()))
            .unwrap_or_else(|| self.anon_key.clone())
    }
}

// =============================================================================
// PROVIDER TRAIT
// =============================================================================

#[async_trait::async_trait]
pub trait AuthProvider: Send + Sync {
    /// One-shot read of the current session, refreshing it if it expired.
    async fn current_session(&self) -> Result<Option<Session>, AuthError>;

    /// Subscribe to session changes until the subscription is dropped.
    fn subscribe(&self) -> SessionSubscription;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Register an account. Returns a session when the provider signs the
    /// user in immediately (no email confirmation required).
    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
