//! In-process auth provider with a fixed account list.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use uuid::Uuid;

use super::{AuthError, AuthProvider, Session, SessionSubscription, SessionUser, TokenSource};

pub struct MemoryAuth {
    accounts: Mutex<HashMap<String, (String, Uuid)>>,
    sessions: watch::Sender<Option<Session>>,
}

impl Default for MemoryAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAuth {
    #[must_use]
    pub fn new() -> Self {
        let (sessions, _) = watch::channel(None);
        Self { accounts: Mutex::new(HashMap::new()), sessions }
    }

    /// Register an account and return its user id.
    pub fn add_account(&self, email: &str, password: &str) -> Uuid {
        let id = Uuid::new_v4();
        if let Ok(mut accounts) = self.accounts.lock() {
            accounts.insert(email.to_owned(), (password.to_owned(), id));
        }
        id
    }

    /// Start a session for `user_id` without credentials, as a restored
    /// session would appear on startup.
    pub fn restore(&self, user_id: Uuid) -> Session {
        let session = issue(user_id, None);
        self.sessions.send_replace(Some(session.clone()));
        session
    }

    /// Publish a session for `user_id` that expired at `expired_at`. With
    /// `refreshable` it carries a refresh token and the next
    /// [`AuthProvider::current_session`] swaps it for a fresh one; without,
    /// that read signs out.
    pub fn restore_expired(&self, user_id: Uuid, expired_at: DateTime<Utc>, refreshable: bool) -> Session {
        let session = Session {
            refresh_token: refreshable.then(|| format!("memory-refresh-{}", Uuid::new_v4().simple())),
            expires_at: Some(expired_at),
            ..issue(user_id, None)
        };
        self.sessions.send_replace(Some(session.clone()));
        session
    }

    #[must_use]
    pub fn token_source(&self, anon_key: &str) -> TokenSource {
        TokenSource::with_sessions(anon_key, self.sessions.subscribe())
    }
}

fn issue(user_id: Uuid, email: Option<&str>) -> Session {
    Session {
        access_token: format!("memory-{}", Uuid::new_v4().simple()),
        refresh_token: None,
        expires_at: None,
        user: SessionUser { id: user_id, email: email.map(str::to_owned) },
    }
}

#[async_trait::async_trait]
impl AuthProvider for MemoryAuth {
    async fn current_session(&self) -> Result<Option<Session>, AuthError> {
        let current = self.sessions.borrow().clone();
        let Some(session) = current else {
            return Ok(None);
        };
        if !session.is_expired(Utc::now()) {
            return Ok(Some(session));
        }
        let refreshed = session
            .refresh_token
            .is_some()
            .then(|| issue(session.user.id, session.user.email.as_deref()));
        self.sessions.send_replace(refreshed.clone());
        Ok(refreshed)
    }

    fn subscribe(&self) -> SessionSubscription {
        SessionSubscription::new(self.sessions.subscribe())
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let user_id = {
            let accounts = self
                .accounts
                .lock()
                .map_err(|_| AuthError::Request("account table poisoned".into()))?;
            match accounts.get(email) {
                Some((expected, id)) if expected == password => *id,
                _ => return Err(AuthError::InvalidCredentials),
            }
        };
        let session = issue(user_id, Some(email));
        self.sessions.send_replace(Some(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>, AuthError> {
        let exists = self
            .accounts
            .lock()
            .map_err(|_| AuthError::Request("account table poisoned".into()))?
            .contains_key(email);
        if exists {
            return Err(AuthError::Api { status: 422, message: "User already registered".into() });
        }
        let user_id = self.add_account(email, password);
        let session = issue(user_id, Some(email));
        self.sessions.send_replace(Some(session.clone()));
        Ok(Some(session))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.sessions.send_replace(None);
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
