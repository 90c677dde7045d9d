//! Session gate: the three-flag login state of one browser session, and the
//! in-memory store that keeps one isolated `Session` per cookie.

use crate::credentials::Authenticator;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use uuid::Uuid;

/// Result of a login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    Success,
    InvalidCredentials,
}

/// The two top-level states a session can be in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    LoggedIn { username: String, is_admin: bool },
}

/// Login state of one user session.
///
/// The fields are private so they can only change through [`Session::login`]
/// and [`Session::logout`]. `is_admin` implies `authenticated`, and an
/// unauthenticated session never carries a username.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    authenticated: bool,
    username: Option<String>,
    is_admin: bool,
}

impl Session {
    /// A fresh, unauthenticated session.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    pub fn state(&self) -> SessionState {
        match (&self.username, self.authenticated) {
            (Some(username), true) => SessionState::LoggedIn {
                username: username.clone(),
                is_admin: self.is_admin,
            },
            _ => SessionState::LoggedOut,
        }
    }

    /// Check `identifier`/`secret` against `auth`.
    ///
    /// On success all three flags are set. On failure nothing changes.
    pub fn login(
        &mut self,
        auth: &dyn Authenticator,
        identifier: &str,
        secret: &str,
    ) -> LoginOutcome {
        if !auth.verify(identifier, secret) {
            log::warn!("login rejected for identifier {:?}", identifier);
            return LoginOutcome::InvalidCredentials;
        }

        self.authenticated = true;
        self.username = Some(identifier.to_string());
        self.is_admin = identifier == auth.admin_identifier();
        log::info!("login succeeded for {} (admin: {})", identifier, self.is_admin);
        LoginOutcome::Success
    }

    /// Reset to the initial unauthenticated state.
    pub fn logout(&mut self) {
        if let Some(username) = self.username.take() {
            log::info!("{} logged out", username);
        }
        self.authenticated = false;
        self.is_admin = false;
    }
}

/// Per-browser sessions keyed by an opaque cookie value.
///
/// Nothing here is persisted: after a restart every cookie is unknown and
/// resolves to a fresh session.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `session` under a freshly generated id.
    ///
    /// # Arguments
    /// * `session` - Session to keep, normally one that just logged in
    ///
    /// # Returns
    /// * `String` - The opaque id to hand out in the session cookie
    pub fn insert(&self, session: Session) -> String {
        let session_id = Uuid::new_v4().to_string();
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.insert(session_id.clone(), session);
        session_id
    }

    pub fn contains(&self, session_id: &str) -> bool {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        sessions.contains_key(session_id)
    }

    /// Snapshot of a session. Unknown ids yield `None`.
    pub fn get(&self, session_id: &str) -> Option<Session> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        sessions.get(session_id).cloned()
    }

    /// Run `f` against the stored session, if there is one.
    pub fn update<R>(&self, session_id: &str, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.get_mut(session_id).map(f)
    }

    /// Drop a session entirely. Unknown ids are ignored.
    ///
    /// # Returns
    /// * `Option<Session>` - The session that was stored under `session_id`
    pub fn remove(&self, session_id: &str) -> Option<Session> {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.remove(session_id)
    }

    pub fn len(&self) -> usize {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
