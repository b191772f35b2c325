//! Authentication and session state
//!
//! The session is an explicit state machine owned by one controller:
//! signed-out or signed-in, with transitions published on a watch channel
//! that interested parties subscribe to. Anonymous identities carry a
//! fixed 10-minute lifetime computed from their creation time; the REPL
//! runs a 1-second countdown against it and the controller force-signs-out
//! when it reaches zero.

use crate::error::{Result, TalviError};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

pub mod client;
pub mod pkce;
pub use client::{AuthClient, AuthSession, HttpAuthClient, TokenStore};

/// Lifetime of an anonymous session, in seconds
pub const ANONYMOUS_SESSION_SECS: i64 = 600;

/// An authenticated identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable user id assigned by the identity provider
    pub id: String,
    /// Email address; absent for anonymous identities
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Whether this is a temporary anonymous identity
    #[serde(default)]
    pub is_anonymous: bool,
    /// Account creation time, RFC-3339; basis of the anonymous expiry
    pub created_at: String,
}

impl User {
    /// Expiry deadline; `None` for non-anonymous users
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        if !self.is_anonymous {
            return None;
        }
        DateTime::parse_from_rfc3339(&self.created_at)
            .ok()
            .map(|created| created.with_timezone(&Utc) + Duration::seconds(ANONYMOUS_SESSION_SECS))
    }

    /// Seconds left before expiry, clamped at zero; `None` when unlimited
    ///
    /// An anonymous user with an unparsable creation time reports zero,
    /// which forces an immediate sign-out rather than an unbounded session.
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> Option<i64> {
        if !self.is_anonymous {
            return None;
        }
        let remaining = self
            .expires_at()
            .map(|deadline| (deadline - now).num_seconds())
            .unwrap_or(0);
        Some(remaining.max(0))
    }

    /// Whether this identity is past its deadline at `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.remaining_secs(now) == Some(0)
    }
}

/// Session state
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    /// No authenticated user
    #[default]
    SignedOut,
    /// An authenticated user
    SignedIn(User),
}

impl SessionState {
    /// The signed-in user, if any
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::SignedOut => None,
            Self::SignedIn(user) => Some(user),
        }
    }
}

/// Owner of the session state
///
/// All transitions go through this controller; observers hold a watch
/// receiver and react to changes instead of reaching into shared state.
pub struct SessionController {
    sender: watch::Sender<SessionState>,
}

impl SessionController {
    /// Create a controller in the signed-out state
    pub fn new() -> Self {
        let (sender, _) = watch::channel(SessionState::SignedOut);
        Self { sender }
    }

    /// Subscribe to session state changes
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.sender.subscribe()
    }

    /// The current session state
    pub fn current(&self) -> SessionState {
        self.sender.borrow().clone()
    }

    /// Transition to signed-in
    ///
    /// # Errors
    ///
    /// Rejects an anonymous identity that is already past its deadline;
    /// such a session must not be accepted only to be torn down a tick
    /// later.
    pub fn sign_in(&self, user: User, now: DateTime<Utc>) -> Result<()> {
        if user.is_expired(now) {
            return Err(TalviError::Authentication(
                "Anonymous session has already expired".to_string(),
            )
            .into());
        }
        tracing::info!("Signed in as {}", user.id);
        self.sender.send_replace(SessionState::SignedIn(user));
        Ok(())
    }

    /// Transition to signed-out
    pub fn sign_out(&self) {
        if self.sender.borrow().user().is_some() {
            tracing::info!("Signed out");
        }
        self.sender.send_replace(SessionState::SignedOut);
    }

    /// Sign out if the current anonymous session has expired
    ///
    /// Returns true when a sign-out was forced. The caller runs this on a
    /// 1-second tick while an anonymous user is signed in.
    pub fn enforce_expiry(&self, now: DateTime<Utc>) -> bool {
        let expired = self
            .sender
            .borrow()
            .user()
            .map(|user| user.is_expired(now))
            .unwrap_or(false);

        if expired {
            tracing::info!("Anonymous session expired; forcing sign-out");
            self.sender.send_replace(SessionState::SignedOut);
        }
        expired
    }
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new()
    }
}
