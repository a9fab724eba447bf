//! Client session states and their transitions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a client session stands from the engine's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No tokens held.
    Anonymous,
    /// A login is being evaluated.
    Authenticating,
    /// Holding a usable access token.
    Authenticated,
    /// Exchanging a refresh token after the access token expired.
    Refreshing,
    /// Tokens are dead; the client must log in again.
    RevokedOrExpired,
}

/// Inputs that move a session between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEvent {
    LoginRequested,
    LoginSucceeded,
    LoginFailed,
    AccessValid,
    AccessExpired,
    RefreshSucceeded,
    RefreshFailed,
    AccessRevoked,
    LoggedOut,
    Reset,
}

impl SessionState {
    /// The state reached by applying `event`, or `None` if the event is
    /// not accepted in this state.
    pub fn next(self, event: SessionEvent) -> Option<Self> {
        use SessionEvent as E;
        use SessionState as S;

        match (self, event) {
            (S::Anonymous, E::LoginRequested) => Some(S::Authenticating),
            (S::Authenticating, E::LoginSucceeded) => Some(S::Authenticated),
            (S::Authenticating, E::LoginFailed) => Some(S::Anonymous),
            (S::Authenticated, E::AccessValid) => Some(S::Authenticated),
            (S::Authenticated, E::AccessExpired) => Some(S::Refreshing),
            (S::Authenticated, E::AccessRevoked) => Some(S::RevokedOrExpired),
            (S::Authenticated, E::LoggedOut) => Some(S::Anonymous),
            (S::Refreshing, E::RefreshSucceeded) => Some(S::Authenticated),
            (S::Refreshing, E::RefreshFailed) => Some(S::RevokedOrExpired),
            (S::RevokedOrExpired, E::Reset) => Some(S::Anonymous),
            _ => None,
        }
    }

    /// Applies `events` in order. `None` if any step is rejected.
    pub fn replay(self, events: &[SessionEvent]) -> Option<Self> {
        events
            .iter()
            .try_fold(self, |state, event| state.next(*event))
    }

    /// Whether the session can only leave this state by starting over.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::RevokedOrExpired)
    }

    /// Return the state as a lowercase snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::Authenticating => "authenticating",
            Self::Authenticated => "authenticated",
            Self::Refreshing => "refreshing",
            Self::RevokedOrExpired => "revoked_or_expired",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
