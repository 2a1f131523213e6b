//! Search supersession by session id.
//!
//! Every search registers a fresh token under its session id. Starting a new
//! search on the same session replaces the token, and the older search sees
//! the mismatch at its next checkpoint and gives up.

use std::collections::HashMap;

use parking_lot::Mutex;
use uuid::Uuid;

/// Latest token per session id.
#[derive(Debug, Default)]
pub struct SearchSessions {
    active: Mutex<HashMap<String, Uuid>>,
}

/// Handle held by one in-flight search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    session: String,
    token: Uuid,
}

impl SessionToken {
    pub fn session(&self) -> &str {
        &self.session
    }
}

impl SearchSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new search for `session`, superseding any earlier one.
    pub fn begin(&self, session: &str) -> SessionToken {
        let token = Uuid::new_v4();
        self.active.lock().insert(session.to_string(), token);
        SessionToken {
            session: session.to_string(),
            token,
        }
    }

    /// Returns `Some(())` while `token` is still the latest for its session.
    ///
    /// Enables `?` for early returns at checkpoints.
    #[inline]
    pub fn check(&self, token: &SessionToken) -> Option<()> {
        self.is_current(token).then_some(())
    }

    pub fn is_current(&self, token: &SessionToken) -> bool {
        self.active.lock().get(&token.session) == Some(&token.token)
    }

    /// Drops the session entry if `token` still owns it.
    pub fn finish(&self, token: &SessionToken) {
        let mut active = self.active.lock();
        if active.get(&token.session) == Some(&token.token) {
            active.remove(&token.session);
        }
    }

    /// Number of sessions with a search in flight.
    pub fn len(&self) -> usize {
        self.active.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.lock().is_empty()
    }
}
