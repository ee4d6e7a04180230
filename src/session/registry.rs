//! Registry of independent sessions using slab allocation.
//!
//! Lets one process hold several connections at once, each addressed by an
//! opaque `SessionId` instead of a shared global.

use super::error::SessionError;
use super::socket::Session;
use slab::Slab;
use tracing::debug;

/// Opaque handle to a session in a `SessionRegistry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(usize);

/// Table of open sessions.
///
/// Provides O(1) insert, lookup, and remove operations. Dropping the
/// registry closes every session it still holds.
pub struct SessionRegistry {
    sessions: Slab<Session>,
    max_sessions: Option<usize>,
}

impl SessionRegistry {
    /// Create an unbounded registry.
    pub fn new() -> Self {
        Self {
            sessions: Slab::new(),
            max_sessions: None,
        }
    }

    /// Create a registry that refuses to hold more than `max_sessions`.
    pub fn with_limit(max_sessions: usize) -> Self {
        Self {
            sessions: Slab::with_capacity(max_sessions),
            max_sessions: Some(max_sessions),
        }
    }

    /// Connect a fresh session and store it.
    pub fn open(&mut self, host: &str, port: u16) -> Result<SessionId, SessionError> {
        if let Some(max) = self.max_sessions {
            if self.sessions.len() >= max {
                return Err(SessionError::RegistryFull(max));
            }
        }

        let mut session = Session::new();
        session.connect(host, port)?;
        let id = SessionId(self.sessions.insert(session));
        debug!(id = id.0, host, port, "Session opened");
        Ok(id)
    }

    /// Get an immutable reference to a session.
    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(id.0)
    }

    /// Get a mutable reference to a session.
    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.sessions.get_mut(id.0)
    }

    /// Disconnect and remove a session. Returns false for an unknown id.
    pub fn close(&mut self, id: SessionId) -> bool {
        match self.sessions.try_remove(id.0) {
            Some(mut session) => {
                session.disconnect();
                debug!(id = id.0, "Session closed");
                true
            }
            None => false,
        }
    }

    /// Disconnect and remove every session.
    pub fn close_all(&mut self) {
        for mut session in self.sessions.drain() {
            session.disconnect();
        }
    }

    /// Check if a session exists.
    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions.contains(id.0)
    }

    /// Number of open sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Check if there are no sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
