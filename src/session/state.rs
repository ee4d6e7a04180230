//! Connection state machine for a session.
//!
//! A session starts `Idle`, becomes `Connected` after a successful connect,
//! and moves to `Closed` on disconnect or after an I/O failure. A closed
//! session may connect again.

use super::error::SessionError;
use std::net::SocketAddr;
use std::os::unix::io::RawFd;

/// Current state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Never connected.
    #[default]
    Idle,
    /// Holding a live socket.
    Connected {
        /// Descriptor of the socket.
        fd: RawFd,
        /// Address the socket is connected to.
        peer: SocketAddr,
    },
    /// Previously connected, now released.
    Closed,
}

impl SessionState {
    /// Transition to the connected state.
    pub fn connect(&mut self, fd: RawFd, peer: SocketAddr) {
        *self = SessionState::Connected { fd, peer };
    }

    /// Release the connection. `Idle` stays `Idle`.
    pub fn close(&mut self) {
        if self.is_connected() {
            *self = SessionState::Closed;
        }
    }

    /// Check if a live socket is held.
    pub fn is_connected(&self) -> bool {
        matches!(self, SessionState::Connected { .. })
    }

    /// Fail with `NotConnected` unless a live socket is held.
    pub fn require_connected(&self, op: &'static str) -> Result<(), SessionError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(SessionError::NotConnected(op))
        }
    }
}
