//! Session error taxonomy.

use std::io;
use std::net::SocketAddr;

/// Broad class of a session error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Wrong argument count or type. No OS call was attempted.
    Argument,
    /// Socket creation or name resolution failed.
    Resource,
    /// A connect, write or read syscall failed.
    Io,
    /// The operation is not valid in the current session state.
    State,
}

/// Errors returned by session operations.
#[derive(Debug)]
pub enum SessionError {
    /// Fewer arguments than the operation requires.
    MissingArguments(&'static str),
    /// An argument has the wrong type or an unusable value.
    InvalidArgument(&'static str),
    /// The OS refused to create a socket.
    SocketCreate(io::Error),
    /// Name resolution failed.
    Resolve { host: String, source: io::Error },
    /// Name resolution succeeded but produced no address.
    NoAddress { host: String },
    /// The connect syscall failed (refused, unreachable, timed out).
    Connect { addr: SocketAddr, source: io::Error },
    /// The write syscall failed.
    Write(io::Error),
    /// The read syscall failed.
    Read(io::Error),
    /// Write or read attempted without a live connection.
    NotConnected(&'static str),
    /// The registry holds its maximum number of sessions.
    RegistryFull(usize),
}

impl SessionError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::MissingArguments(_) | SessionError::InvalidArgument(_) => {
                ErrorKind::Argument
            }
            SessionError::SocketCreate(_)
            | SessionError::Resolve { .. }
            | SessionError::NoAddress { .. }
            | SessionError::RegistryFull(_) => ErrorKind::Resource,
            SessionError::Connect { .. } | SessionError::Write(_) | SessionError::Read(_) => {
                ErrorKind::Io
            }
            SessionError::NotConnected(_) => ErrorKind::State,
        }
    }

    /// Whether retrying (possibly after a fresh connect) may succeed.
    ///
    /// Argument errors will fail the same way every time.
    pub fn is_recoverable(&self) -> bool {
        self.kind() != ErrorKind::Argument
    }

    /// True for the argument-type subset of argument errors.
    pub fn is_type_error(&self) -> bool {
        matches!(self, SessionError::InvalidArgument(_))
    }
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::MissingArguments(msg) | SessionError::InvalidArgument(msg) => {
                write!(f, "{msg}")
            }
            SessionError::SocketCreate(e) => write!(f, "Connect# socket opening error: {e}"),
            SessionError::Resolve { host, source } => {
                write!(f, "Connect# failed to resolve '{host}': {source}")
            }
            SessionError::NoAddress { host } => {
                write!(f, "Connect# no address found for '{host}'")
            }
            SessionError::Connect { source, .. } => write!(f, "{source}"),
            SessionError::Write(e) | SessionError::Read(e) => write!(f, "{e}"),
            SessionError::NotConnected(op) => write!(f, "{op}# not connected"),
            SessionError::RegistryFull(max) => {
                write!(f, "session registry is full ({max} sessions)")
            }
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::SocketCreate(e)
            | SessionError::Write(e)
            | SessionError::Read(e)
            | SessionError::Resolve { source: e, .. }
            | SessionError::Connect { source: e, .. } => Some(e),
            _ => None,
        }
    }
}
