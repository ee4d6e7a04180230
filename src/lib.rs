//! fslink: a minimal blocking TCP client.
//!
//! Opens one outbound connection, writes text to it, reads bounded chunks
//! back and tears the connection down. There is no framing: bytes pass
//! through verbatim.
//!
//! Features:
//! - `Session`: connect / write / read / disconnect on one socket
//! - Fixed 4086-byte receive buffer, zero-filled before every read
//! - Text view truncated at the first zero byte, raw bytes kept alongside
//! - `SessionRegistry` for several independent sessions
//! - `api`: loosely typed four-function surface over a process-wide session

pub mod api;
pub mod config;
pub mod session;

pub use session::{Chunk, Session, SessionError, SessionRegistry, SessionState};
