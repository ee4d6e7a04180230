//! Blocking TCP sessions.
//!
//! Shared pieces:
//! - `ReceiveBuffer`: fixed-size, zero-filled scratch space for reads
//! - `SessionState`: Idle / Connected / Closed state machine
//! - `Session`: one socket plus its buffer, with connect/write/read/disconnect
//! - `SessionRegistry`: several sessions addressed by opaque ids

mod buffer;
mod error;
mod registry;
mod socket;
mod state;

#[cfg(test)]
pub(crate) mod testutil;

pub use buffer::{Chunk, ReceiveBuffer, MAX_CHUNK_LEN, RECEIVE_BUFFER_CAPACITY};
pub use error::{ErrorKind, SessionError};
pub use registry::{SessionId, SessionRegistry};
pub use socket::Session;
pub use state::SessionState;
