//! Fixed-size receive buffer owned by a session.
//!
//! The buffer is allocated once and reused across every read. Before each
//! read it is zero-filled in full, so bytes from an earlier (longer) response
//! can never show up in a later (shorter) one.
//!
//! ## Terminator Handling
//!
//! A read never fills the last byte of the buffer, so the received data is
//! always followed by at least one zero byte. The text view of a chunk stops
//! at the first zero byte; the raw view keeps the true length.

use bytes::Bytes;
use std::borrow::Cow;
use std::io::{self, Read};

/// Capacity of the receive buffer in bytes.
pub const RECEIVE_BUFFER_CAPACITY: usize = 4086;

/// Maximum number of bytes a single read may return.
pub const MAX_CHUNK_LEN: usize = RECEIVE_BUFFER_CAPACITY - 1;

/// Session-owned scratch space for single-chunk reads.
pub struct ReceiveBuffer {
    data: Box<[u8]>,
}

impl ReceiveBuffer {
    /// Allocate a zeroed buffer of `RECEIVE_BUFFER_CAPACITY` bytes.
    pub fn new() -> Self {
        Self {
            data: vec![0u8; RECEIVE_BUFFER_CAPACITY].into_boxed_slice(),
        }
    }

    /// Total buffer size, including the reserved terminator byte.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Zero every byte of the buffer.
    pub fn zero(&mut self) {
        self.data.fill(0);
    }

    /// Raw buffer contents, including any zero padding.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Zero-fill the buffer, then perform exactly one read from `reader`.
    ///
    /// No attempt is made to drain more than one chunk. A response larger than
    /// `MAX_CHUNK_LEN` needs further calls. On error the buffer is zeroed
    /// again so nothing from a failed read survives.
    pub fn fill_from<R: Read>(&mut self, reader: &mut R) -> io::Result<Chunk> {
        self.zero();

        match reader.read(&mut self.data[..MAX_CHUNK_LEN]) {
            Ok(n) => Ok(Chunk::new(Bytes::copy_from_slice(&self.data[..n]))),
            Err(e) => {
                self.zero();
                Err(e)
            }
        }
    }
}

impl Default for ReceiveBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Bytes returned by one read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    data: Bytes,
    /// Offset of the first zero byte, if any.
    terminator: Option<usize>,
}

impl Chunk {
    /// Wrap received bytes.
    pub fn new(data: Bytes) -> Self {
        let terminator = data.iter().position(|&b| b == 0);
        Self { data, terminator }
    }

    /// The bytes exactly as received.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume the chunk, returning the received bytes.
    pub fn into_bytes(self) -> Bytes {
        self.data
    }

    /// Number of bytes received.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the read returned zero bytes (peer closed its side).
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// True when an embedded zero byte hides part of the received data from
    /// the text view.
    pub fn is_truncated(&self) -> bool {
        self.terminator.is_some()
    }

    /// Text interpretation: everything before the first zero byte, decoded
    /// as UTF-8 with invalid sequences replaced.
    ///
    /// The result holds at most `MAX_CHUNK_LEN` characters, not bytes: each
    /// invalid byte becomes U+FFFD, which is three bytes long in UTF-8.
    pub fn text(&self) -> Cow<'_, str> {
        let end = self.terminator.unwrap_or(self.data.len());
        String::from_utf8_lossy(&self.data[..end])
    }
}
