//! A single outbound TCP session.
//!
//! `Session` owns one blocking socket and one receive buffer. Every
//! operation is a single syscall (or resolve + connect for `connect`) and
//! blocks until the OS returns; there is no timeout, retry or continuation.
//!
//! ## Lifecycle
//!
//! ```text
//! Idle --connect--> Connected --disconnect / I/O error--> Closed
//!                      ^                                    |
//!                      +---------------connect--------------+
//! ```
//!
//! Connecting while already connected closes the old socket first. Dropping
//! the session releases the socket just like `disconnect`.

use super::buffer::{Chunk, ReceiveBuffer};
use super::error::SessionError;
use super::state::SessionState;
use socket2::Socket;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::os::unix::io::{AsRawFd, RawFd};
use tracing::{debug, info, trace, warn};

/// One outbound connection plus its receive buffer.
pub struct Session {
    state: SessionState,
    socket: Option<Socket>,
    buffer: ReceiveBuffer,
    remote_host: Option<String>,
    remote_port: Option<u16>,
}

impl Session {
    /// Create an idle session with a freshly allocated receive buffer.
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            socket: None,
            buffer: ReceiveBuffer::new(),
            remote_host: None,
            remote_port: None,
        }
    }

    /// Resolve `host`, open a TCP stream socket and connect it to `port`.
    ///
    /// Returns the socket descriptor. Any socket already held is closed
    /// before the new one is opened. On failure the half-open socket is
    /// closed and the session holds no connection.
    pub fn connect(&mut self, host: &str, port: u16) -> Result<RawFd, SessionError> {
        if self.socket.is_some() {
            debug!(
                host = self.remote_host.as_deref().unwrap_or_default(),
                port = self.remote_port.unwrap_or_default(),
                "Closing existing connection before reconnect"
            );
            self.release();
        }

        let addr = resolve(host, port)?;
        let socket = open_stream(addr)?;

        if let Err(source) = socket.connect(&addr.into()) {
            warn!(%addr, error = %source, "Connect failed");
            return Err(SessionError::Connect { addr, source });
        }

        let fd = socket.as_raw_fd();
        self.state.connect(fd, addr);
        self.socket = Some(socket);
        self.remote_host = Some(host.to_string());
        self.remote_port = Some(port);

        info!(host, port, %addr, fd, "Connected");
        Ok(fd)
    }

    /// Write the UTF-8 bytes of `data` with a single write call.
    ///
    /// Returns the number of bytes the OS accepted, which may be fewer than
    /// `data.len()`. No attempt is made to write the remainder.
    pub fn write(&mut self, data: &str) -> Result<usize, SessionError> {
        let result = send_once(self.live_socket("Write")?, data.as_bytes());

        match result {
            Ok(n) => {
                trace!(requested = data.len(), written = n, "Write");
                Ok(n)
            }
            Err(e) => {
                warn!(error = %e, "Write failed, closing session");
                self.release();
                Err(SessionError::Write(e))
            }
        }
    }

    /// Read one chunk of at most `MAX_CHUNK_LEN` bytes.
    ///
    /// The receive buffer is zero-filled first. An empty chunk means the
    /// peer closed its side. Larger responses need repeated calls.
    pub fn read(&mut self) -> Result<Chunk, SessionError> {
        self.state.require_connected("Read")?;
        let Some(socket) = self.socket.as_mut() else {
            return Err(SessionError::NotConnected("Read"));
        };

        match self.buffer.fill_from(socket) {
            Ok(chunk) => {
                trace!(len = chunk.len(), "Read");
                if chunk.is_truncated() {
                    debug!(len = chunk.len(), "Received data contains a zero byte");
                }
                Ok(chunk)
            }
            Err(e) => {
                warn!(error = %e, "Read failed, closing session");
                self.release();
                Err(SessionError::Read(e))
            }
        }
    }

    /// Close the socket if one is held. Safe to call at any time.
    pub fn disconnect(&mut self) {
        if self.socket.is_some() {
            debug!(
                host = self.remote_host.as_deref().unwrap_or_default(),
                port = self.remote_port.unwrap_or_default(),
                "Disconnecting"
            );
        }
        self.release();
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Check if a live socket is held.
    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// Host given to the last successful connect.
    pub fn remote_host(&self) -> Option<&str> {
        self.remote_host.as_deref()
    }

    /// Port given to the last successful connect.
    pub fn remote_port(&self) -> Option<u16> {
        self.remote_port
    }

    /// Resolved address of the live connection.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        match self.state {
            SessionState::Connected { peer, .. } => Some(peer),
            _ => None,
        }
    }

    /// Size of the receive buffer.
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    fn live_socket(&mut self, op: &'static str) -> Result<&mut Socket, SessionError> {
        self.state.require_connected(op)?;
        self.socket.as_mut().ok_or(SessionError::NotConnected(op))
    }

    /// Drop the socket (closing the descriptor) and reset to unconnected.
    fn release(&mut self) {
        self.socket = None;
        self.state.close();
        self.buffer.zero();
        self.remote_host = None;
        self.remote_port = None;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.socket.is_some() {
            debug!("Releasing connection on drop");
            self.release();
        }
    }
}

/// Resolve `host` to one address, preferring IPv4.
fn resolve(host: &str, port: u16) -> Result<SocketAddr, SessionError> {
    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|source| SessionError::Resolve {
            host: host.to_string(),
            source,
        })?
        .collect();

    addrs
        .iter()
        .find(|addr| addr.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
        .ok_or_else(|| SessionError::NoAddress {
            host: host.to_string(),
        })
}

/// Create a blocking TCP stream socket for the address family of `addr`.
fn open_stream(addr: SocketAddr) -> Result<Socket, SessionError> {
    let socket = Socket::new(
        match addr {
            SocketAddr::V4(_) => socket2::Domain::IPV4,
            SocketAddr::V6(_) => socket2::Domain::IPV6,
        },
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )
    .map_err(SessionError::SocketCreate)?;

    // No MSG_NOSIGNAL on Apple platforms; suppress SIGPIPE per socket instead.
    #[cfg(any(target_os = "macos", target_os = "ios"))]
    socket
        .set_nosigpipe(true)
        .map_err(SessionError::SocketCreate)?;

    Ok(socket)
}

/// One send call. A closed peer yields EPIPE, never SIGPIPE.
#[cfg(any(target_os = "linux", target_os = "android"))]
fn send_once(socket: &Socket, buf: &[u8]) -> io::Result<usize> {
    socket.send_with_flags(buf, libc::MSG_NOSIGNAL)
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn send_once(socket: &Socket, buf: &[u8]) -> io::Result<usize> {
    socket.send(buf)
}
