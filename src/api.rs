//! Four-function calling convention over a process-wide default session.
//!
//! Callers that receive loosely typed arguments (a host runtime, a script
//! bridge) pass them as `Value`s. Arguments are validated before any socket
//! is touched. All four functions act on one shared `Session` guarded by a
//! mutex, so concurrent callers are serialised rather than interleaved.
//!
//! The first use registers a process-exit hook that disconnects the default
//! session, so its descriptor is released even if `disconnect` is never
//! called. Code that wants several connections should use
//! `SessionRegistry` or `Session` directly instead.

use crate::session::{Session, SessionError, SessionState};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError, TryLockError};
use tracing::{debug, warn};

const CONNECT_ARGS: &str = "Connect() requires 2 arguments";
const CONNECT_HOST: &str = "Connect() argument 1 must be an IP or domain name";
const CONNECT_PORT: &str = "Connect() argument 2 must be a port number";
const WRITE_ARGS: &str = "Write() requires 1 argument";
const WRITE_DATA: &str = "Write() requires a string argument";

static DEFAULT_SESSION: OnceLock<Mutex<Session>> = OnceLock::new();

/// A loosely typed argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Number(f64),
    Bool(bool),
    Null,
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<u16> for Value {
    fn from(n: u16) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// `Connect(host, port)`: connect the default session.
///
/// Returns the socket descriptor. A fractional port is truncated.
pub fn connect(args: &[Value]) -> Result<i32, SessionError> {
    let [host, port, ..] = args else {
        return Err(SessionError::MissingArguments(CONNECT_ARGS));
    };
    let Value::String(host) = host else {
        return Err(SessionError::InvalidArgument(CONNECT_HOST));
    };
    let port = port_from(port)?;

    default_session().connect(host, port)
}

/// `Write(data)`: write a string to the default session in one call.
pub fn write(args: &[Value]) -> Result<usize, SessionError> {
    let Some(data) = args.first() else {
        return Err(SessionError::MissingArguments(WRITE_ARGS));
    };
    let Value::String(data) = data else {
        return Err(SessionError::InvalidArgument(WRITE_DATA));
    };

    default_session().write(data)
}

/// `Read()`: read one chunk from the default session as text.
///
/// The text stops at the first zero byte in the received data.
pub fn read() -> Result<String, SessionError> {
    let chunk = default_session().read()?;
    Ok(chunk.text().into_owned())
}

/// `Disconnect()`: release the default session. Never fails.
pub fn disconnect() {
    default_session().disconnect();
}

/// State of the default session.
pub fn state() -> SessionState {
    default_session().state()
}

fn port_from(value: &Value) -> Result<u16, SessionError> {
    match value {
        Value::Number(n) if n.is_finite() => {
            let port = n.trunc();
            if (0.0..=f64::from(u16::MAX)).contains(&port) {
                Ok(port as u16)
            } else {
                Err(SessionError::InvalidArgument(CONNECT_PORT))
            }
        }
        _ => Err(SessionError::InvalidArgument(CONNECT_PORT)),
    }
}

fn default_session() -> MutexGuard<'static, Session> {
    DEFAULT_SESSION
        .get_or_init(|| {
            register_exit_hook();
            Mutex::new(Session::new())
        })
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

fn register_exit_hook() {
    // SAFETY: `release_at_exit` takes no arguments and does not unwind.
    let rc = unsafe { libc::atexit(release_at_exit) };
    if rc != 0 {
        warn!("Failed to register process-exit teardown");
    }
}

/// Disconnect the default session while the process exits.
extern "C" fn release_at_exit() {
    let Some(session) = DEFAULT_SESSION.get() else {
        return;
    };

    // A caller still holding the lock at exit keeps its socket; the OS
    // reclaims it with the process.
    let mut session = match session.try_lock() {
        Ok(guard) => guard,
        Err(TryLockError::Poisoned(e)) => e.into_inner(),
        Err(TryLockError::WouldBlock) => return,
    };

    if session.is_connected() {
        debug!("Process exiting, releasing default session");
        session.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testutil;
    use std::io::{Read, Write};
    use std::sync::mpsc;

    // The default session is shared by every test in this module.
    static SERIAL: Mutex<()> = Mutex::new(());

    fn serial() -> MutexGuard<'static, ()> {
        let guard = SERIAL.lock().unwrap_or_else(PoisonError::into_inner);
        disconnect();
        guard
    }

    #[test]
    fn test_connect_requires_two_arguments() {
        let _guard = serial();

        let err = connect(&[Value::from("127.0.0.1")]).unwrap_err();
        assert!(matches!(err, SessionError::MissingArguments(_)));
        assert_eq!(err.to_string(), "Connect() requires 2 arguments");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_connect_rejects_non_string_host() {
        let _guard = serial();

        let err = connect(&[Value::Number(127.0), Value::from(9001u16)]).unwrap_err();
        assert!(err.is_type_error());
        assert_eq!(
            err.to_string(),
            "Connect() argument 1 must be an IP or domain name"
        );
        assert!(!state().is_connected());
    }

    #[test]
    fn test_connect_rejects_bad_port() {
        let _guard = serial();

        for port in [
            Value::from("9001"),
            Value::Null,
            Value::Bool(true),
            Value::Number(f64::NAN),
            Value::Number(70000.0),
            Value::Number(-1.0),
        ] {
            let err = connect(&[Value::from("127.0.0.1"), port]).unwrap_err();
            assert!(err.is_type_error());
            assert_eq!(err.to_string(), "Connect() argument 2 must be a port number");
        }
        assert!(!state().is_connected());
    }

    #[test]
    fn test_write_argument_checks() {
        let _guard = serial();

        assert!(matches!(
            write(&[]),
            Err(SessionError::MissingArguments(WRITE_ARGS))
        ));
        assert!(matches!(
            write(&[Value::Number(1.0)]),
            Err(SessionError::InvalidArgument(WRITE_DATA))
        ));
    }

    #[test]
    fn test_read_without_connect() {
        let _guard = serial();

        assert!(matches!(read(), Err(SessionError::NotConnected("Read"))));
        assert!(matches!(
            write(&[Value::from("ping")]),
            Err(SessionError::NotConnected("Write"))
        ));
    }

    #[test]
    fn test_round_trip_with_fractional_port() {
        let _guard = serial();
        let (addr, server) = testutil::serve(|mut stream| {
            let mut buf = [0u8; 4];
            stream.read_exact(&mut buf).unwrap();
            assert_eq!(&buf, b"ping");
            stream.write_all(b"pong").unwrap();
        });

        let port = f64::from(addr.port()) + 0.7;
        let fd = connect(&[Value::from("127.0.0.1"), Value::Number(port)]).unwrap();
        assert!(fd >= 0);
        assert!(state().is_connected());

        assert_eq!(write(&[Value::from("ping")]).unwrap(), 4);
        assert_eq!(read().unwrap(), "pong");

        disconnect();
        disconnect();
        assert!(!state().is_connected());
        server.join().unwrap();
    }

    #[test]
    fn test_connect_refused() {
        let _guard = serial();
        let port = testutil::closed_port();

        let err = connect(&[Value::from("127.0.0.1"), Value::from(port)]).unwrap_err();
        assert!(matches!(err, SessionError::Connect { .. }));
        assert!(!state().is_connected());
    }

    #[test]
    fn test_exit_hook_releases_socket() {
        let _guard = serial();
        let (tx, rx) = mpsc::channel();
        let (addr, server) = testutil::serve(move |mut stream| {
            let mut sink = Vec::new();
            let n = stream.read_to_end(&mut sink).unwrap_or(0);
            tx.send(n).unwrap();
        });

        connect(&[Value::from("127.0.0.1"), Value::from(addr.port())]).unwrap();
        release_at_exit();

        assert_eq!(rx.recv().unwrap(), 0);
        assert!(!state().is_connected());
        server.join().unwrap();
    }
}
