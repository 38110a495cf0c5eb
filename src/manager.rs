use std::collections::HashMap;
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Mutex;
use std::time::Duration;

use ssh2::Session;

use crate::error::Error;
use crate::hosts::HostRecord;

/// Bounded dial timeout; the original design's 10 seconds.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Read/write timeout on the underlying stream so a hung remote command
/// errors out instead of blocking a worker forever. Interactive sessions run
/// the session in non-blocking mode, so idle shells are unaffected.
const IO_TIMEOUT: Duration = Duration::from_secs(30);

/// Keepalive interval configured at handshake time; also what makes the
/// liveness probe actually transmit.
const KEEPALIVE_INTERVAL_SECS: u32 = 30;

/// What the manager needs from a live connection: a cheap handle clone, a
/// liveness probe, and a terminator. `ssh2::Session` is the production
/// transport; tests substitute a scripted one.
pub trait Transport: Clone {
    /// Lightweight request confirming the connection is still usable.
    fn probe(&self) -> bool;

    /// Tear the connection down. The manager calls this exactly once per
    /// handle it drops; idempotence across handles is the manager's job.
    fn terminate(&self, reason: &str);
}

impl Transport for Session {
    fn probe(&self) -> bool {
        self.keepalive_send().is_ok()
    }

    fn terminate(&self, reason: &str) {
        let _ = self.disconnect(None, reason, None);
    }
}

/// Owns zero-or-one live connection per host id.
///
/// The map is the only shared mutable state in the process; one mutex guards
/// the whole check-probe-create-register sequence so concurrent calls for the
/// same host can never race two transports into existence. `ssh2::Session` is
/// a handle over shared inner state, so the clone handed back by `connect` is
/// the same managed connection, not a copy.
pub struct ConnectionManager<T: Transport = Session> {
    sessions: Mutex<HashMap<String, T>>,
}

impl<T: Transport> ConnectionManager<T> {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Probe-or-dial under one lock. Reuses the registered connection when
    /// its probe succeeds; otherwise terminates the stale one (once) and
    /// registers whatever `dial` produces. On dial failure nothing is
    /// registered.
    fn connect_with(
        &self,
        host: &HostRecord,
        dial: impl FnOnce(&HostRecord) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let mut sessions = self.lock();

        if let Some(session) = sessions.get(&host.id) {
            if session.probe() {
                return Ok(session.clone());
            }
            // Probe failed: the transport is dead. Drop it and dial fresh.
            if let Some(stale) = sessions.remove(&host.id) {
                stale.terminate("connection superseded");
            }
        }

        let session = dial(host)?;
        sessions.insert(host.id.clone(), session.clone());
        Ok(session)
    }

    /// Terminate and forget the connection for `id`. No-op if absent.
    pub fn close(&self, id: &str) {
        if let Some(session) = self.lock().remove(id) {
            session.terminate("closed by operator");
        }
    }

    /// Terminate every managed connection. Called once at shutdown.
    pub fn close_all(&self) {
        for (_, session) in self.lock().drain() {
            session.terminate("shutting down");
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, T>> {
        // A poisoned map just means a worker panicked mid-insert; the entries
        // themselves are still valid handles.
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ConnectionManager<Session> {
    /// Return the managed session for `host`, dialing a new one if there is
    /// none or the existing one fails its liveness probe.
    ///
    /// Blocking, potentially slow: dialing and probing are real network I/O.
    pub fn connect(&self, host: &HostRecord) -> Result<Session, Error> {
        self.connect_with(host, dial)
    }
}

/// Dial a fresh transport: resolve, TCP connect with timeout, SSH handshake,
/// password auth.
///
/// The remote host's identity is accepted unconditionally -- no host-key
/// verification. That matches the system this replaces, but it is a real
/// security caveat: anyone who can intercept the TCP connection can
/// impersonate the host.
fn dial(host: &HostRecord) -> Result<Session, Error> {
    let addr = host.addr();
    let sock_addr = addr
        .to_socket_addrs()
        .map_err(|e| Error::dial(&addr, e))?
        .next()
        .ok_or_else(|| Error::dial(&addr, "address did not resolve"))?;

    let tcp = TcpStream::connect_timeout(&sock_addr, CONNECT_TIMEOUT)
        .map_err(|e| Error::dial(&addr, e))?;
    let _ = tcp.set_read_timeout(Some(IO_TIMEOUT));
    let _ = tcp.set_write_timeout(Some(IO_TIMEOUT));

    let mut session = Session::new().map_err(|e| Error::dial(&addr, e))?;
    session.set_tcp_stream(tcp);
    session
        .handshake()
        .map_err(|e| Error::dial(&addr, format!("handshake failed: {e}")))?;

    session
        .userauth_password(&host.user, &host.password)
        .map_err(|e| Error::dial(&addr, format!("auth failed for '{}': {e}", host.user)))?;
    if !session.authenticated() {
        return Err(Error::dial(&addr, "authentication rejected"));
    }

    session.set_keepalive(true, KEEPALIVE_INTERVAL_SECS);
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Scripted transport: probe reads a flag, terminate is counted.
    #[derive(Clone)]
    struct FakeConn {
        serial: usize,
        alive: Arc<AtomicBool>,
        terminations: Arc<AtomicUsize>,
    }

    impl FakeConn {
        fn new(serial: usize) -> Self {
            Self {
                serial,
                alive: Arc::new(AtomicBool::new(true)),
                terminations: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl Transport for FakeConn {
        fn probe(&self) -> bool {
            self.alive.load(Ordering::SeqCst)
        }

        fn terminate(&self, _reason: &str) {
            self.terminations.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn host(id: &str) -> HostRecord {
        HostRecord {
            id: id.into(),
            name: format!("Host {id}"),
            host: "10.0.0.1".into(),
            port: 22,
            user: "ops".into(),
            password: "x".into(),
        }
    }

    #[test]
    fn test_connect_twice_reuses_connection() {
        let manager = ConnectionManager::<FakeConn>::new();
        let web = host("web-1");
        let mut dials = 0;

        let first = manager
            .connect_with(&web, |_| {
                dials += 1;
                Ok(FakeConn::new(1))
            })
            .unwrap();
        let second = manager
            .connect_with(&web, |_| {
                dials += 1;
                Ok(FakeConn::new(2))
            })
            .unwrap();

        assert_eq!(dials, 1);
        assert_eq!(second.serial, first.serial);
        // Same managed connection, not an equal-looking copy.
        assert!(Arc::ptr_eq(&first.alive, &second.alive));
    }

    #[test]
    fn test_failed_probe_reconnects_and_closes_old_once() {
        let manager = ConnectionManager::<FakeConn>::new();
        let web = host("web-1");

        let first = manager.connect_with(&web, |_| Ok(FakeConn::new(1))).unwrap();
        first.alive.store(false, Ordering::SeqCst);

        let second = manager.connect_with(&web, |_| Ok(FakeConn::new(2))).unwrap();
        assert_ne!(second.serial, first.serial);
        assert_eq!(first.terminations.load(Ordering::SeqCst), 1);

        // The replacement is reused and the dead one isn't touched again.
        let third = manager
            .connect_with(&web, |_| panic!("dial not expected"))
            .unwrap();
        assert_eq!(third.serial, second.serial);
        assert_eq!(first.terminations.load(Ordering::SeqCst), 1);
        assert_eq!(second.terminations.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_dial_failure_registers_nothing() {
        let manager = ConnectionManager::<FakeConn>::new();
        let web = host("web-1");
        let err = manager
            .connect_with(&web, |h| Err(Error::dial(h.addr(), "refused")))
            .err()
            .expect("dial must fail");
        assert!(matches!(err, Error::Dial { .. }));
        assert!(manager.lock().is_empty());
    }

    #[test]
    fn test_close_terminates_once_and_is_idempotent() {
        let manager = ConnectionManager::<FakeConn>::new();
        let web = host("web-1");
        let conn = manager.connect_with(&web, |_| Ok(FakeConn::new(1))).unwrap();

        manager.close("web-1");
        manager.close("web-1");
        assert_eq!(conn.terminations.load(Ordering::SeqCst), 1);
        assert!(manager.lock().is_empty());
    }

    #[test]
    fn test_close_absent_is_noop() {
        let manager = ConnectionManager::<FakeConn>::new();
        manager.close("nope");
        manager.close("nope");
        assert!(manager.lock().is_empty());
    }

    #[test]
    fn test_close_all_terminates_every_connection() {
        let manager = ConnectionManager::<FakeConn>::new();
        let a = manager.connect_with(&host("a"), |_| Ok(FakeConn::new(1))).unwrap();
        let b = manager.connect_with(&host("b"), |_| Ok(FakeConn::new(2))).unwrap();

        manager.close_all();
        assert_eq!(a.terminations.load(Ordering::SeqCst), 1);
        assert_eq!(b.terminations.load(Ordering::SeqCst), 1);
        assert!(manager.lock().is_empty());
    }

    #[test]
    fn test_connect_unresolvable_is_dial_error() {
        let manager = ConnectionManager::new();
        let bad = HostRecord {
            id: "bad".into(),
            name: "Bad".into(),
            host: "host.invalid.".into(),
            port: 22,
            user: "ops".into(),
            password: "x".into(),
        };
        let err = manager.connect(&bad).err().expect("dial must fail");
        assert!(matches!(err, Error::Dial { .. }));
        // Nothing registered on failure.
        assert!(manager.lock().is_empty());
    }
}
