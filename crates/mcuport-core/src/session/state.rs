//! Session state machine and the busy guard

use crate::console::OutputSink;
use crate::port::Port;
use crate::remote::Remote;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// Lifecycle state of a [`Session`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not connected; terminal state
    Closed,
    /// Connection attempt in progress
    Opening,
    /// Connected and idle
    Open,
    /// An operation currently holds the session
    Busy,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Closed => "closed",
            Self::Opening => "opening",
            Self::Open => "open",
            Self::Busy => "busy",
        };
        f.write_str(name)
    }
}

/// The session is not in a state that accepts an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotReady(pub SessionState);

/// Live binding between a port, its output sink and the board's remote
pub struct Session {
    port: Port,
    sink: Arc<dyn OutputSink>,
    state: Mutex<SessionState>,
    remote: Mutex<Option<Box<dyn Remote>>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("port", &self.port)
            .field("state", &self.state())
            .finish()
    }
}

impl Session {
    /// New session in the `Opening` state
    pub(crate) fn opening(port: Port, sink: Arc<dyn OutputSink>) -> Self {
        Self {
            port,
            sink,
            state: Mutex::new(SessionState::Opening),
            remote: Mutex::new(None),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_remote(&self) -> MutexGuard<'_, Option<Box<dyn Remote>>> {
        self.remote.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Port this session is bound to
    pub fn port(&self) -> &Port {
        &self.port
    }

    /// Output sink this session is bound to
    pub fn sink(&self) -> &Arc<dyn OutputSink> {
        &self.sink
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        *self.lock_state()
    }

    /// Whether the session is connected (idle or busy)
    pub fn is_live(&self) -> bool {
        matches!(self.state(), SessionState::Open | SessionState::Busy)
    }

    /// Hand the connected remote to the session (`Opening` → `Open`).
    ///
    /// Returns `false` and closes the remote if the session was stopped while
    /// the connection was being established.
    pub(crate) fn attach(&self, mut remote: Box<dyn Remote>) -> bool {
        let mut state = self.lock_state();
        if *state != SessionState::Opening {
            drop(state);
            remote.close();
            return false;
        }
        *self.lock_remote() = Some(remote);
        *state = SessionState::Open;
        true
    }

    /// Claim the session for one operation (`Open` → `Busy`)
    ///
    /// The session returns to `Open` when the guard is dropped.
    pub fn begin(&self) -> Result<BusyGuard<'_>, NotReady> {
        {
            let mut state = self.lock_state();
            if *state != SessionState::Open {
                return Err(NotReady(*state));
            }
            *state = SessionState::Busy;
        }

        let remote = self.lock_remote();
        if remote.is_none() {
            // stopped between the state change and taking the remote
            let mut state = self.lock_state();
            if *state == SessionState::Busy {
                *state = SessionState::Closed;
            }
            return Err(NotReady(*state));
        }

        Ok(BusyGuard {
            session: self,
            remote,
        })
    }

    /// Close the session and release the remote
    ///
    /// Blocks until an operation in flight has released the remote.
    pub(crate) fn stop(&self) {
        let previous = std::mem::replace(&mut *self.lock_state(), SessionState::Closed);
        if previous == SessionState::Closed {
            return;
        }
        log::debug!("{}: session {} -> closed", self.port, previous);

        if let Some(mut remote) = self.lock_remote().take() {
            remote.close();
        }
    }
}

/// Exclusive use of a session's remote for the duration of one operation
pub struct BusyGuard<'a> {
    session: &'a Session,
    remote: MutexGuard<'a, Option<Box<dyn Remote>>>,
}

impl BusyGuard<'_> {
    /// The connected remote
    pub fn remote(&mut self) -> &mut dyn Remote {
        match self.remote.as_mut() {
            Some(remote) => remote.as_mut(),
            // begin() only hands out a guard while the remote is present and
            // stop() cannot take it while the guard holds the lock
            None => unreachable!("busy session without a remote"),
        }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.session.lock_state();
        if *state == SessionState::Busy {
            *state = SessionState::Open;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeRemote, RecordingSink};

    fn open_session() -> Session {
        let session = Session::opening(Port::new("/dev/ttyUSB0"), RecordingSink::new());
        assert!(session.attach(Box::new(FakeRemote::default())));
        session
    }

    #[test]
    fn test_lifecycle() {
        let session = Session::opening(Port::new("/dev/ttyUSB0"), RecordingSink::new());
        assert_eq!(session.state(), SessionState::Opening);
        assert_eq!(session.begin().err(), Some(NotReady(SessionState::Opening)));

        assert!(session.attach(Box::new(FakeRemote::default())));
        assert_eq!(session.state(), SessionState::Open);

        {
            let mut busy = session.begin().unwrap();
            assert_eq!(session.state(), SessionState::Busy);
            assert!(busy.remote().list().is_ok());
        }
        assert_eq!(session.state(), SessionState::Open);

        session.stop();
        assert_eq!(session.state(), SessionState::Closed);
        assert!(!session.is_live());
    }

    #[test]
    fn test_busy_session_rejects_second_operation() {
        let session = open_session();
        let _busy = session.begin().unwrap();
        assert_eq!(session.begin().err(), Some(NotReady(SessionState::Busy)));
    }

    #[test]
    fn test_attach_after_stop_closes_remote() {
        let session = Session::opening(Port::new("COM3"), RecordingSink::new());
        session.stop();

        let remote = FakeRemote::default();
        let closed = remote.closed.clone();
        assert!(!session.attach(Box::new(remote)));
        assert!(closed.load(std::sync::atomic::Ordering::SeqCst));
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[test]
    fn test_stop_closes_remote() {
        let session = Session::opening(Port::new("COM3"), RecordingSink::new());
        let remote = FakeRemote::default();
        let closed = remote.closed.clone();
        assert!(session.attach(Box::new(remote)));

        session.stop();
        assert!(closed.load(std::sync::atomic::Ordering::SeqCst));
        assert_eq!(session.begin().err(), Some(NotReady(SessionState::Closed)));
    }
}
