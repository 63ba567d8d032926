//! Session manager: port resolution, exclusivity and reconnects

use super::state::{Session, SessionState};
use crate::console::{Console, OutputSink};
use crate::error::{Error, Result};
use crate::port::{Port, PortSelector};
use crate::remote::{ConnectError, Connector};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

/// Diagnostic printed when the serial device cannot be opened
pub const NO_ACCESS_MESSAGE: &str = "\n\nSerial port is not accessible: permission denied or device busy.\n\
Check that no other program is using the port and that your user may open it.\n";

/// Result of [`SessionManager::open`]
pub struct Acquired {
    /// Resolved port
    pub port: Port,
    /// Output sink bound to the port
    pub sink: Arc<dyn OutputSink>,
    /// Connected session; `None` in quiet mode or when the board did not answer
    pub session: Option<Arc<Session>>,
}

/// Owner of every live session, keyed by port
///
/// All mutation of the session registry goes through `open`, `stop_active`
/// and `finish`. At most one session per port is registered, and a
/// registered session that is replaced is stopped first.
pub struct SessionManager {
    selector: Arc<dyn PortSelector>,
    connector: Arc<dyn Connector>,
    console: Arc<dyn Console>,
    sessions: Mutex<HashMap<Port, Arc<Session>>>,
    background: Mutex<Vec<JoinHandle<()>>>,
}

impl SessionManager {
    /// Create a manager using the given collaborators
    pub fn new(
        selector: Arc<dyn PortSelector>,
        connector: Arc<dyn Connector>,
        console: Arc<dyn Console>,
    ) -> Self {
        Self {
            selector,
            connector,
            console,
            sessions: Mutex::new(HashMap::new()),
            background: Mutex::new(Vec::new()),
        }
    }

    fn lock_sessions(&self) -> MutexGuard<'_, HashMap<Port, Arc<Session>>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Port picker used by this manager
    pub fn selector(&self) -> &Arc<dyn PortSelector> {
        &self.selector
    }

    /// Console surface used by this manager
    pub fn console(&self) -> &Arc<dyn Console> {
        &self.console
    }

    /// Resolve a port and open a session on it
    ///
    /// `explicit` asks the port picker for a choice instead of reusing the
    /// last port. In `quiet` mode the sink is bound without taking focus, an
    /// active session is left alone and no connection is attempted.
    ///
    /// Returns `Ok(None)` when no port was selected. A device that exists but
    /// cannot be opened is fatal: the diagnostic is printed and
    /// [`Error::NoAccess`] is returned.
    pub fn open(&self, explicit: bool, quiet: bool) -> Result<Option<Acquired>> {
        let Some(port) = self.selector.select(explicit) else {
            log::debug!("No port selected");
            return Ok(None);
        };

        if !quiet && self.stop_active(&port) {
            log::info!("Stopped active session on {}", port);
        }

        let sink = self.console.sink(&port);
        if quiet {
            return Ok(Some(Acquired {
                port,
                sink,
                session: None,
            }));
        }
        sink.focus();

        let session = self.establish(&port, Arc::clone(&sink))?;
        Ok(Some(Acquired {
            port,
            sink,
            session,
        }))
    }

    /// Whether a live or opening session is registered for `port`
    pub fn is_in_use(&self, port: &Port) -> bool {
        self.lock_sessions()
            .get(port)
            .is_some_and(|s| s.state() != SessionState::Closed)
    }

    /// Registered session for `port`, if any
    pub fn active(&self, port: &Port) -> Option<Arc<Session>> {
        self.lock_sessions().get(port).cloned()
    }

    /// Stop and unregister the session on `port`
    ///
    /// Returns whether a session was registered.
    pub fn stop_active(&self, port: &Port) -> bool {
        let session = self.lock_sessions().remove(port);
        match session {
            Some(session) => {
                session.stop();
                true
            }
            None => false,
        }
    }

    /// Stop every registered session
    pub fn shutdown(&self) {
        let sessions: Vec<Arc<Session>> = self.lock_sessions().drain().map(|(_, s)| s).collect();
        for session in sessions {
            session.stop();
        }
    }

    /// Connect a new session on `port`, replacing any registered one
    fn establish(&self, port: &Port, sink: Arc<dyn OutputSink>) -> Result<Option<Arc<Session>>> {
        let session = Arc::new(Session::opening(port.clone(), Arc::clone(&sink)));

        let replaced = self
            .lock_sessions()
            .insert(port.clone(), Arc::clone(&session));
        if let Some(old) = replaced {
            log::debug!("{}: replacing {} session", port, old.state());
            old.stop();
        }

        self.console.set_busy(port);
        let result = self.connector.connect(port, sink.clone());
        self.console.clear_busy();

        match result {
            Ok(remote) => {
                if session.attach(remote) {
                    log::debug!("{}: session open", port);
                    Ok(Some(session))
                } else {
                    log::debug!("{}: session replaced while connecting", port);
                    Ok(None)
                }
            }
            Err(ConnectError::NoAccess { port, reason }) => {
                log::error!("Cannot access {}: {}", port, reason);
                sink.print(NO_ACCESS_MESSAGE);
                self.discard(&session);
                Err(Error::NoAccess { port, reason })
            }
            Err(e @ ConnectError::Unavailable { .. }) => {
                log::warn!("{}", e);
                self.discard(&session);
                Ok(None)
            }
        }
    }

    /// Stop `session` and unregister it unless it has been replaced already
    fn discard(&self, session: &Arc<Session>) {
        session.stop();
        let mut sessions = self.lock_sessions();
        if sessions
            .get(session.port())
            .is_some_and(|current| Arc::ptr_eq(current, session))
        {
            sessions.remove(session.port());
        }
    }

    /// Post-operation step: re-open a session on `port` in the background
    /// and ask the console to re-render.
    pub fn finish(self: &Arc<Self>, port: &Port) {
        let manager = Arc::clone(self);
        let target = port.clone();

        let spawned = thread::Builder::new()
            .name(format!("reconnect {}", port))
            .spawn(move || {
                let sink = manager.console.sink(&target);
                match manager.establish(&target, sink) {
                    Ok(Some(_)) => log::debug!("{}: reconnected", target),
                    Ok(None) => log::info!("{}: board not ready after operation", target),
                    Err(e) => log::warn!("{}: reconnect failed: {}", target, e),
                }
                manager.console.refresh();
            });

        match spawned {
            Ok(handle) => self
                .background
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(handle),
            Err(e) => {
                log::error!("Failed to spawn reconnect for {}: {}", port, e);
                self.console.refresh();
            }
        }
    }

    /// Post-operation step for quiet operations: the session registry is left
    /// as it was and only the console is re-rendered.
    pub fn finish_quiet(&self, port: &Port) {
        log::trace!("{}: quiet finish", port);
        self.console.refresh();
    }

    /// Post-operation step when no port could be resolved: there is nothing
    /// to reconnect, so only the console is re-rendered.
    pub fn finish_unbound(&self) {
        log::trace!("quiet finish without a port");
        self.console.refresh();
    }

    /// Wait for all background reconnects started by [`finish`](Self::finish)
    pub fn wait_background(&self) {
        let handles: Vec<JoinHandle<()>> = self
            .background
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain(..)
            .collect();

        for handle in handles {
            if handle.join().is_err() {
                log::error!("Background reconnect panicked");
            }
        }
    }
}
