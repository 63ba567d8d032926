//! Remote capability set of a connected board
//!
//! The byte-level protocol spoken to the board is not part of this crate. A
//! [`Connector`] opens a port and hands back a [`Remote`], and every file or
//! script operation goes through that trait object.

use crate::console::OutputSink;
use crate::port::Port;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Failure reported while talking to a connected board
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The board rejected the command (unknown path, runtime fault, ...)
    #[error("{0}")]
    Rejected(String),

    /// A directory with that name already exists on the board
    #[error("Directory already exists: {0}")]
    DirectoryExists(String),

    /// The link to the board failed mid-command
    #[error("Transport error: {0}")]
    Transport(String),

    /// The running script was interrupted on request
    #[error("Interrupted")]
    Interrupted,
}

/// Failure to establish a connection on a port
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The device cannot be opened at all (permissions, held elsewhere)
    #[error("failed to access {port}: {reason}")]
    NoAccess {
        /// Port that was requested
        port: Port,
        /// Driver message
        reason: String,
    },

    /// The device is absent or did not answer; a later attempt may succeed
    #[error("{port} is not ready: {reason}")]
    Unavailable {
        /// Port that was requested
        port: Port,
        /// Driver message
        reason: String,
    },
}

/// Operations a connected board supports
///
/// Directory entries returned by [`Remote::list`] end with `/`. Paths are
/// relative to the board's filesystem root.
pub trait Remote: Send {
    /// List every file and directory on the board
    fn list(&mut self) -> Result<Vec<String>, RemoteError>;

    /// Read the contents of a file
    fn fetch(&mut self, name: &str) -> Result<Vec<u8>, RemoteError>;

    /// Create or overwrite a file
    fn store(&mut self, name: &str, data: &[u8]) -> Result<(), RemoteError>;

    /// Remove a file
    fn remove(&mut self, name: &str) -> Result<(), RemoteError>;

    /// Create a directory
    fn make_dir(&mut self, name: &str) -> Result<(), RemoteError>;

    /// Remove a directory and everything below it
    fn remove_dir(&mut self, name: &str) -> Result<(), RemoteError>;

    /// Execute a script, streaming its output to the session's sink.
    ///
    /// Implementations poll `cancel` and return [`RemoteError::Interrupted`]
    /// once it is set.
    fn run(&mut self, script: &[u8], cancel: &CancelToken) -> Result<(), RemoteError>;

    /// Soft reset of the board
    fn reset(&mut self) -> Result<(), RemoteError>;

    /// Release the underlying port
    fn close(&mut self) {}
}

/// Opens ports and produces [`Remote`]s
pub trait Connector: Send + Sync {
    /// Connect to the board on `port`. Script output is written to `output`.
    fn connect(
        &self,
        port: &Port,
        output: Arc<dyn OutputSink>,
    ) -> Result<Box<dyn Remote>, ConnectError>;
}

/// Cancellation flag shared between the requester of a `Run` and the remote
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create an unset token
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear a previous request before starting a new run
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
