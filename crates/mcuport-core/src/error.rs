//! Error types for mcuport-core
//!
//! Only fatal conditions live here. Recoverable failures of a dispatched
//! operation never leave the [`Dispatcher`](crate::Dispatcher): they are turned
//! into an [`Outcome`](crate::Outcome) and rendered to the output sink.

use crate::board::ConfigError;
use crate::port::Port;
use thiserror::Error;

/// Fatal errors that terminate the current request path
#[derive(Debug, Error)]
pub enum Error {
    /// The serial device exists but cannot be opened (permission denied,
    /// held by another process). Retrying in-process will not help.
    #[error("failed to access {port}: {reason}")]
    NoAccess {
        /// Port that could not be opened
        port: Port,
        /// Reason reported by the driver
        reason: String,
    },

    /// Malformed board configuration
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type alias using the core Error type
pub type Result<T> = std::result::Result<T, Error>;
