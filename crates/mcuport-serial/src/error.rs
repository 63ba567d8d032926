//! Error types for serial port handling

use thiserror::Error;

/// Serial-specific errors
#[derive(Debug, Error)]
pub enum SerialError {
    /// Port enumeration failed
    #[error("Failed to enumerate serial ports: {0}")]
    Discovery(#[source] serialport::Error),

    /// The port could not be opened
    #[error("Failed to open {port}: {source}")]
    Open {
        /// Device name
        port: String,
        /// Driver error
        #[source]
        source: serialport::Error,
    },
}

/// Result type for serial operations
pub type Result<T> = std::result::Result<T, SerialError>;
