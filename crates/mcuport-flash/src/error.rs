//! Error types for flashing

use mcuport_core::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// Flashing errors
#[derive(Debug, Error)]
pub enum FlashError {
    /// Malformed board configuration; nothing was flashed
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No board file with that name in any search directory
    #[error("Board '{name}' not found (searched: {searched})")]
    BoardNotFound {
        /// Requested board
        name: String,
        /// Directories that were searched
        searched: String,
    },

    /// A local directory could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        /// Offending path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The flashing tool could not be started
    #[error("Failed to start {tool}: {source}")]
    Spawn {
        /// Tool executable
        tool: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The flashing tool exited unsuccessfully
    #[error("{tool} failed ({status})")]
    ToolFailed {
        /// Tool executable
        tool: String,
        /// Exit status description
        status: String,
    },
}

/// Result type for flashing operations
pub type Result<T> = std::result::Result<T, FlashError>;
