//! Operation outcomes and their rendering

use super::operation::USAGE;
use crate::remote::RemoteError;
use std::fmt;

/// Rendered when no connected session was available
pub const NOT_READY_MESSAGE: &str = "Opening console...\nRun the command again.";

/// Classification of a failed operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The board rejected the command or the link failed
    RemoteOperation,
    /// No session had reached `Open`
    SessionNotReady,
    /// A local file could not be read or written
    LocalIo,
    /// A running script was cancelled
    Interrupted,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RemoteOperation => "remote operation failed",
            Self::SessionNotReady => "session not ready",
            Self::LocalIo => "local I/O error",
            Self::Interrupted => "interrupted",
        };
        f.write_str(name)
    }
}

/// Successful result of an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Command completed without output
    Done,
    /// Entries returned by a listing
    Names(Vec<String>),
    /// Contents of a fetched file, line endings normalized
    Content(String),
    /// Script finished
    Ran,
    /// Usage block
    Usage,
}

/// Result of one dispatched operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The operation succeeded
    Success(Reply),
    /// The operation failed; `detail` is shown to the user verbatim
    Failure {
        /// Failure classification
        kind: ErrorKind,
        /// Message rendered below the header
        detail: String,
    },
}

impl Outcome {
    pub(crate) fn failure(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self::Failure {
            kind,
            detail: detail.into(),
        }
    }

    pub(crate) fn not_ready() -> Self {
        Self::failure(ErrorKind::SessionNotReady, NOT_READY_MESSAGE)
    }

    pub(crate) fn local_io(subject: impl fmt::Display, err: &std::io::Error) -> Self {
        Self::failure(ErrorKind::LocalIo, format!("{}: {}", subject, err))
    }

    pub(crate) fn remote(err: RemoteError) -> Self {
        match err {
            RemoteError::Interrupted => Self::failure(ErrorKind::Interrupted, "[interrupted]"),
            other => Self::failure(ErrorKind::RemoteOperation, other.to_string()),
        }
    }

    /// Failure classification, `None` on success
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Success(_) => None,
            Self::Failure { kind, .. } => Some(*kind),
        }
    }

    /// Whether the operation succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Text appended to the sink after the header
    pub fn render(&self) -> String {
        match self {
            Self::Success(Reply::Done) => "\n\n[done]".to_string(),
            Self::Success(Reply::Names(names)) => {
                names.iter().map(|name| format!("\n{}", name)).collect()
            }
            Self::Success(Reply::Content(text)) => format!("\n\n{}", text),
            Self::Success(Reply::Ran) => "\n[done]".to_string(),
            Self::Success(Reply::Usage) => USAGE.to_string(),
            Self::Failure { detail, .. } => format!("\n\n{}", detail),
        }
    }
}

impl From<Result<Reply, RemoteError>> for Outcome {
    fn from(result: Result<Reply, RemoteError>) -> Self {
        match result {
            Ok(reply) => Self::Success(reply),
            Err(err) => Self::remote(err),
        }
    }
}

/// Replace `\r\n` and lone `\r` with `\n`
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}
