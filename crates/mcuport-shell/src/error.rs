//! Error types for the shell

use thiserror::Error;

/// Errors that can occur in the shell
#[derive(Error, Debug)]
pub enum ShellError {
    /// Line editor failure
    #[error("Line editor error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),

    /// Unknown command or missing argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
