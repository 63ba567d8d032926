//! Command dispatch
//!
//! Every file or script action follows the same protocol:
//!
//! 1. acquire a session through the [`SessionManager`](crate::SessionManager)
//! 2. echo a header such as `>> get boot.py` to the port's output sink
//! 3. run the remote call and classify the result into an [`Outcome`]
//! 4. render the outcome below the header
//! 5. schedule the reconnect (`finish`), on every exit path

mod dispatcher;
mod operation;
mod outcome;
mod transfer;

pub use dispatcher::{Dispatcher, ADD_FOLDER_CAPTION};
pub use operation::{Operation, USAGE};
pub use outcome::{normalize_line_endings, ErrorKind, Outcome, Reply, NOT_READY_MESSAGE};
