//! mcuport-core - Session management and command dispatch for MicroPython boards
//!
//! This crate holds the parts of mcuport that carry real invariants:
//!
//! - [`SessionManager`] owns the connection lifecycle of every serial port and
//!   guarantees that at most one [`Session`] is live per [`Port`].
//! - [`Dispatcher`] turns an [`Operation`] into a remote call, classifies the
//!   result into an [`Outcome`], renders it to the port's output sink and
//!   always schedules the post-operation reconnect.
//! - [`board`] compiles a declarative board configuration into the ordered
//!   option list handed to the flashing tool.
//!
//! Everything the core talks to (the console surface, the port picker, the
//! yes/no/cancel prompt, the remote protocol driver) is a trait so that the
//! CLI, the interactive shell and the tests can plug in their own.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    Operation    ┌──────────────┐   open/finish   ┌────────────────┐
//! │ CLI / shell  │ ──────────────▶ │  Dispatcher  │ ──────────────▶ │ SessionManager │
//! └──────────────┘                 └──────────────┘                 └────────────────┘
//!                                         │ header / outcome                │ connect
//!                                         ▼                                 ▼
//!                                  ┌──────────────┐                 ┌────────────────┐
//!                                  │  OutputSink  │                 │ Connector ──▶  │
//!                                  └──────────────┘                 │ dyn Remote     │
//!                                                                   └────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod board;
pub mod console;
pub mod dispatch;
pub mod error;
pub mod port;
pub mod remote;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use board::{compile, BoardConfig, ConfigError, FlashPlan};
pub use console::{Answer, Console, OutputSink, Project, Prompt};
pub use dispatch::{Dispatcher, ErrorKind, Operation, Outcome, Reply, USAGE};
pub use error::{Error, Result};
pub use port::{Port, PortSelector};
pub use remote::{CancelToken, ConnectError, Connector, Remote, RemoteError};
pub use session::{Acquired, Session, SessionManager, SessionState};
