//! Session lifecycle
//!
//! A [`Session`] binds one port to one output sink and owns the [`Remote`]
//! used to talk to the board. The [`SessionManager`] is the only code that
//! creates, registers, replaces or stops sessions.
//!
//! ```text
//! Closed ──▶ Opening ──▶ Open ⇄ Busy
//!    ▲          │          │
//!    └──────────┴──────────┘  stop / failed connect / replaced
//! ```
//!
//! [`Remote`]: crate::remote::Remote

mod manager;
mod state;

pub use manager::{Acquired, SessionManager, NO_ACCESS_MESSAGE};
pub use state::{BusyGuard, NotReady, Session, SessionState};
