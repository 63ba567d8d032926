//! CLI command implementations
//!
//! Board commands go through the [`Dispatcher`](mcuport_core::Dispatcher)
//! so the session lifecycle is identical to the interactive console.
//! Listing and flashing work on local data and talk to the board only
//! through esptool.

mod board;
mod flash;
mod list;

pub use board::run_operation;
pub use flash::{run_flash, FlashArgs};
pub use list::{list_boards, list_firmware, list_ports};
