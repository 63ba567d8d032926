//! mcuport-flash - Firmware flashing for mcuport
//!
//! Ties the compiled board options to a port and a firmware image and runs
//! the external flashing tool:
//!
//! ```text
//! BoardLibrary ──load──▶ BoardConfig ──compile──▶ FlashPlan
//!                                                    │
//!                 port, firmware, erase answer ──▶ Flasher ──▶ FlashTool (esptool)
//! ```

pub mod error;
pub mod firmware;
pub mod library;
pub mod orchestrator;
pub mod tool;

pub use error::{FlashError, Result};
pub use firmware::{firmware_folder, list_firmware};
pub use library::BoardLibrary;
pub use orchestrator::{FlashStatus, Flasher, ERASE_CAPTION};
pub use tool::{Esptool, FlashTool, Invocation};
