//! mcuport-serial - Serial port handling for mcuport
//!
//! Discovery of attached serial devices, the port picker used by the
//! session manager, and the open-and-release probe that tells an absent
//! board apart from one the user is not allowed to open.

pub mod discovery;
pub mod error;
pub mod probe;
pub mod selector;

pub use discovery::{discover, PortInfo};
pub use error::{Result, SerialError};
pub use probe::{check_access, classify, open_port, Access, ProbeConnector};
pub use selector::SerialPortSelector;
