//! Serial port identifiers and port selection

use std::fmt;

/// Opaque identifier of a serial device endpoint (e.g. `/dev/ttyUSB0`, `COM3`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Port(String);

impl Port {
    /// Create a port identifier from its device name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Device name of the port
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Port {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Port {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Port picker collaborator
///
/// Implementations remember the last port they handed out so that implicit
/// requests keep talking to the same board.
pub trait PortSelector: Send + Sync {
    /// Resolve the port to use.
    ///
    /// With `explicit` set the user is asked to pick a port; otherwise the
    /// last-used port is returned. `None` means no port is available or the
    /// user dismissed the picker.
    fn select(&self, explicit: bool) -> Option<Port>;

    /// Check that the device behind `port` can currently be opened
    fn is_reachable(&self, port: &Port) -> bool;
}
