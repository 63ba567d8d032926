//! Port picker with last-used memory

use crate::discovery::discover;
use crate::probe::{check_access, Access};
use mcuport_core::{Port, PortSelector};
use std::sync::Mutex;

type Discover = Box<dyn Fn() -> Vec<Port> + Send + Sync>;
type Picker = Box<dyn Fn(&[Port]) -> Option<Port> + Send + Sync>;

/// [`PortSelector`] over the host's serial devices
///
/// Implicit requests return the last port handed out, then the preferred
/// port, then the first discovered device. Explicit requests go through the
/// picker. Virtual ports (such as the emulated board) are always offered
/// and always reachable.
pub struct SerialPortSelector {
    preferred: Option<Port>,
    virtual_ports: Vec<Port>,
    last: Mutex<Option<Port>>,
    discover: Discover,
    picker: Picker,
}

impl SerialPortSelector {
    /// Selector over the host's devices; explicit requests pick the first
    /// candidate until [`with_picker`](Self::with_picker) is called
    pub fn new() -> Self {
        Self {
            preferred: None,
            virtual_ports: Vec::new(),
            last: Mutex::new(None),
            discover: Box::new(|| match discover() {
                Ok(ports) => ports.into_iter().map(|p| Port::new(p.name)).collect(),
                Err(e) => {
                    log::warn!("{}", e);
                    Vec::new()
                }
            }),
            picker: Box::new(|ports| ports.first().cloned()),
        }
    }

    /// Port returned by implicit requests before anything was selected
    pub fn with_preferred(mut self, port: Option<Port>) -> Self {
        self.preferred = port;
        self
    }

    /// Add a port that exists without a device behind it
    pub fn with_virtual_port(mut self, port: Port) -> Self {
        self.virtual_ports.push(port);
        self
    }

    /// Replace device discovery
    pub fn with_discovery(mut self, discover: impl Fn() -> Vec<Port> + Send + Sync + 'static) -> Self {
        self.discover = Box::new(discover);
        self
    }

    /// Replace the interactive picker used for explicit requests
    pub fn with_picker(
        mut self,
        picker: impl Fn(&[Port]) -> Option<Port> + Send + Sync + 'static,
    ) -> Self {
        self.picker = Box::new(picker);
        self
    }

    /// Every port that can currently be offered: discovered devices first
    pub fn candidates(&self) -> Vec<Port> {
        let mut ports = (self.discover)();
        for port in &self.virtual_ports {
            if !ports.contains(port) {
                ports.push(port.clone());
            }
        }
        ports
    }

    /// Last port handed out
    pub fn last_used(&self) -> Option<Port> {
        self.last.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn remember(&self, port: Option<Port>) -> Option<Port> {
        if let Some(port) = &port {
            *self.last.lock().unwrap_or_else(|e| e.into_inner()) = Some(port.clone());
        }
        port
    }
}

impl Default for SerialPortSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl PortSelector for SerialPortSelector {
    fn select(&self, explicit: bool) -> Option<Port> {
        if explicit {
            let candidates = self.candidates();
            if candidates.is_empty() {
                log::warn!("No serial ports found");
                return None;
            }
            return self.remember((self.picker)(&candidates));
        }

        if let Some(port) = self.last_used() {
            return Some(port);
        }
        if let Some(port) = self.preferred.clone() {
            return self.remember(Some(port));
        }

        let found = (self.discover)().into_iter().next();
        if found.is_none() {
            log::warn!("No serial ports found");
        }
        self.remember(found)
    }

    fn is_reachable(&self, port: &Port) -> bool {
        if self.virtual_ports.contains(port) {
            return true;
        }
        match check_access(port) {
            Access::Granted => true,
            Access::Denied(reason) | Access::Missing(reason) => {
                log::debug!("{} is not reachable: {}", port, reason);
                false
            }
        }
    }
}
