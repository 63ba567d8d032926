//! Enumeration of attached serial devices

use crate::error::{Result, SerialError};
use serialport::{SerialPortInfo, SerialPortType};
use std::fmt;

/// A serial device found on the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// Device name (`/dev/ttyUSB0`, `COM3`)
    pub name: String,
    /// Human readable description of the device
    pub description: String,
}

impl fmt::Display for PortInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.description.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{:<20} {}", self.name, self.description)
        }
    }
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        let description = match info.port_type {
            SerialPortType::UsbPort(usb) => {
                let label = [usb.manufacturer, usb.product]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(" ");
                if label.is_empty() {
                    format!("USB {:04x}:{:04x}", usb.vid, usb.pid)
                } else {
                    format!("USB {:04x}:{:04x} {}", usb.vid, usb.pid, label)
                }
            }
            SerialPortType::PciPort => "PCI".to_string(),
            SerialPortType::BluetoothPort => "Bluetooth".to_string(),
            SerialPortType::Unknown => String::new(),
        };

        Self {
            name: info.port_name,
            description,
        }
    }
}

/// List attached serial devices, sorted by name
pub fn discover() -> Result<Vec<PortInfo>> {
    let mut ports: Vec<PortInfo> = serialport::available_ports()
        .map_err(SerialError::Discovery)?
        .into_iter()
        .map(PortInfo::from)
        .collect();
    ports.sort_by(|a, b| a.name.cmp(&b.name));
    log::debug!("Found {} serial port(s)", ports.len());
    Ok(ports)
}
