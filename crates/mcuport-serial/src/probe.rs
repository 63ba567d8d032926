//! Opening serial ports and classifying why they cannot be opened

use crate::error::{Result, SerialError};
use mcuport_core::{ConnectError, Connector, OutputSink, Port, Remote};
use serialport::{DataBits, ErrorKind, FlowControl, Parity, SerialPort, StopBits};
use std::io;
use std::sync::Arc;
use std::time::Duration;

/// Baud rate of the MicroPython REPL
pub const DEFAULT_BAUD: u32 = 115200;

/// Result of probing a port
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// The port can be opened
    Granted,
    /// The device exists but cannot be opened (permissions, held elsewhere)
    Denied(String),
    /// The device is absent or failed to open for another reason
    Missing(String),
}

/// Open a serial port in 8N1 mode without flow control
pub fn open_port(device: &str, baud: Option<u32>) -> Result<Box<dyn SerialPort>> {
    let baud_rate = baud.unwrap_or(DEFAULT_BAUD);

    let port = serialport::new(device, baud_rate)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(Duration::from_millis(200))
        .open()
        .map_err(|source| SerialError::Open {
            port: device.to_string(),
            source,
        })?;

    log::debug!("Opened serial port {} at {} baud", device, baud_rate);
    Ok(port)
}

/// Sort a driver error into denied or missing
pub fn classify(err: &serialport::Error) -> Access {
    let reason = err.description.clone();
    match err.kind {
        ErrorKind::NoDevice => Access::Missing(reason),
        ErrorKind::Io(io::ErrorKind::PermissionDenied) => Access::Denied(reason),
        _ => {
            let lower = reason.to_lowercase();
            if lower.contains("permission denied")
                || lower.contains("access is denied")
                || lower.contains("busy")
            {
                Access::Denied(reason)
            } else {
                Access::Missing(reason)
            }
        }
    }
}

/// Open `port` and release it immediately
pub fn check_access(port: &Port) -> Access {
    match open_port(port.name(), None) {
        Ok(_) => Access::Granted,
        Err(SerialError::Open { source, .. }) => classify(&source),
        Err(e) => Access::Missing(e.to_string()),
    }
}

/// [`Connector`] for physical ports
///
/// It verifies that the device can be opened, so that a port held by another
/// program is reported as a no-access condition. Speaking the board's REPL
/// protocol is left to a dedicated driver; without one the board is reported
/// as not ready.
#[derive(Debug, Default)]
pub struct ProbeConnector;

impl Connector for ProbeConnector {
    fn connect(
        &self,
        port: &Port,
        _output: Arc<dyn OutputSink>,
    ) -> std::result::Result<Box<dyn Remote>, ConnectError> {
        match check_access(port) {
            Access::Denied(reason) => Err(ConnectError::NoAccess {
                port: port.clone(),
                reason,
            }),
            Access::Missing(reason) => Err(ConnectError::Unavailable {
                port: port.clone(),
                reason,
            }),
            Access::Granted => Err(ConnectError::Unavailable {
                port: port.clone(),
                reason: "no REPL driver available for this port".to_string(),
            }),
        }
    }
}
