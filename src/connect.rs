//! Routing of ports to the connector that can serve them

use mcuport_core::{ConnectError, Connector, OutputSink, Port, Remote};
use mcuport_serial::ProbeConnector;
use std::sync::Arc;

#[cfg(feature = "dummy")]
use mcuport_dummy::{DummyBoard, DummyConnector, DUMMY_PORT};

/// [`Connector`] sending the emulated board's port to the dummy backend and
/// every other port to the serial backend
pub struct PortRouter {
    #[cfg(feature = "dummy")]
    dummy: DummyConnector,
    serial: ProbeConnector,
}

impl PortRouter {
    pub fn new() -> Self {
        Self {
            #[cfg(feature = "dummy")]
            dummy: DummyConnector::new(DummyBoard::new_default()),
            serial: ProbeConnector,
        }
    }
}

impl Connector for PortRouter {
    fn connect(
        &self,
        port: &Port,
        output: Arc<dyn OutputSink>,
    ) -> Result<Box<dyn Remote>, ConnectError> {
        #[cfg(feature = "dummy")]
        if port.name() == DUMMY_PORT {
            return self.dummy.connect(port, output);
        }
        self.serial.connect(port, output)
    }
}
