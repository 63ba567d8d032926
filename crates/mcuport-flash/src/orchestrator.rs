//! The flash workflow: erase decision, reachability check, tool run

use crate::error::Result;
use crate::tool::{FlashTool, Invocation};
use mcuport_core::{compile, Answer, BoardConfig, Console, Port, PortSelector, Prompt, SessionManager};
use std::path::Path;
use std::sync::Arc;

/// Caption of the erase-before-write prompt
pub const ERASE_CAPTION: &str = "Do you want to erase the flash memory?";

/// How a flash request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashStatus {
    /// The firmware was written
    Flashed,
    /// The user dismissed the erase prompt; nothing was run
    Cancelled,
    /// The port disappeared before writing; the write was not attempted
    Unreachable,
}

/// Flash orchestrator
pub struct Flasher {
    tool: Box<dyn FlashTool>,
    prompt: Arc<dyn Prompt>,
    selector: Arc<dyn PortSelector>,
    console: Arc<dyn Console>,
    sessions: Option<Arc<SessionManager>>,
}

impl Flasher {
    /// Create a flasher running `tool`
    pub fn new(
        tool: Box<dyn FlashTool>,
        prompt: Arc<dyn Prompt>,
        selector: Arc<dyn PortSelector>,
        console: Arc<dyn Console>,
    ) -> Self {
        Self {
            tool,
            prompt,
            selector,
            console,
            sessions: None,
        }
    }

    /// Release the port from any live session before the tool opens it
    pub fn with_sessions(mut self, sessions: Arc<SessionManager>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    /// Flash `firmware` to the board on `port`
    ///
    /// The erase prompt comes first; cancelling it aborts without side
    /// effects. The write is only attempted while the port is reachable.
    pub fn flash(&self, port: &Port, firmware: &Path, board: &BoardConfig) -> Result<FlashStatus> {
        let plan = compile(board);

        let erase = match self.prompt.ask(ERASE_CAPTION, "Yes", "No") {
            Answer::Yes => true,
            Answer::No => false,
            Answer::Cancel => {
                log::info!("Flashing cancelled");
                return Ok(FlashStatus::Cancelled);
            }
        };

        let sink = self.console.sink(port);
        sink.focus();

        if let Some(sessions) = &self.sessions {
            if sessions.stop_active(port) {
                log::debug!("Released {} for flashing", port);
            }
        }

        if erase {
            let invocation = Invocation::erase(port);
            sink.print(&format!("\n\n>> erase {}\n", port));
            self.tool.run(&invocation, sink.as_ref())?;
        }

        let invocation = Invocation::write(port, plan, firmware);

        if !self.selector.is_reachable(port) {
            log::warn!("{} is not reachable, not flashing", port);
            sink.print(&format!("\n\n{} is not reachable.\n", port));
            return Ok(FlashStatus::Unreachable);
        }

        sink.print(&format!("\n\n>> flash {}\n", invocation));
        self.tool.run(&invocation, sink.as_ref())?;
        sink.print("\n[done]\n");

        log::info!("Flashed {} on {}", firmware.display(), port);
        Ok(FlashStatus::Flashed)
    }
}
