//! Flash command implementation

use crate::console::pick;
use mcuport_core::{Prompt, SessionManager};
use mcuport_flash::{firmware_folder, list_firmware, BoardLibrary, Esptool, FlashStatus, Flasher};
use std::path::PathBuf;
use std::sync::Arc;

/// Arguments of the flash command
pub struct FlashArgs {
    pub board: String,
    pub firmware_root: PathBuf,
    pub firmware_file: Option<PathBuf>,
    pub esptool: PathBuf,
}

/// Flash a firmware image on the selected port
///
/// Returns `false` when the port went away before writing.
pub fn run_flash(
    args: FlashArgs,
    library: &BoardLibrary,
    manager: &Arc<SessionManager>,
    prompt: Arc<dyn Prompt>,
) -> Result<bool, Box<dyn std::error::Error>> {
    let board = library.load(&args.board)?;

    let firmware = match args.firmware_file {
        Some(file) => file,
        None => {
            let images = list_firmware(&args.firmware_root, &args.board)?;
            if images.is_empty() {
                return Err(format!(
                    "No firmware for {} in {}",
                    args.board,
                    firmware_folder(&args.firmware_root, &args.board).display()
                )
                .into());
            }
            let Some(index) = pick("Firmware images", &images) else {
                return Ok(true);
            };
            firmware_folder(&args.firmware_root, &args.board).join(&images[index])
        }
    };

    let Some(port) = manager.selector().select(false) else {
        return Err("No serial port selected".into());
    };

    let flasher = Flasher::new(
        Box::new(Esptool::new(args.esptool)),
        prompt,
        manager.selector().clone(),
        manager.console().clone(),
    )
    .with_sessions(manager.clone());

    match flasher.flash(&port, &firmware, &board)? {
        FlashStatus::Flashed => Ok(true),
        FlashStatus::Cancelled => {
            println!("Flashing cancelled");
            Ok(true)
        }
        FlashStatus::Unreachable => Ok(false),
    }
}
