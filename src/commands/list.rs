//! List commands implementation

use mcuport_flash::{firmware_folder, BoardLibrary};
use std::path::Path;

/// List serial ports, plus the emulated board when available
pub fn list_ports(virtual_ports: &[&str]) -> Result<(), Box<dyn std::error::Error>> {
    let ports = mcuport_serial::discover()?;

    println!("Serial ports:");
    println!();
    if ports.is_empty() && virtual_ports.is_empty() {
        println!("  (none found)");
    }
    for port in &ports {
        println!("  {}", port);
    }
    for port in virtual_ports {
        println!("  {:<14} emulated board", port);
    }
    Ok(())
}

/// List board definitions found in the library directories
pub fn list_boards(library: &BoardLibrary) -> Result<(), Box<dyn std::error::Error>> {
    let names = library.names()?;
    if names.is_empty() {
        println!("No board files found in:");
        for dir in library.dirs() {
            println!("  {}", dir.display());
        }
        return Ok(());
    }

    println!("Available boards:");
    println!();
    for name in names {
        println!("  {}", name);
    }
    Ok(())
}

/// List firmware images of `board` under `root`
pub fn list_firmware(root: &Path, board: &str) -> Result<(), Box<dyn std::error::Error>> {
    let images = mcuport_flash::list_firmware(root, board)?;
    let folder = firmware_folder(root, board);
    if images.is_empty() {
        println!("No firmware in {}", folder.display());
        return Ok(());
    }

    println!("Firmware in {}:", folder.display());
    println!();
    for image in images {
        println!("  {}", image);
    }
    Ok(())
}
