//! Firmware images shipped per board

use crate::error::{FlashError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Folder holding the firmware images of `board`
pub fn firmware_folder(root: &Path, board: &str) -> PathBuf {
    root.join(board)
}

/// File names of the firmware images available for `board`, sorted
pub fn list_firmware(root: &Path, board: &str) -> Result<Vec<String>> {
    let folder = firmware_folder(root, board);
    let io_err = |source: std::io::Error| FlashError::Io {
        path: folder.clone(),
        source,
    };

    let mut names = Vec::new();
    for entry in fs::read_dir(&folder).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        if entry.file_type().map_err(io_err)?.is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }

    names.sort();
    Ok(names)
}
