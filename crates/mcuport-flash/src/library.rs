//! Board configuration lookup

use crate::error::{FlashError, Result};
use mcuport_core::BoardConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// Board file extension
const BOARD_EXT: &str = "json";

/// Directories holding `<board>.json` files
#[derive(Debug, Clone)]
pub struct BoardLibrary {
    dirs: Vec<PathBuf>,
}

impl BoardLibrary {
    /// Default search locations, most specific first
    pub fn default_dirs() -> Vec<PathBuf> {
        vec![
            PathBuf::from("boards"),
            PathBuf::from("/usr/share/mcuport/boards"),
            PathBuf::from("/usr/local/share/mcuport/boards"),
        ]
    }

    /// Library over `dir`, or over the default locations when `None`
    pub fn new(dir: Option<&Path>) -> Self {
        let dirs = match dir {
            Some(dir) => vec![dir.to_path_buf()],
            None => Self::default_dirs(),
        };
        Self { dirs }
    }

    /// Directories searched, in order
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Path of the board file for `name`
    pub fn find(&self, name: &str) -> Result<PathBuf> {
        let filename = format!("{}.{}", name, BOARD_EXT);
        for dir in &self.dirs {
            let path = dir.join(&filename);
            if path.is_file() {
                log::debug!("Using board file {}", path.display());
                return Ok(path);
            }
        }

        Err(FlashError::BoardNotFound {
            name: name.to_string(),
            searched: self
                .dirs
                .iter()
                .map(|d| d.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        })
    }

    /// Load the configuration of `name`
    pub fn load(&self, name: &str) -> Result<BoardConfig> {
        let path = self.find(name)?;
        Ok(BoardConfig::load(path)?)
    }

    /// Names of every board available, sorted and without duplicates
    pub fn names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();

        for dir in &self.dirs {
            if !dir.is_dir() {
                continue;
            }
            let entries = fs::read_dir(dir).map_err(|source| FlashError::Io {
                path: dir.clone(),
                source,
            })?;
            for entry in entries {
                let path = entry
                    .map_err(|source| FlashError::Io {
                        path: dir.clone(),
                        source,
                    })?
                    .path();
                if path.extension().is_some_and(|ext| ext == BOARD_EXT) {
                    if let Some(stem) = path.file_stem() {
                        names.push(stem.to_string_lossy().into_owned());
                    }
                }
            }
        }

        names.sort();
        names.dedup();
        Ok(names)
    }
}

impl Default for BoardLibrary {
    fn default() -> Self {
        Self::new(None)
    }
}
