//! Project folders kept in a JSON file in the working directory

use mcuport_core::Project;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Name of the project file
pub const PROJECT_FILE: &str = ".mcuport-project.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProjectData {
    folders: Vec<PathBuf>,
}

/// [`Project`] backed by a `.mcuport-project.json` file
///
/// The directory holding the file is always part of the project.
pub struct ProjectFile {
    root: PathBuf,
    lock: Mutex<()>,
}

impl ProjectFile {
    /// Project rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock: Mutex::new(()),
        }
    }

    fn path(&self) -> PathBuf {
        self.root.join(PROJECT_FILE)
    }

    fn absolute(&self, folder: &Path) -> PathBuf {
        if folder.is_absolute() {
            folder.to_path_buf()
        } else {
            self.root.join(folder)
        }
    }

    fn load(&self) -> io::Result<ProjectData> {
        match fs::read_to_string(self.path()) {
            Ok(content) => serde_json::from_str(&content)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(ProjectData::default()),
            Err(e) => Err(e),
        }
    }

    fn save(&self, data: &ProjectData) -> io::Result<()> {
        let content = serde_json::to_string_pretty(data)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(self.path(), content)
    }

    /// Folders listed in the project file
    pub fn folders(&self) -> Vec<PathBuf> {
        match self.load() {
            Ok(data) => data.folders,
            Err(e) => {
                log::warn!("Cannot read {}: {}", self.path().display(), e);
                Vec::new()
            }
        }
    }
}

impl Project for ProjectFile {
    fn contains(&self, folder: &Path) -> bool {
        let folder = self.absolute(folder);
        folder == self.root || self.folders().iter().any(|f| *f == folder)
    }

    fn add_folder(&self, folder: &Path, append: bool) {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let folder = self.absolute(folder);

        let mut data = match self.load() {
            Ok(data) => data,
            Err(e) => {
                log::warn!("Cannot read {}: {}", self.path().display(), e);
                ProjectData::default()
            }
        };
        if !append {
            data.folders.clear();
        }
        if !data.folders.contains(&folder) {
            data.folders.push(folder.clone());
        }

        match self.save(&data) {
            Ok(()) => log::info!("Added {} to the project", folder.display()),
            Err(e) => log::error!("Cannot write {}: {}", self.path().display(), e),
        }
    }
}
