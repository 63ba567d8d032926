//! mcuport-dummy - Emulated MicroPython board for testing
//!
//! This crate provides a board that keeps its filesystem in memory and
//! interprets a tiny subset of Python for `run`. It's useful for testing and
//! development without real hardware, and backs the CLI's `--port dummy`.

use mcuport_core::{CancelToken, ConnectError, Connector, OutputSink, Port, Remote, RemoteError};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Port name the CLI maps to the emulated board
pub const DUMMY_PORT: &str = "dummy";

/// How often a running `while True:` loop checks for cancellation
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Configuration for the emulated board
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Filesystem capacity in bytes
    pub capacity: usize,
    /// Files present at power-up
    pub files: Vec<(String, Vec<u8>)>,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            capacity: 2 * 1024 * 1024,
            files: vec![(
                "boot.py".to_string(),
                b"# This file is executed on every boot (including wake-boot from deepsleep)\r\n"
                    .to_vec(),
            )],
        }
    }
}

#[derive(Debug, Default)]
struct Filesystem {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
    resets: usize,
}

impl Filesystem {
    fn used(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    fn parent_exists(&self, name: &str) -> bool {
        match name.rsplit_once('/') {
            Some((parent, _)) => self.dirs.contains(parent),
            None => true,
        }
    }
}

/// Strip the root marker and trailing separators from a remote path
fn normalize(name: &str) -> Result<String, RemoteError> {
    let trimmed = name.trim_matches('/');
    if trimmed.is_empty() {
        return Err(RemoteError::Rejected(format!("Invalid path: '{}'", name)));
    }
    Ok(trimmed.to_string())
}

/// Emulated board
///
/// Clones share the same filesystem, so a board survives reconnects the way
/// real flash does.
#[derive(Debug, Clone)]
pub struct DummyBoard {
    capacity: usize,
    fs: Arc<Mutex<Filesystem>>,
}

impl DummyBoard {
    /// Create a new board with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        let fs = Filesystem {
            files: config.files.into_iter().collect(),
            ..Filesystem::default()
        };
        Self {
            capacity: config.capacity,
            fs: Arc::new(Mutex::new(fs)),
        }
    }

    /// Create a new board with the default configuration
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    fn lock(&self) -> MutexGuard<'_, Filesystem> {
        self.fs.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Contents of a file, if present
    pub fn file(&self, name: &str) -> Option<Vec<u8>> {
        let name = normalize(name).ok()?;
        self.lock().files.get(&name).cloned()
    }

    /// Whether a directory exists
    pub fn has_dir(&self, name: &str) -> bool {
        normalize(name).is_ok_and(|name| self.lock().dirs.contains(&name))
    }

    /// Number of soft resets performed
    pub fn resets(&self) -> usize {
        self.lock().resets
    }

    /// Bytes in use
    pub fn used(&self) -> usize {
        self.lock().used()
    }

    /// Open a remote on this board writing script output to `output`
    pub fn remote(&self, output: Arc<dyn OutputSink>) -> DummyRemote {
        DummyRemote {
            board: self.clone(),
            output,
        }
    }
}

/// [`Remote`] handle on a [`DummyBoard`]
pub struct DummyRemote {
    board: DummyBoard,
    output: Arc<dyn OutputSink>,
}

impl DummyRemote {
    fn execute_line(&self, number: usize, line: &str, cancel: &CancelToken) -> Result<(), RemoteError> {
        let line = line.trim();

        if let Some(text) = line
            .strip_prefix("print(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let text = text.trim().trim_matches(|c| c == '"' || c == '\'');
            self.output.print(&format!("{}\r\n", text));
            return Ok(());
        }

        if let Some(exception) = line.strip_prefix("raise ") {
            return Err(RemoteError::Rejected(format!(
                "Traceback (most recent call last):\n  File \"<stdin>\", line {}, in <module>\n{}",
                number,
                exception.trim()
            )));
        }

        if line.starts_with("while True") {
            while !cancel.is_cancelled() {
                std::thread::sleep(POLL_INTERVAL);
            }
            return Err(RemoteError::Interrupted);
        }

        // comments, blank lines and anything else are accepted silently
        Ok(())
    }
}

impl Remote for DummyRemote {
    fn list(&mut self) -> Result<Vec<String>, RemoteError> {
        let fs = self.board.lock();
        let mut names: Vec<String> = fs
            .dirs
            .iter()
            .map(|dir| format!("{}/", dir))
            .chain(fs.files.keys().cloned())
            .collect();
        names.sort();
        Ok(names)
    }

    fn fetch(&mut self, name: &str) -> Result<Vec<u8>, RemoteError> {
        let name = normalize(name)?;
        self.board
            .lock()
            .files
            .get(&name)
            .cloned()
            .ok_or_else(|| RemoteError::Rejected(format!("No such file: {}", name)))
    }

    fn store(&mut self, name: &str, data: &[u8]) -> Result<(), RemoteError> {
        let name = normalize(name)?;
        let mut fs = self.board.lock();

        if fs.dirs.contains(&name) {
            return Err(RemoteError::Rejected(format!("{} is a directory", name)));
        }
        if !fs.parent_exists(&name) {
            return Err(RemoteError::Rejected(format!(
                "No such directory for {}",
                name
            )));
        }

        let replaced = fs.files.get(&name).map_or(0, Vec::len);
        if fs.used() - replaced + data.len() > self.board.capacity {
            return Err(RemoteError::Rejected("No space left on device".to_string()));
        }

        log::trace!("dummy: store {} ({} bytes)", name, data.len());
        fs.files.insert(name, data.to_vec());
        Ok(())
    }

    fn remove(&mut self, name: &str) -> Result<(), RemoteError> {
        let name = normalize(name)?;
        let mut fs = self.board.lock();
        if fs.dirs.contains(&name) {
            return Err(RemoteError::Rejected(format!("{} is a directory", name)));
        }
        match fs.files.remove(&name) {
            Some(_) => Ok(()),
            None => Err(RemoteError::Rejected(format!("No such file: {}", name))),
        }
    }

    fn make_dir(&mut self, name: &str) -> Result<(), RemoteError> {
        let name = normalize(name)?;
        let mut fs = self.board.lock();
        if fs.dirs.contains(&name) || fs.files.contains_key(&name) {
            return Err(RemoteError::DirectoryExists(name));
        }
        if !fs.parent_exists(&name) {
            return Err(RemoteError::Rejected(format!(
                "No such directory for {}",
                name
            )));
        }
        fs.dirs.insert(name);
        Ok(())
    }

    fn remove_dir(&mut self, name: &str) -> Result<(), RemoteError> {
        let name = normalize(name)?;
        let mut fs = self.board.lock();
        if !fs.dirs.remove(&name) {
            return Err(RemoteError::Rejected(format!("No such directory: {}", name)));
        }

        let prefix = format!("{}/", name);
        fs.dirs.retain(|dir| !dir.starts_with(&prefix));
        fs.files.retain(|file, _| !file.starts_with(&prefix));
        Ok(())
    }

    fn run(&mut self, script: &[u8], cancel: &CancelToken) -> Result<(), RemoteError> {
        let script = String::from_utf8_lossy(script);
        for (index, line) in script.lines().enumerate() {
            if cancel.is_cancelled() {
                return Err(RemoteError::Interrupted);
            }
            self.execute_line(index + 1, line, cancel)?;
        }
        Ok(())
    }

    fn reset(&mut self) -> Result<(), RemoteError> {
        self.board.lock().resets += 1;
        Ok(())
    }

    fn close(&mut self) {
        log::trace!("dummy: remote closed");
    }
}

/// [`Connector`] handing out remotes on one shared [`DummyBoard`]
#[derive(Debug)]
pub struct DummyConnector {
    board: DummyBoard,
    /// Refuse connections as if the device were held by another process
    pub deny_access: AtomicBool,
    /// Refuse connections as if the board did not answer
    pub offline: AtomicBool,
    connects: AtomicUsize,
}

impl DummyConnector {
    /// Create a connector for `board`
    pub fn new(board: DummyBoard) -> Self {
        Self {
            board,
            deny_access: AtomicBool::new(false),
            offline: AtomicBool::new(false),
            connects: AtomicUsize::new(0),
        }
    }

    /// The emulated board
    pub fn board(&self) -> &DummyBoard {
        &self.board
    }

    /// Number of successful connections so far
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl Connector for DummyConnector {
    fn connect(
        &self,
        port: &Port,
        output: Arc<dyn OutputSink>,
    ) -> Result<Box<dyn Remote>, ConnectError> {
        if self.deny_access.load(Ordering::SeqCst) {
            return Err(ConnectError::NoAccess {
                port: port.clone(),
                reason: "Permission denied".to_string(),
            });
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(ConnectError::Unavailable {
                port: port.clone(),
                reason: "board did not answer".to_string(),
            });
        }

        self.connects.fetch_add(1, Ordering::SeqCst);
        log::debug!("dummy: connected on {}", port);
        Ok(Box::new(self.board.remote(output)))
    }
}
