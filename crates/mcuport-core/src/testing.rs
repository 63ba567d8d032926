//! In-crate fakes for the collaborator traits

use crate::console::{Answer, Console, OutputSink, Project, Prompt};
use crate::port::{Port, PortSelector};
use crate::remote::{CancelToken, ConnectError, Connector, Remote, RemoteError};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
pub struct RecordingSink {
    text: Mutex<String>,
    focus: AtomicUsize,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn text(&self) -> String {
        self.text.lock().unwrap().clone()
    }

    pub fn focus_count(&self) -> usize {
        self.focus.load(Ordering::SeqCst)
    }
}

impl OutputSink for RecordingSink {
    fn print(&self, text: &str) {
        self.text.lock().unwrap().push_str(text);
    }

    fn focus(&self) {
        self.focus.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct FakeConsole {
    sinks: Mutex<HashMap<Port, Arc<RecordingSink>>>,
    pub unbound: Arc<RecordingSink>,
    busy: Mutex<Vec<String>>,
    refreshes: AtomicUsize,
}

impl FakeConsole {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sink_for(&self, port: &str) -> Arc<RecordingSink> {
        let mut sinks = self.sinks.lock().unwrap();
        Arc::clone(sinks.entry(Port::new(port)).or_default())
    }

    pub fn busy_events(&self) -> Vec<String> {
        self.busy.lock().unwrap().clone()
    }

    pub fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

impl Console for FakeConsole {
    fn sink(&self, port: &Port) -> Arc<dyn OutputSink> {
        self.sink_for(port.name())
    }

    fn unbound_sink(&self) -> Arc<dyn OutputSink> {
        self.unbound.clone()
    }

    fn refresh(&self) {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
    }

    fn set_busy(&self, port: &Port) {
        self.busy.lock().unwrap().push(format!("set {}", port));
    }

    fn clear_busy(&self) {
        self.busy.lock().unwrap().push("clear".to_string());
    }
}

pub struct FixedSelector {
    port: Option<Port>,
    pub reachable: AtomicBool,
}

impl FixedSelector {
    pub fn new(port: &str) -> Arc<Self> {
        Arc::new(Self {
            port: Some(Port::new(port)),
            reachable: AtomicBool::new(true),
        })
    }

    pub fn none() -> Arc<Self> {
        Arc::new(Self {
            port: None,
            reachable: AtomicBool::new(false),
        })
    }
}

impl PortSelector for FixedSelector {
    fn select(&self, _explicit: bool) -> Option<Port> {
        self.port.clone()
    }

    fn is_reachable(&self, _port: &Port) -> bool {
        self.reachable.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct FakeBoard {
    pub files: BTreeMap<String, Vec<u8>>,
    pub dirs: BTreeSet<String>,
    pub unreadable: BTreeSet<String>,
}

#[derive(Default)]
pub struct FakeRemote {
    pub board: Arc<Mutex<FakeBoard>>,
    pub log: Arc<Mutex<Vec<String>>>,
    pub closed: Arc<AtomicBool>,
    output: Option<Arc<dyn OutputSink>>,
}

impl Remote for FakeRemote {
    fn list(&mut self) -> Result<Vec<String>, RemoteError> {
        let board = self.board.lock().unwrap();
        let mut names: Vec<String> = board.dirs.iter().map(|d| format!("{}/", d)).collect();
        names.extend(board.files.keys().cloned());
        names.sort();
        Ok(names)
    }

    fn fetch(&mut self, name: &str) -> Result<Vec<u8>, RemoteError> {
        let board = self.board.lock().unwrap();
        if board.unreadable.contains(name) {
            return Err(RemoteError::Transport(format!("read of {} timed out", name)));
        }
        board
            .files
            .get(name)
            .cloned()
            .ok_or_else(|| RemoteError::Rejected(format!("No such file: {}", name)))
    }

    fn store(&mut self, name: &str, data: &[u8]) -> Result<(), RemoteError> {
        let mut board = self.board.lock().unwrap();
        if board.dirs.contains(name) {
            return Err(RemoteError::Rejected(format!("Is a directory: {}", name)));
        }
        board.files.insert(name.to_string(), data.to_vec());
        Ok(())
    }

    fn remove(&mut self, name: &str) -> Result<(), RemoteError> {
        match self.board.lock().unwrap().files.remove(name) {
            Some(_) => Ok(()),
            None => Err(RemoteError::Rejected(format!("No such file: {}", name))),
        }
    }

    fn make_dir(&mut self, name: &str) -> Result<(), RemoteError> {
        if self.board.lock().unwrap().dirs.insert(name.to_string()) {
            Ok(())
        } else {
            Err(RemoteError::DirectoryExists(name.to_string()))
        }
    }

    fn remove_dir(&mut self, name: &str) -> Result<(), RemoteError> {
        if self.board.lock().unwrap().dirs.remove(name) {
            Ok(())
        } else {
            Err(RemoteError::Rejected(format!("No such directory: {}", name)))
        }
    }

    fn run(&mut self, script: &[u8], cancel: &CancelToken) -> Result<(), RemoteError> {
        let script = String::from_utf8_lossy(script);
        if script.contains("loop") {
            while !cancel.is_cancelled() {
                std::thread::sleep(Duration::from_millis(1));
            }
            return Err(RemoteError::Interrupted);
        }
        if script.contains("raise") {
            return Err(RemoteError::Rejected("Traceback: ValueError".to_string()));
        }
        if let Some(output) = &self.output {
            output.print(&script);
        }
        Ok(())
    }

    fn reset(&mut self) -> Result<(), RemoteError> {
        self.log.lock().unwrap().push("reset".to_string());
        Ok(())
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
        self.log.lock().unwrap().push("close".to_string());
    }
}

#[derive(Default)]
pub struct FakeConnector {
    pub board: Arc<Mutex<FakeBoard>>,
    pub connects: AtomicUsize,
    pub deny_access: AtomicBool,
    pub offline: AtomicBool,
    log: Arc<Mutex<Vec<String>>>,
}

impl FakeConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn add_file(&self, name: &str, data: &[u8]) {
        self.board
            .lock()
            .unwrap()
            .files
            .insert(name.to_string(), data.to_vec());
    }
}

impl Connector for FakeConnector {
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
                reason: "no response".to_string(),
            });
        }

        self.connects.fetch_add(1, Ordering::SeqCst);
        self.log.lock().unwrap().push("connect".to_string());
        Ok(Box::new(FakeRemote {
            board: Arc::clone(&self.board),
            log: Arc::clone(&self.log),
            closed: Arc::new(AtomicBool::new(false)),
            output: Some(output),
        }))
    }
}

pub struct ScriptedPrompt {
    answer: Answer,
    pub asked: Mutex<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn new(answer: Answer) -> Arc<Self> {
        Arc::new(Self {
            answer,
            asked: Mutex::new(Vec::new()),
        })
    }
}

impl Prompt for ScriptedPrompt {
    fn ask(&self, caption: &str, _yes: &str, _no: &str) -> Answer {
        self.asked.lock().unwrap().push(caption.to_string());
        self.answer
    }
}

#[derive(Default)]
pub struct FakeProject {
    pub folders: Mutex<Vec<PathBuf>>,
    pub added: Mutex<Vec<(PathBuf, bool)>>,
}

impl FakeProject {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl Project for FakeProject {
    fn contains(&self, folder: &Path) -> bool {
        self.folders.lock().unwrap().iter().any(|f| f == folder)
    }

    fn add_folder(&self, folder: &Path, append: bool) {
        self.added
            .lock()
            .unwrap()
            .push((folder.to_path_buf(), append));
    }
}
