//! End-to-end dispatch against the emulated board

use mcuport_core::{
    Answer, Console, Dispatcher, ErrorKind, Operation, Outcome, OutputSink, Port, PortSelector,
    Project, Prompt, Reply, SessionManager, SessionState,
};
use mcuport_dummy::{DummyBoard, DummyConnector, DUMMY_PORT};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Transcript(Mutex<String>);

impl Transcript {
    fn take(&self) -> String {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

impl OutputSink for Transcript {
    fn print(&self, text: &str) {
        self.0.lock().unwrap().push_str(text);
    }

    fn focus(&self) {}
}

struct SingleConsole(Arc<Transcript>);

impl Console for SingleConsole {
    fn sink(&self, _port: &Port) -> Arc<dyn OutputSink> {
        self.0.clone()
    }

    fn unbound_sink(&self) -> Arc<dyn OutputSink> {
        self.0.clone()
    }

    fn refresh(&self) {}

    fn set_busy(&self, _port: &Port) {}

    fn clear_busy(&self) {}
}

struct DummySelector;

impl PortSelector for DummySelector {
    fn select(&self, _explicit: bool) -> Option<Port> {
        Some(Port::new(DUMMY_PORT))
    }

    fn is_reachable(&self, _port: &Port) -> bool {
        true
    }
}

struct AlwaysAppend;

impl Prompt for AlwaysAppend {
    fn ask(&self, _caption: &str, _yes: &str, _no: &str) -> Answer {
        Answer::No
    }
}

#[derive(Default)]
struct Folders(Mutex<Vec<(PathBuf, bool)>>);

impl Project for Folders {
    fn contains(&self, folder: &Path) -> bool {
        self.0.lock().unwrap().iter().any(|(f, _)| f == folder)
    }

    fn add_folder(&self, folder: &Path, append: bool) {
        self.0.lock().unwrap().push((folder.to_path_buf(), append));
    }
}

struct Rig {
    connector: Arc<DummyConnector>,
    transcript: Arc<Transcript>,
    folders: Arc<Folders>,
    dispatcher: Dispatcher,
}

impl Rig {
    fn new() -> Self {
        let connector = Arc::new(DummyConnector::new(DummyBoard::new_default()));
        let transcript = Arc::new(Transcript::default());
        let folders = Arc::new(Folders::default());
        let manager = Arc::new(SessionManager::new(
            Arc::new(DummySelector),
            connector.clone(),
            Arc::new(SingleConsole(transcript.clone())),
        ));
        let dispatcher = Dispatcher::new(manager, Arc::new(AlwaysAppend), folders.clone());
        Self {
            connector,
            transcript,
            folders,
            dispatcher,
        }
    }

    fn dispatch(&self, operation: Operation) -> Outcome {
        let outcome = self.dispatcher.dispatch(operation).unwrap();
        self.dispatcher.manager().wait_background();
        outcome
    }
}

#[test]
fn test_project_round_trip() {
    let rig = Rig::new();
    let workspace = tempfile::tempdir().unwrap();

    let project = workspace.path().join("weather");
    fs::create_dir_all(project.join("lib")).unwrap();
    fs::write(project.join("main.py"), "print('hello')\n").unwrap();
    fs::write(project.join("lib").join("bme280.py"), "ADDRESS = 0x76\n").unwrap();

    assert!(rig.dispatch(Operation::Put(project.clone())).is_success());
    assert_eq!(rig.transcript.take(), "\n\n>> put weather\n\n[done]");

    let board = rig.connector.board();
    assert!(board.has_dir("weather/lib"));
    assert_eq!(
        board.file("weather/lib/bme280.py").unwrap(),
        b"ADDRESS = 0x76\n"
    );

    // a second upload of the same folder reuses the remote directories
    assert!(rig.dispatch(Operation::Put(project)).is_success());
    rig.transcript.take();

    let listing = rig.dispatch(Operation::List);
    assert_eq!(
        listing,
        Outcome::Success(Reply::Names(vec![
            "boot.py".into(),
            "weather/".into(),
            "weather/lib/".into(),
            "weather/lib/bme280.py".into(),
            "weather/main.py".into(),
        ]))
    );

    let backup = workspace.path().join("backup");
    assert!(rig.dispatch(Operation::GetAll(backup.clone())).is_success());
    assert_eq!(
        fs::read_to_string(backup.join("weather/lib/bme280.py")).unwrap(),
        "ADDRESS = 0x76\n"
    );
    assert_eq!(*rig.folders.0.lock().unwrap(), [(backup, true)]);
}

#[test]
fn test_run_and_reset() {
    let rig = Rig::new();
    let workspace = tempfile::tempdir().unwrap();
    let script = workspace.path().join("blink.py");
    fs::write(&script, "print('on')\nprint('off')\n").unwrap();

    assert_eq!(rig.dispatch(Operation::Run(script)), Outcome::Success(Reply::Ran));
    assert!(rig.transcript.take().ends_with("---on\r\noff\r\n\n[done]"));

    assert!(rig.dispatch(Operation::Reset).is_success());
    assert_eq!(rig.connector.board().resets(), 1);
}

#[test]
fn test_get_renders_normalized_content() {
    let rig = Rig::new();
    rig.dispatch(Operation::Get("boot.py".into()));
    let text = rig.transcript.take();
    assert!(text.starts_with("\n\n>> get boot.py\n\n# This file"));
    assert!(!text.contains('\r'));
}

#[test]
fn test_offline_board_recovers_after_finish() {
    let rig = Rig::new();
    rig.connector.offline.store(true, Ordering::SeqCst);

    let outcome = rig.dispatch(Operation::List);
    assert_eq!(outcome.error_kind(), Some(ErrorKind::SessionNotReady));

    rig.connector.offline.store(false, Ordering::SeqCst);
    assert!(rig.dispatch(Operation::List).is_success());

    // the reconnect after the last operation left a session open
    let session = rig
        .dispatcher
        .manager()
        .active(&Port::new(DUMMY_PORT))
        .unwrap();
    assert_eq!(session.state(), SessionState::Open);
}

#[test]
fn test_exclusive_session_per_port() {
    let rig = Rig::new();
    let manager = rig.dispatcher.manager();

    let first = manager.open(false, false).unwrap().unwrap().session.unwrap();
    let second = manager.open(false, false).unwrap().unwrap().session.unwrap();

    assert_eq!(first.state(), SessionState::Closed);
    assert!(second.is_live());
    manager.shutdown();
    assert!(!second.is_live());
}
