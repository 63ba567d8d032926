use super::operation::Operation;
use super::outcome::{normalize_line_endings, ErrorKind, Outcome, Reply};
use super::transfer::{fetch_all, read_upload, store_upload};
use crate::console::{Answer, OutputSink, Project, Prompt};
use crate::error::Result;
use crate::port::Port;
use crate::remote::{CancelToken, Remote, RemoteError};
use crate::session::{NotReady, Session, SessionManager};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Caption of the prompt shown after a successful bulk fetch
pub const ADD_FOLDER_CAPTION: &str =
    "files retrieved, would you like to add the folder to your current project?";

/// Runs the post-operation step exactly once, on every exit path
struct FinishGuard<'a> {
    manager: &'a Arc<SessionManager>,
    port: Option<Port>,
    quiet: bool,
    done: bool,
}

impl<'a> FinishGuard<'a> {
    fn new(manager: &'a Arc<SessionManager>, port: Option<Port>, quiet: bool) -> Self {
        Self {
            manager,
            port,
            quiet,
            done: false,
        }
    }

    fn run(&mut self) {
        if std::mem::replace(&mut self.done, true) {
            return;
        }
        match (&self.port, self.quiet) {
            (Some(port), false) => self.manager.finish(port),
            (Some(port), true) => self.manager.finish_quiet(port),
            (None, _) => self.manager.finish_unbound(),
        }
    }
}

impl Drop for FinishGuard<'_> {
    fn drop(&mut self) {
        self.run();
    }
}

/// Turns [`Operation`]s into remote calls against the current port
pub struct Dispatcher {
    manager: Arc<SessionManager>,
    prompt: Arc<dyn Prompt>,
    project: Arc<dyn Project>,
    cancel: CancelToken,
}

impl Dispatcher {
    /// Create a dispatcher on top of `manager`
    pub fn new(
        manager: Arc<SessionManager>,
        prompt: Arc<dyn Prompt>,
        project: Arc<dyn Project>,
    ) -> Self {
        Self {
            manager,
            prompt,
            project,
            cancel: CancelToken::new(),
        }
    }

    /// Session manager this dispatcher acquires sessions from
    pub fn manager(&self) -> &Arc<SessionManager> {
        &self.manager
    }

    /// Token that interrupts a running [`Operation::Run`]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Execute one operation
    ///
    /// The outcome is rendered to the port's output sink below the operation
    /// header and is also returned. When no port resolves, the operation is
    /// rendered to the console's unbound sink instead: `Help` still succeeds
    /// and everything else reports the session as not ready. Only fatal
    /// conditions (the port cannot be accessed at all) are returned as
    /// errors; in that case no reconnect is scheduled.
    pub fn dispatch(&self, operation: Operation) -> Result<Outcome> {
        let quiet = operation.is_quiet();
        let (port, sink, session) = match self.manager.open(false, quiet)? {
            Some(acquired) => (Some(acquired.port), acquired.sink, acquired.session),
            None => {
                log::info!("{}: no port selected", operation);
                (None, self.manager.console().unbound_sink(), None)
            }
        };

        let mut finish = FinishGuard::new(&self.manager, port.clone(), quiet);

        if let Some(header) = operation.header() {
            sink.print(&header);
        }

        let outcome = self.perform(&operation, session.as_deref(), sink.as_ref());
        sink.print(&outcome.render());

        let target = port.as_ref().map_or("no port", Port::name);
        match outcome.error_kind() {
            None => log::debug!("{} on {}: ok", operation, target),
            Some(kind) => log::info!("{} on {}: {}", operation, target, kind),
        }

        finish.run();

        if let Operation::GetAll(dest) = &operation {
            if outcome.is_success() {
                self.offer_folder(dest);
            }
        }

        Ok(outcome)
    }

    fn perform(
        &self,
        operation: &Operation,
        session: Option<&Session>,
        sink: &dyn OutputSink,
    ) -> Outcome {
        // Local inputs are read before anything touches the session, so a
        // local failure takes precedence over remote conditions.
        match operation {
            Operation::Help => Outcome::Success(Reply::Usage),
            Operation::List => with_remote(session, |remote| {
                remote.list().map(Reply::Names).into()
            }),
            Operation::Get(name) => with_remote(session, |remote| {
                remote
                    .fetch(name)
                    .map(|data| {
                        Reply::Content(normalize_line_endings(&String::from_utf8_lossy(&data)))
                    })
                    .into()
            }),
            Operation::GetAll(dest) => with_remote(session, |remote| {
                match fetch_all(remote, dest, sink) {
                    Some(failure) => failure,
                    None => Outcome::Success(Reply::Done),
                }
            }),
            Operation::Put(path) => {
                let upload = match read_upload(path) {
                    Ok(upload) => upload,
                    Err(e) => return Outcome::local_io(path.display(), &e),
                };
                with_remote(session, |remote| match store_upload(remote, &upload) {
                    Ok(()) => Outcome::Success(Reply::Done),
                    Err(e @ RemoteError::Interrupted) => Outcome::remote(e),
                    Err(e) => Outcome::failure(
                        ErrorKind::RemoteOperation,
                        format!("Error putting the file.\nReason: {}", e),
                    ),
                })
            }
            Operation::Remove(name) => with_remote(session, |remote| {
                remote.remove(name).map(|()| Reply::Done).into()
            }),
            Operation::MakeDir(name) => with_remote(session, |remote| {
                remote.make_dir(name).map(|()| Reply::Done).into()
            }),
            Operation::RemoveDir(name) => with_remote(session, |remote| {
                remote.remove_dir(name).map(|()| Reply::Done).into()
            }),
            Operation::Run(path) => {
                let script = match fs::read(path) {
                    Ok(script) => script,
                    Err(e) => return Outcome::local_io(path.display(), &e),
                };
                with_remote(session, |remote| {
                    self.cancel.reset();
                    let result = remote.run(&script, &self.cancel);
                    self.cancel.reset();
                    result.map(|()| Reply::Ran).into()
                })
            }
            Operation::Reset => with_remote(session, |remote| {
                remote.reset().map(|()| Reply::Done).into()
            }),
        }
    }

    /// Offer the fetched folder to the project unless it is already part of it
    fn offer_folder(&self, dest: &Path) {
        if self.project.contains(dest) {
            return;
        }

        let append = match self.prompt.ask(ADD_FOLDER_CAPTION, "Add", "Append") {
            Answer::Yes => false,
            Answer::No => true,
            Answer::Cancel => {
                log::debug!("{} not added to the project", dest.display());
                return;
            }
        };
        self.project.add_folder(dest, append);
    }
}

/// Run `call` with exclusive use of the session's remote, or report the
/// session as not ready
fn with_remote(
    session: Option<&Session>,
    call: impl FnOnce(&mut dyn Remote) -> Outcome,
) -> Outcome {
    let Some(session) = session else {
        return Outcome::not_ready();
    };

    match session.begin() {
        Ok(mut busy) => call(busy.remote()),
        Err(NotReady(state)) => {
            log::debug!("{}: session is {}", session.port(), state);
            Outcome::not_ready()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{NOT_READY_MESSAGE, USAGE};
    use crate::error::Error;
    use crate::testing::{FakeConnector, FakeConsole, FakeProject, FixedSelector, ScriptedPrompt};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::Duration;

    const PORT: &str = "/dev/ttyACM0";

    struct Harness {
        connector: Arc<FakeConnector>,
        console: Arc<FakeConsole>,
        prompt: Arc<ScriptedPrompt>,
        project: Arc<FakeProject>,
        dispatcher: Dispatcher,
    }

    impl Harness {
        fn new(answer: Answer) -> Self {
            let connector = FakeConnector::new();
            let console = FakeConsole::new();
            let prompt = ScriptedPrompt::new(answer);
            let project = FakeProject::new();
            let manager = Arc::new(SessionManager::new(
                FixedSelector::new(PORT),
                connector.clone(),
                console.clone(),
            ));
            let dispatcher = Dispatcher::new(manager, prompt.clone(), project.clone());
            Self {
                connector,
                console,
                prompt,
                project,
                dispatcher,
            }
        }

        fn run(&self, operation: Operation) -> Outcome {
            let outcome = self.dispatcher.dispatch(operation).unwrap();
            self.dispatcher.manager().wait_background();
            outcome
        }

        fn text(&self) -> String {
            self.console.sink_for(PORT).text()
        }

        fn connects(&self) -> usize {
            self.connector.connects.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn test_list_renders_names_and_reconnects() {
        let h = Harness::new(Answer::Yes);
        h.connector.add_file("boot.py", b"");
        h.connector.add_file("main.py", b"");

        let outcome = h.run(Operation::List);
        assert_eq!(
            outcome,
            Outcome::Success(Reply::Names(vec!["boot.py".into(), "main.py".into()]))
        );
        assert_eq!(h.text(), "\n\n>> ls\n\nboot.py\nmain.py");
        // one connection for the operation, one for the reconnect
        assert_eq!(h.connects(), 2);
        assert_eq!(h.console.refreshes(), 1);
    }

    #[test]
    fn test_get_normalizes_line_endings() {
        let h = Harness::new(Answer::Yes);
        h.connector.add_file("boot.py", b"import os\r\nos.sync()\r");

        h.run(Operation::Get("boot.py".into()));
        assert_eq!(h.text(), "\n\n>> get boot.py\n\nimport os\nos.sync()\n");
    }

    #[test]
    fn test_get_without_device_is_not_ready() {
        let h = Harness::new(Answer::Yes);
        h.connector.offline.store(true, Ordering::SeqCst);

        let outcome = h.run(Operation::Get("boot.py".into()));
        assert_eq!(outcome.error_kind(), Some(ErrorKind::SessionNotReady));
        assert!(h.text().ends_with(NOT_READY_MESSAGE));
        assert_eq!(h.console.refreshes(), 1);
    }

    #[test]
    fn test_put_missing_local_file() {
        let h = Harness::new(Answer::Yes);

        let outcome = h.run(Operation::Put(PathBuf::from("/no/such/file")));
        assert_eq!(outcome.error_kind(), Some(ErrorKind::LocalIo));
        assert!(h.text().starts_with("\n\n>> put file\n\n/no/such/file: "));
        assert_eq!(h.console.refreshes(), 1);
    }

    #[test]
    fn test_local_failure_takes_precedence_over_not_ready() {
        let h = Harness::new(Answer::Yes);
        h.connector.offline.store(true, Ordering::SeqCst);

        let outcome = h.run(Operation::Run(PathBuf::from("/no/such/script.py")));
        assert_eq!(outcome.error_kind(), Some(ErrorKind::LocalIo));
    }

    #[test]
    fn test_put_stores_base_name() {
        let h = Harness::new(Answer::Yes);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.py");
        fs::write(&path, b"print('hi')").unwrap();

        let outcome = h.run(Operation::Put(path));
        assert_eq!(outcome, Outcome::Success(Reply::Done));
        assert_eq!(h.text(), "\n\n>> put main.py\n\n[done]");
        assert_eq!(
            h.connector.board.lock().unwrap().files.get("main.py"),
            Some(&b"print('hi')".to_vec())
        );
    }

    #[test]
    fn test_put_rejected_by_board() {
        let h = Harness::new(Answer::Yes);
        h.connector.board.lock().unwrap().dirs.insert("main.py".into());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.py");
        fs::write(&path, b"print('hi')").unwrap();

        let outcome = h.run(Operation::Put(path));
        assert_eq!(outcome.error_kind(), Some(ErrorKind::RemoteOperation));
        assert_eq!(
            h.text(),
            "\n\n>> put main.py\n\nError putting the file.\nReason: Is a directory: main.py"
        );
        assert_eq!(h.console.refreshes(), 1);
    }

    #[test]
    fn test_remote_rejection_is_rendered_verbatim() {
        let h = Harness::new(Answer::Yes);

        let outcome = h.run(Operation::Remove("ghost.py".into()));
        assert_eq!(outcome.error_kind(), Some(ErrorKind::RemoteOperation));
        assert_eq!(h.text(), "\n\n>> rm ghost.py\n\nNo such file: ghost.py");

        h.connector.board.lock().unwrap().dirs.insert("lib".into());
        h.run(Operation::MakeDir("lib".into()));
        assert!(h.text().ends_with("\n\n>> mkdir lib\n\nDirectory already exists: lib"));
    }

    #[test]
    fn test_run_success() {
        let h = Harness::new(Answer::Yes);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blink.py");
        fs::write(&path, b"print('on')").unwrap();

        let outcome = h.run(Operation::Run(path));
        assert_eq!(outcome, Outcome::Success(Reply::Ran));
        assert_eq!(
            h.text(),
            "\n\n>> Run blink.py\n\n\"ctrl+c\" to stop the script.\n---print('on')\n[done]"
        );
    }

    #[test]
    fn test_run_fault_is_remote_failure() {
        let h = Harness::new(Answer::Yes);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.py");
        fs::write(&path, b"raise ValueError").unwrap();

        let outcome = h.run(Operation::Run(path));
        assert_eq!(outcome.error_kind(), Some(ErrorKind::RemoteOperation));
        assert!(h.text().ends_with("\n\nTraceback: ValueError"));
    }

    #[test]
    fn test_run_can_be_interrupted() {
        let h = Harness::new(Answer::Yes);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forever.py");
        fs::write(&path, b"loop").unwrap();

        let token = h.dispatcher.cancel_token();
        let stop = Arc::new(AtomicBool::new(false));
        let canceller = {
            let stop = stop.clone();
            thread::spawn(move || {
                while !stop.load(Ordering::SeqCst) {
                    token.cancel();
                    thread::sleep(Duration::from_millis(5));
                }
            })
        };

        let outcome = h.run(Operation::Run(path));
        stop.store(true, Ordering::SeqCst);
        canceller.join().unwrap();

        assert_eq!(outcome.error_kind(), Some(ErrorKind::Interrupted));
        assert!(h.text().ends_with("\n\n[interrupted]"));
        assert_eq!(h.console.refreshes(), 1);
    }

    #[test]
    fn test_interrupted_run_clears_cancel_request() {
        let h = Harness::new(Answer::Yes);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forever.py");
        fs::write(&path, b"loop").unwrap();

        let token = h.dispatcher.cancel_token();
        let canceller = {
            let token = token.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                token.cancel();
            })
        };

        let outcome = h.run(Operation::Run(path));
        canceller.join().unwrap();

        assert_eq!(outcome.error_kind(), Some(ErrorKind::Interrupted));
        assert!(!token.is_cancelled());
    }

    #[test]
    fn test_help_is_quiet() {
        let h = Harness::new(Answer::Yes);

        let outcome = h.run(Operation::Help);
        assert_eq!(outcome, Outcome::Success(Reply::Usage));
        assert_eq!(h.text(), USAGE);
        assert_eq!(h.connects(), 0);
        assert_eq!(h.console.sink_for(PORT).focus_count(), 0);
        assert_eq!(h.console.refreshes(), 1);
        assert!(h.dispatcher.manager().active(&Port::new(PORT)).is_none());
    }

    #[test]
    fn test_help_leaves_live_session_alone() {
        let h = Harness::new(Answer::Yes);
        let live = h
            .dispatcher
            .manager()
            .open(false, false)
            .unwrap()
            .unwrap()
            .session
            .unwrap();

        h.run(Operation::Help);
        assert!(live.is_live());
        assert_eq!(h.connects(), 1);
    }

    #[test]
    fn test_no_access_is_fatal_without_reconnect() {
        let h = Harness::new(Answer::Yes);
        h.connector.deny_access.store(true, Ordering::SeqCst);

        let err = h.dispatcher.dispatch(Operation::List).unwrap_err();
        h.dispatcher.manager().wait_background();

        assert!(matches!(err, Error::NoAccess { .. }));
        assert_eq!(h.console.refreshes(), 0);
        assert!(!h.text().contains(">> ls"));
    }

    fn portless() -> (Arc<FakeConsole>, Dispatcher) {
        let console = FakeConsole::new();
        let manager = Arc::new(SessionManager::new(
            FixedSelector::none(),
            FakeConnector::new(),
            console.clone(),
        ));
        let dispatcher = Dispatcher::new(
            manager,
            ScriptedPrompt::new(Answer::Yes),
            FakeProject::new(),
        );
        (console, dispatcher)
    }

    #[test]
    fn test_help_without_port_renders_usage() {
        let (console, dispatcher) = portless();

        let outcome = dispatcher.dispatch(Operation::Help).unwrap();
        assert_eq!(outcome, Outcome::Success(Reply::Usage));
        assert_eq!(console.unbound.text(), USAGE);
        assert_eq!(console.refreshes(), 1);
    }

    #[test]
    fn test_list_without_port_is_not_ready() {
        let (console, dispatcher) = portless();

        let outcome = dispatcher.dispatch(Operation::List).unwrap();
        dispatcher.manager().wait_background();
        assert_eq!(outcome.error_kind(), Some(ErrorKind::SessionNotReady));
        assert_eq!(
            console.unbound.text(),
            format!("\n\n>> ls\n\n\n{}", NOT_READY_MESSAGE)
        );
        // finish still runs once; there is no port to reconnect
        assert_eq!(console.refreshes(), 1);
        assert!(console.busy_events().is_empty());
    }

    #[test]
    fn test_finish_runs_once_per_dispatch() {
        let h = Harness::new(Answer::Yes);
        h.run(Operation::List);
        h.run(Operation::Get("missing.py".into()));
        h.run(Operation::Reset);

        assert_eq!(h.console.refreshes(), 3);
        assert_eq!(h.connects(), 6);
        assert!(h.connector.log().contains(&"reset".to_string()));
    }

    #[test]
    fn test_get_all_offers_folder() {
        let h = Harness::new(Answer::No);
        h.connector.add_file("boot.py", b"# boot");
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("backup");

        let outcome = h.run(Operation::GetAll(dest.clone()));
        assert_eq!(outcome, Outcome::Success(Reply::Done));
        assert_eq!(fs::read(dest.join("boot.py")).unwrap(), b"# boot");
        assert!(h.text().ends_with("\nRetrieving boot.py ...\n\n[done]"));
        assert_eq!(*h.prompt.asked.lock().unwrap(), [ADD_FOLDER_CAPTION]);
        assert_eq!(*h.project.added.lock().unwrap(), [(dest, true)]);
    }

    #[test]
    fn test_get_all_skips_known_folder() {
        let h = Harness::new(Answer::Yes);
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().to_path_buf();
        h.project.folders.lock().unwrap().push(dest.clone());

        h.run(Operation::GetAll(dest));
        assert!(h.prompt.asked.lock().unwrap().is_empty());
        assert!(h.project.added.lock().unwrap().is_empty());
    }

    #[test]
    fn test_get_all_failure_skips_prompt() {
        let h = Harness::new(Answer::Yes);
        h.connector.offline.store(true, Ordering::SeqCst);
        let dir = tempfile::tempdir().unwrap();

        let outcome = h.run(Operation::GetAll(dir.path().join("backup")));
        assert_eq!(outcome.error_kind(), Some(ErrorKind::SessionNotReady));
        assert!(h.prompt.asked.lock().unwrap().is_empty());
        assert_eq!(h.console.refreshes(), 1);
    }

    #[test]
    fn test_get_all_stops_at_failed_entry() {
        let h = Harness::new(Answer::Yes);
        h.connector.add_file("a.py", b"a");
        h.connector.add_file("b.py", b"b");
        h.connector.add_file("c.py", b"c");
        h.connector
            .board
            .lock()
            .unwrap()
            .unreadable
            .insert("b.py".into());
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("backup");

        let outcome = h.run(Operation::GetAll(dest.clone()));
        assert_eq!(outcome.error_kind(), Some(ErrorKind::RemoteOperation));
        assert_eq!(fs::read(dest.join("a.py")).unwrap(), b"a");
        assert!(!dest.join("b.py").exists());
        assert!(!dest.join("c.py").exists());
        assert!(!h.text().contains("Retrieving c.py"));
        assert!(h
            .text()
            .ends_with("\n\nTransport error: read of b.py timed out"));
        assert_eq!(h.console.refreshes(), 1);
        assert!(h.prompt.asked.lock().unwrap().is_empty());
    }

    #[test]
    fn test_get_all_cancelled_prompt() {
        let h = Harness::new(Answer::Cancel);
        let dir = tempfile::tempdir().unwrap();

        h.run(Operation::GetAll(dir.path().join("backup")));
        assert_eq!(h.prompt.asked.lock().unwrap().len(), 1);
        assert!(h.project.added.lock().unwrap().is_empty());
    }
}
