//! Collaborators owned by the editor or terminal surface
//!
//! The core never renders anything itself. Text goes to an [`OutputSink`]
//! bound to a port, decisions come back through a [`Prompt`], and fetched
//! folders are offered to the surrounding [`Project`].

use crate::port::Port;
use std::path::Path;
use std::sync::Arc;

/// Append-only console stream tied to one port
pub trait OutputSink: Send + Sync {
    /// Append text to the stream
    fn print(&self, text: &str);

    /// Bring the stream to the foreground
    fn focus(&self);
}

/// The console surface hosting one output sink per port
pub trait Console: Send + Sync {
    /// Bind (or create) the output sink for `port`
    fn sink(&self, port: &Port) -> Arc<dyn OutputSink>;

    /// Stream that is not bound to any port, used when no port resolved
    fn unbound_sink(&self) -> Arc<dyn OutputSink>;

    /// Re-render the console after a session has been re-established
    fn refresh(&self);

    /// Show the busy indicator while a connection to `port` is being opened
    fn set_busy(&self, port: &Port);

    /// Remove the busy indicator
    fn clear_busy(&self);
}

/// Answer of a three-way prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    /// First (affirmative) button
    Yes,
    /// Second button
    No,
    /// Dialog dismissed
    Cancel,
}

/// Yes/no/cancel dialog
pub trait Prompt: Send + Sync {
    /// Ask `caption`, labelling the two non-cancel choices `yes` and `no`
    fn ask(&self, caption: &str, yes: &str, no: &str) -> Answer;
}

/// The project (open folders) of the surrounding editor
pub trait Project: Send + Sync {
    /// Whether `folder` is already part of the project
    fn contains(&self, folder: &Path) -> bool;

    /// Add `folder` to the project. With `append` unset the folder replaces
    /// the current project, otherwise it is added next to it.
    fn add_folder(&self, folder: &Path, append: bool);
}
