//! Operations that can be dispatched against a board

use std::fmt;
use std::path::{Path, PathBuf};

/// Usage block rendered by [`Operation::Help`]
pub const USAGE: &str = "\n\nUsage: mcuport COMMAND [ARGS]...

mcuport - manage files on a MicroPython board

Control MicroPython boards over a serial connection: manipulate files
on the board's internal filesystem and run scripts from the console.

Commands:
   get\t\t\tRetrieve a file from the board.
   ls\t\t\tList the contents of the board.
   mkdir\t\tCreate a directory on the board.
   put\t\t\tPut a file or folder and its contents on the board.
   reset\t\tPerform soft reset/reboot of the board.
   rm\t\t\tRemove a file from the board.
   rmdir\t\tForcefully remove a folder and all its content from board.
   run\t\t\tRun a script and print its output.
";

/// A single logical action against a board
///
/// Consumed by [`Dispatcher::dispatch`](crate::Dispatcher::dispatch).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// List every file and directory on the board
    List,
    /// Print the contents of a remote file
    Get(String),
    /// Copy every remote file into a local destination folder
    GetAll(PathBuf),
    /// Upload a local file, or a folder and its contents
    Put(PathBuf),
    /// Remove a remote file
    Remove(String),
    /// Create a remote directory
    MakeDir(String),
    /// Remove a remote directory and its contents
    RemoveDir(String),
    /// Execute a local script on the board
    Run(PathBuf),
    /// Soft reset of the board
    Reset,
    /// Show the usage block; needs no connection
    Help,
}

/// Last component of a path, for headers
pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl Operation {
    /// Short command name
    pub fn name(&self) -> &'static str {
        match self {
            Self::List => "ls",
            Self::Get(_) => "get",
            Self::GetAll(_) => "get-all",
            Self::Put(_) => "put",
            Self::Remove(_) => "rm",
            Self::MakeDir(_) => "mkdir",
            Self::RemoveDir(_) => "rmdir",
            Self::Run(_) => "run",
            Self::Reset => "reset",
            Self::Help => "help",
        }
    }

    /// Whether the operation works without a live session
    pub fn is_quiet(&self) -> bool {
        matches!(self, Self::Help)
    }

    /// Header echoed to the sink before the remote call starts
    pub fn header(&self) -> Option<String> {
        let header = match self {
            Self::List => "\n\n>> ls\n".to_string(),
            Self::Get(name) => format!("\n\n>> get {}", name),
            Self::GetAll(dest) => format!("\n\n>> Storing in {}\n", dest.display()),
            Self::Put(path) => format!("\n\n>> put {}", display_name(path)),
            Self::Remove(name) => format!("\n\n>> rm {}", name),
            Self::MakeDir(name) => format!("\n\n>> mkdir {}", name),
            Self::RemoveDir(name) => format!("\n\n>> rmdir {}", name),
            Self::Run(path) => format!(
                "\n\n>> Run {}\n\n\"ctrl+c\" to stop the script.\n---",
                display_name(path)
            ),
            Self::Reset => "\n\n>> reset".to_string(),
            Self::Help => return None,
        };
        Some(header)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get(name) | Self::Remove(name) | Self::MakeDir(name) | Self::RemoveDir(name) => {
                write!(f, "{} {}", self.name(), name)
            }
            Self::GetAll(path) | Self::Put(path) | Self::Run(path) => {
                write!(f, "{} {}", self.name(), path.display())
            }
            Self::List | Self::Reset | Self::Help => f.write_str(self.name()),
        }
    }
}
