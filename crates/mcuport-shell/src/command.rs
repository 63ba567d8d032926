//! Parsing of shell input lines

use crate::error::ShellError;
use mcuport_core::Operation;
use std::path::PathBuf;

/// Board commands understood by the shell, in help order
pub const COMMANDS: &[&str] = &[
    "get", "get-all", "ls", "mkdir", "put", "reset", "rm", "rmdir", "run", "usage",
];

/// Shell meta commands
pub const META_COMMANDS: &[&str] = &[":?", ":help", ":q", ":quit", "exit", "quit"];

/// One parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    /// Board operation to dispatch
    Run(Operation),
    /// Show the shell's own help
    Help,
    /// Leave the shell
    Quit,
}

fn required(command: &str, arg: &str, what: &str) -> Result<String, ShellError> {
    if arg.is_empty() {
        Err(ShellError::InvalidArgument(format!(
            "{} requires {}",
            command, what
        )))
    } else {
        Ok(arg.to_string())
    }
}

/// Parse one non-empty input line
///
/// Everything after the command word is the argument, so paths may contain
/// spaces.
pub fn parse_command(line: &str) -> Result<ShellCommand, ShellError> {
    let line = line.trim();
    let (command, arg) = match line.split_once(char::is_whitespace) {
        Some((command, arg)) => (command, arg.trim()),
        None => (line, ""),
    };

    let operation = match command {
        ":?" | ":help" => return Ok(ShellCommand::Help),
        ":q" | ":quit" | "exit" | "quit" => return Ok(ShellCommand::Quit),
        "ls" => Operation::List,
        "get" => Operation::Get(required(command, arg, "a file name")?),
        "get-all" => Operation::GetAll(PathBuf::from(required(command, arg, "a destination")?)),
        "put" => Operation::Put(PathBuf::from(required(command, arg, "a local path")?)),
        "rm" => Operation::Remove(required(command, arg, "a file name")?),
        "mkdir" => Operation::MakeDir(required(command, arg, "a directory name")?),
        "rmdir" => Operation::RemoveDir(required(command, arg, "a directory name")?),
        "run" => Operation::Run(PathBuf::from(required(command, arg, "a script path")?)),
        "reset" => Operation::Reset,
        "usage" | "help" => Operation::Help,
        other => {
            return Err(ShellError::InvalidArgument(format!(
                "Unknown command: {}",
                other
            )))
        }
    };

    Ok(ShellCommand::Run(operation))
}

/// Whether `word` is a command the shell knows
pub fn is_known(word: &str) -> bool {
    COMMANDS.contains(&word) || META_COMMANDS.contains(&word) || word == "help"
}
