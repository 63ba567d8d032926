//! Interactive console for issuing board commands
//!
//! Keeps one port for the life of the process and turns every input line
//! into an [`Operation`](mcuport_core::Operation) for the
//! [`Dispatcher`]. Output of the board goes to the dispatcher's output sink;
//! the shell itself only prints its banner, errors and help.
//!
//! # Example Session
//!
//! ```text
//! mcuport > ls
//!
//! >> ls
//!
//! boot.py
//! lib/
//!
//! mcuport > get boot.py
//! ```
//!
//! Features:
//!
//! - Command history with arrow key navigation
//! - Tab completion for command names and local paths
//! - Colouring of the command word

mod command;
mod error;
pub mod highlight;

pub use command::{parse_command, ShellCommand, COMMANDS};
pub use error::ShellError;

use crate::highlight::ShellHelper;
use colored::Colorize;
use directories::ProjectDirs;
use mcuport_core::Dispatcher;
use rustyline::config::Configurer;
use rustyline::error::ReadlineError;
use rustyline::history::FileHistory;
use rustyline::Editor;
use std::io::Write;
use std::path::PathBuf;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the banner
fn get_banner() -> String {
    format!(
        r#"
   mcuport    Version {}
   MicroPython board console, :? for help
"#,
        VERSION
    )
    .bright_yellow()
    .bold()
    .to_string()
}

/// Get the history file path
fn get_history_path() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "mcuport") {
        let mut path = proj_dirs.data_dir().to_path_buf();
        std::fs::create_dir_all(&path).ok();
        path.push("shell_history");
        path
    } else {
        PathBuf::from(".mcuport_history")
    }
}

/// Run the interactive shell until the user quits
pub fn run_shell(dispatcher: &Dispatcher) -> Result<(), ShellError> {
    let mut rl = Editor::<ShellHelper, FileHistory>::new()?;
    rl.set_helper(Some(ShellHelper::new()));
    rl.set_auto_add_history(false);

    // Load history
    let history_path = get_history_path();
    if rl.load_history(&history_path).is_err() {
        log::debug!("No shell history at {}", history_path.display());
    }

    println!("{}", get_banner());
    println!(
        "Type {} for the board commands, {} to exit.",
        "usage".bright_cyan(),
        ":q".bright_cyan()
    );
    println!();

    let prompt = format!("{} ", "mcuport >".bright_green().bold());

    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(input);

                match parse_command(input) {
                    Ok(ShellCommand::Quit) => {
                        println!("Goodbye!");
                        break;
                    }
                    Ok(ShellCommand::Help) => print_help(),
                    Ok(ShellCommand::Run(operation)) => {
                        if let Err(e) = dispatcher.dispatch(operation) {
                            eprintln!("{}: {}", "Error".bright_red().bold(), e);
                        }
                        dispatcher.manager().wait_background();
                        println!();
                    }
                    Err(e) => eprintln!("{}: {}", "Error".bright_red().bold(), e),
                }

                let _ = std::io::stdout().flush();
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                eprintln!("{}: {:?}", "Error".bright_red().bold(), err);
                break;
            }
        }
    }

    // Save history
    if let Err(e) = rl.save_history(&history_path) {
        eprintln!(
            "{}: Failed to save history: {}",
            "Warning".bright_yellow(),
            e
        );
    }

    Ok(())
}

/// Print help message
fn print_help() {
    println!(
        "
    {}  -- board commands (ls, get, put, run, ...)
    {}    -- displays this help
    {}    -- exits the shell
    ",
        "usage".bright_cyan(),
        ":? | :help".bright_cyan(),
        ":q | :quit".bright_cyan(),
    );
}
