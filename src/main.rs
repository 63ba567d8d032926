//! mcuport - MicroPython board file manager and firmware flasher
//!
//! Works with a board attached to a serial port: list, fetch, upload and
//! remove files, run scripts, reset, and flash new firmware with esptool.
//!
//! # Architecture
//!
//! Every board command is an [`Operation`] handed to the
//! [`Dispatcher`], which owns the session lifecycle through the
//! [`SessionManager`]. The one-shot subcommands and the interactive
//! `console` share the same dispatcher, so a command typed in the console
//! behaves exactly like the equivalent subcommand.

mod cli;
mod commands;
mod connect;
mod console;
mod project;

use clap::Parser;
use cli::{Cli, Commands, EraseChoice};
use connect::PortRouter;
use console::{pick, TerminalConsole, TerminalPrompt};
use mcuport_core::{Answer, Dispatcher, Operation, Port, PortSelector, SessionManager};
use mcuport_flash::{BoardLibrary, ERASE_CAPTION};
use mcuport_serial::SerialPortSelector;
use project::ProjectFile;
use std::sync::Arc;

#[cfg(feature = "dummy")]
const VIRTUAL_PORTS: &[&str] = &[mcuport_dummy::DUMMY_PORT];
#[cfg(not(feature = "dummy"))]
const VIRTUAL_PORTS: &[&str] = &[];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    let selector = Arc::new(build_selector(cli.port.as_deref()));
    let console = Arc::new(TerminalConsole::new());
    let manager = Arc::new(SessionManager::new(
        selector.clone(),
        Arc::new(PortRouter::new()),
        console,
    ));

    let mut prompt = TerminalPrompt::new();
    if let Commands::Flash {
        erase: Some(choice),
        ..
    } = &cli.command
    {
        let answer = match choice {
            EraseChoice::Yes => Answer::Yes,
            EraseChoice::No => Answer::No,
        };
        prompt = prompt.with_answer(ERASE_CAPTION, answer);
    }
    let prompt = Arc::new(prompt);

    let project = Arc::new(ProjectFile::new(std::env::current_dir()?));
    let dispatcher = Dispatcher::new(manager.clone(), prompt.clone(), project);

    let cancel = dispatcher.cancel_token();
    ctrlc::set_handler(move || {
        if cancel.is_cancelled() {
            std::process::exit(130);
        }
        cancel.cancel();
        eprintln!("\nStopping... press Ctrl+C again to quit");
    })?;

    if cli.select && needs_port(&cli.command) && selector.select(true).is_none() {
        return Err("No serial port selected".into());
    }

    let library = BoardLibrary::new(cli.boards.as_deref());
    let result = execute(cli, &dispatcher, &library, prompt);

    manager.wait_background();
    manager.shutdown();

    if !result? {
        std::process::exit(1);
    }
    Ok(())
}

fn build_selector(preferred: Option<&str>) -> SerialPortSelector {
    let mut selector = SerialPortSelector::new()
        .with_preferred(preferred.map(Port::new))
        .with_picker(|ports| pick("Serial ports", ports).map(|i| ports[i].clone()));
    for port in VIRTUAL_PORTS {
        selector = selector.with_virtual_port(Port::new(*port));
    }
    selector
}

fn needs_port(command: &Commands) -> bool {
    !matches!(
        command,
        Commands::Ports | Commands::Boards | Commands::Firmware { .. } | Commands::Usage
    )
}

fn execute(
    cli: Cli,
    dispatcher: &Dispatcher,
    library: &BoardLibrary,
    prompt: Arc<TerminalPrompt>,
) -> Result<bool, Box<dyn std::error::Error>> {
    let operation = match cli.command {
        Commands::Ls => Operation::List,
        Commands::Get { name } => Operation::Get(name),
        Commands::GetAll { dest } => Operation::GetAll(dest),
        Commands::Put { path } => Operation::Put(path),
        Commands::Rm { name } => Operation::Remove(name),
        Commands::Mkdir { name } => Operation::MakeDir(name),
        Commands::Rmdir { name } => Operation::RemoveDir(name),
        Commands::Run { path } => Operation::Run(path),
        Commands::Reset => Operation::Reset,
        Commands::Usage => Operation::Help,
        Commands::Ports => {
            commands::list_ports(VIRTUAL_PORTS)?;
            return Ok(true);
        }
        Commands::Boards => {
            commands::list_boards(library)?;
            return Ok(true);
        }
        Commands::Firmware { board } => {
            commands::list_firmware(&cli.firmware, &board)?;
            return Ok(true);
        }
        Commands::Flash {
            board,
            firmware_file,
            erase: _,
            esptool,
        } => {
            let args = commands::FlashArgs {
                board,
                firmware_root: cli.firmware,
                firmware_file,
                esptool,
            };
            return commands::run_flash(args, library, dispatcher.manager(), prompt);
        }
        Commands::Console => {
            mcuport_shell::run_shell(dispatcher)?;
            return Ok(true);
        }
    };

    commands::run_operation(dispatcher, operation)
}
