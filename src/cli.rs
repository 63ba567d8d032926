//! CLI argument parsing

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mcuport")]
#[command(author, version, about = "MicroPython board file manager and firmware flasher", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Serial port of the board (`dummy` selects the emulated board)
    /// Defaults to the first serial port found
    #[arg(short, long, global = true, env = "MCUPORT_PORT")]
    pub port: Option<String>,

    /// Pick the port from a list instead of using the default
    #[arg(long, global = true)]
    pub select: bool,

    /// Directory with board files (<board>.json)
    /// Defaults to looking in ./boards/ and /usr/share/mcuport/boards/
    #[arg(long, global = true)]
    pub boards: Option<PathBuf>,

    /// Firmware root directory, one sub-directory per board
    #[arg(long, global = true, default_value = "firmware")]
    pub firmware: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

/// Answer to the erase prompt given on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EraseChoice {
    /// Erase the flash before writing
    Yes,
    /// Write without erasing
    No,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the files and directories on the board
    Ls,

    /// Print a file from the board
    Get {
        /// Remote file name
        name: String,
    },

    /// Copy every file from the board into a local directory
    GetAll {
        /// Destination directory
        dest: PathBuf,
    },

    /// Put a file or folder and its contents on the board
    Put {
        /// Local file or directory
        path: PathBuf,
    },

    /// Remove a file from the board
    Rm {
        /// Remote file name
        name: String,
    },

    /// Create a directory on the board
    Mkdir {
        /// Remote directory name
        name: String,
    },

    /// Remove a directory and all its content from the board
    Rmdir {
        /// Remote directory name
        name: String,
    },

    /// Run a local script on the board and print its output
    Run {
        /// Script to run
        path: PathBuf,
    },

    /// Soft reset of the board
    Reset,

    /// Show the board command usage
    Usage,

    /// List serial ports
    Ports,

    /// List available board definitions
    Boards,

    /// List firmware images available for a board
    Firmware {
        /// Board name
        board: String,
    },

    /// Flash firmware with esptool
    Flash {
        /// Board name (board file without .json)
        #[arg(short, long)]
        board: String,

        /// Firmware image; picked from the board's firmware folder if omitted
        #[arg(short = 'f', long)]
        firmware_file: Option<PathBuf>,

        /// Erase the flash first; asked interactively if omitted
        #[arg(long, value_enum)]
        erase: Option<EraseChoice>,

        /// Flashing tool executable
        #[arg(long, env = "MCUPORT_ESPTOOL", default_value = "esptool.py")]
        esptool: PathBuf,
    },

    /// Interactive console for board commands
    Console,
}
