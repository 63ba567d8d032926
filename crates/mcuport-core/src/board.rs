//! Board configuration and flash option compilation
//!
//! Each board ships a JSON file describing how the flashing tool must be
//! invoked for it:
//!
//! ```json
//! {
//!     "upload": {
//!         "--chip": "esp32",
//!         "--baud": "460800",
//!         "write_flash": "-z 0x1000",
//!         "--flash_mode=": "dio"
//!     }
//! }
//! ```
//!
//! [`compile`] turns the `upload` table into the ordered option list. Keys are
//! emitted in file order, except `write_flash` which always comes last so that
//! the firmware path appended by the caller directly follows it.

use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Reserved upload key carrying the memory-write instruction
pub const WRITE_FLASH_KEY: &str = "write_flash";

/// Errors loading a board configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The board file could not be read
    #[error("failed to read board file {path}: {source}")]
    Io {
        /// Board file path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The board file is not valid JSON
    #[error("invalid board file: {0}")]
    Parse(#[from] serde_json::Error),

    /// No `upload` object in the board file
    #[error("board file has no `upload` section")]
    MissingUpload,

    /// No `write_flash` key in the `upload` object
    #[error("board `upload` section has no `write_flash` key")]
    MissingWriteFlash,

    /// An upload value is not a string, number or boolean
    #[error("upload option `{0}` must be a scalar value")]
    InvalidValue(String),
}

/// Board file structure
#[derive(Debug, serde::Deserialize)]
struct BoardFile {
    upload: Option<Map<String, Value>>,
}

/// Declarative upload configuration of one board
///
/// Holds the `upload` flags in declaration order. A `BoardConfig` always has a
/// `write_flash` entry; construction fails otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardConfig {
    upload: Vec<(String, String)>,
}

impl BoardConfig {
    /// Build a configuration from ordered key/value pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let upload: Vec<(String, String)> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        if !upload.iter().any(|(key, _)| key == WRITE_FLASH_KEY) {
            return Err(ConfigError::MissingWriteFlash);
        }

        Ok(Self { upload })
    }

    /// Parse a board file
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let file: BoardFile = serde_json::from_str(content)?;
        let upload = file.upload.ok_or(ConfigError::MissingUpload)?;

        let mut pairs = Vec::with_capacity(upload.len());
        for (key, value) in upload {
            let value = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return Err(ConfigError::InvalidValue(key)),
            };
            pairs.push((key, value));
        }

        Self::from_pairs(pairs)
    }

    /// Load a board file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Upload flags in declaration order, `write_flash` included
    pub fn upload(&self) -> &[(String, String)] {
        &self.upload
    }

    /// Value of the `write_flash` key (the last one if it is repeated)
    pub fn write_flash(&self) -> &str {
        self.upload
            .iter()
            .rev()
            .find(|(key, _)| key == WRITE_FLASH_KEY)
            .map(|(_, value)| value.as_str())
            .unwrap_or_default()
    }
}

/// Ordered flashing-tool options compiled from a [`BoardConfig`]
///
/// Does not contain the port or firmware path; those depend on the runtime
/// selection and are added when the tool is invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashPlan {
    options: Vec<String>,
}

impl FlashPlan {
    /// Compiled options, `write_flash` last
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Consume the plan and return the option list
    pub fn into_options(self) -> Vec<String> {
        self.options
    }
}

/// Format one upload flag. Keys ending in `=` take their value directly.
fn format_option(key: &str, value: &str) -> String {
    let separator = if key.ends_with('=') { "" } else { " " };
    format!("{}{}{}", key, separator, value)
}

/// Compile a board configuration into its flashing options
pub fn compile(board: &BoardConfig) -> FlashPlan {
    let mut options: Vec<String> = board
        .upload()
        .iter()
        .filter(|(key, _)| key != WRITE_FLASH_KEY)
        .map(|(key, value)| format_option(key, value))
        .collect();

    options.push(format!("{} {}", WRITE_FLASH_KEY, board.write_flash()));

    FlashPlan { options }
}
