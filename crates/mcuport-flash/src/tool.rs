//! Invocations of the external flashing tool

use crate::error::{FlashError, Result};
use mcuport_core::{FlashPlan, OutputSink, Port};
use std::fmt;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

/// Default flashing tool executable
pub const DEFAULT_ESPTOOL: &str = "esptool.py";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Arg {
    /// Option string; split on whitespace when passed to the tool
    Option(String),
    /// File path; passed as a single argument
    Path(PathBuf),
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Option(option) => f.write_str(option),
            Self::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Ordered argument list for one run of the flashing tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    args: Vec<Arg>,
}

fn port_arg(port: &Port) -> Arg {
    Arg::Option(format!("--port {}", port))
}

impl Invocation {
    /// `["--port <port>", <compiled options...>, <firmware>]`
    pub fn write(port: &Port, plan: FlashPlan, firmware: &Path) -> Self {
        let mut args = vec![port_arg(port)];
        args.extend(plan.into_options().into_iter().map(Arg::Option));
        args.push(Arg::Path(firmware.to_path_buf()));
        Self { args }
    }

    /// `["--port <port>", "erase_flash"]`
    pub fn erase(port: &Port) -> Self {
        Self {
            args: vec![port_arg(port), Arg::Option("erase_flash".to_string())],
        }
    }

    /// Arguments in their logical grouping (`"--port COM3"`, `"--baud 460800"`)
    pub fn args(&self) -> Vec<String> {
        self.args.iter().map(Arg::to_string).collect()
    }

    /// Arguments as handed to the process
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::new();
        for arg in &self.args {
            match arg {
                Arg::Option(option) => argv.extend(option.split_whitespace().map(str::to_string)),
                Arg::Path(path) => argv.push(path.display().to_string()),
            }
        }
        argv
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.args().join(" "))
    }
}

/// Something that can execute an [`Invocation`]
pub trait FlashTool: Send + Sync {
    /// Run the tool, streaming its console output to `sink`
    fn run(&self, invocation: &Invocation, sink: &dyn OutputSink) -> Result<()>;
}

/// esptool process runner
#[derive(Debug, Clone)]
pub struct Esptool {
    program: PathBuf,
}

impl Esptool {
    /// Runner for the given executable
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Executable that will be started
    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Default for Esptool {
    fn default() -> Self {
        Self::new(DEFAULT_ESPTOOL)
    }
}

fn forward_lines(stream: impl Read, sink: &dyn OutputSink) {
    for line in BufReader::new(stream).lines() {
        match line {
            Ok(line) => sink.print(&format!("{}\n", line)),
            Err(e) => {
                log::debug!("Stopped reading tool output: {}", e);
                break;
            }
        }
    }
}

impl FlashTool for Esptool {
    fn run(&self, invocation: &Invocation, sink: &dyn OutputSink) -> Result<()> {
        let tool = self.program.display().to_string();
        log::info!("Running {} {}", tool, invocation);

        let mut child = Command::new(&self.program)
            .args(invocation.argv())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| FlashError::Spawn {
                tool: tool.clone(),
                source,
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        thread::scope(|scope| {
            if let Some(stdout) = stdout {
                scope.spawn(move || forward_lines(stdout, sink));
            }
            if let Some(stderr) = stderr {
                scope.spawn(move || forward_lines(stderr, sink));
            }
        });

        let status = child.wait().map_err(|source| FlashError::Spawn {
            tool: tool.clone(),
            source,
        })?;
        if status.success() {
            Ok(())
        } else {
            Err(FlashError::ToolFailed {
                tool,
                status: status.to_string(),
            })
        }
    }
}
