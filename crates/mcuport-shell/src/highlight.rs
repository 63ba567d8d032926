//! Line editor helper: completion and colouring of the command word

use crate::command::{is_known, COMMANDS, META_COMMANDS};
use colored::Colorize;
use rustyline::completion::{Completer, FilenameCompleter, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use std::borrow::Cow;

/// Helper struct for rustyline that completes command names and local
/// paths, and colours the command word.
#[derive(Helper)]
pub struct ShellHelper {
    files: FilenameCompleter,
}

impl ShellHelper {
    /// Create a new helper
    pub fn new() -> Self {
        Self {
            files: FilenameCompleter::new(),
        }
    }
}

impl Default for ShellHelper {
    fn default() -> Self {
        Self::new()
    }
}

/// Command words starting with `prefix`, board commands first
pub fn complete_command(prefix: &str) -> Vec<String> {
    COMMANDS
        .iter()
        .chain(META_COMMANDS)
        .filter(|c| c.starts_with(prefix))
        .map(|c| c.to_string())
        .collect()
}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        let head = &line[..pos];
        let start = head.len() - head.trim_start().len();

        if head[start..].contains(char::is_whitespace) {
            // past the command word: complete local paths
            return self.files.complete(line, pos, ctx);
        }

        let candidates = complete_command(&head[start..])
            .into_iter()
            .map(|command| Pair {
                display: format!("{}", command.white()),
                replacement: command,
            })
            .collect();
        Ok((start, candidates))
    }
}

impl Validator for ShellHelper {}

impl Hinter for ShellHelper {
    type Hint = String;

    fn hint(&self, _line: &str, _pos: usize, _context: &Context) -> Option<String> {
        None
    }
}

impl Highlighter for ShellHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        let start = line.len() - line.trim_start().len();
        let end = line[start..]
            .find(char::is_whitespace)
            .map_or(line.len(), |i| start + i);
        let word = &line[start..end];
        if word.is_empty() {
            return Cow::Borrowed(line);
        }

        let colored = if is_known(word) {
            word.bright_blue().bold()
        } else {
            word.bright_red()
        };
        Cow::Owned(format!("{}{}{}", &line[..start], colored, &line[end..]))
    }

    fn highlight_char(&self, line: &str, _pos: usize, _forced: bool) -> bool {
        !line.is_empty()
    }
}
