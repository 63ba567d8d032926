//! Terminal implementations of the console collaborators
//!
//! Board output goes straight to stdout. A spinner is shown while a
//! connection is being opened and questions are read from stdin.

use indicatif::{ProgressBar, ProgressStyle};
use mcuport_core::{Answer, Console, OutputSink, Port, Prompt};
use std::collections::HashMap;
use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Stdout stream of one port, or of no port at all
#[derive(Default)]
pub struct TerminalSink {
    port: Option<Port>,
    focused: Arc<Mutex<Option<Port>>>,
}

impl OutputSink for TerminalSink {
    fn print(&self, text: &str) {
        let mut stdout = io::stdout().lock();
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }

    fn focus(&self) {
        let Some(port) = &self.port else {
            return;
        };
        let mut focused = self.focused.lock().unwrap_or_else(|e| e.into_inner());
        if focused.as_ref() != Some(port) {
            if focused.is_some() {
                println!("\n--- {} ---", port);
            }
            *focused = Some(port.clone());
        }
    }
}

/// [`Console`] on the controlling terminal
#[derive(Default)]
pub struct TerminalConsole {
    sinks: Mutex<HashMap<Port, Arc<TerminalSink>>>,
    focused: Arc<Mutex<Option<Port>>>,
    unbound: Arc<TerminalSink>,
    spinner: Mutex<Option<ProgressBar>>,
}

impl TerminalConsole {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Console for TerminalConsole {
    fn sink(&self, port: &Port) -> Arc<dyn OutputSink> {
        let mut sinks = self.sinks.lock().unwrap_or_else(|e| e.into_inner());
        sinks
            .entry(port.clone())
            .or_insert_with(|| {
                Arc::new(TerminalSink {
                    port: Some(port.clone()),
                    focused: self.focused.clone(),
                })
            })
            .clone()
    }

    fn unbound_sink(&self) -> Arc<dyn OutputSink> {
        self.unbound.clone()
    }

    fn refresh(&self) {
        let _ = io::stdout().flush();
    }

    fn set_busy(&self, port: &Port) {
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        let pb = ProgressBar::new_spinner();
        pb.set_style(style);
        pb.set_message(format!("Connecting to {}...", port));
        pb.enable_steady_tick(Duration::from_millis(100));

        let mut spinner = self.spinner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(old) = spinner.replace(pb) {
            old.finish_and_clear();
        }
    }

    fn clear_busy(&self) {
        if let Some(pb) = self
            .spinner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            pb.finish_and_clear();
        }
    }
}

/// Map typed input to an answer: `y` or the yes label, `n` or the no label
fn parse_answer(input: &str, yes: &str, no: &str) -> Answer {
    let input = input.trim().to_lowercase();
    if input == "y" || input == yes.to_lowercase() {
        Answer::Yes
    } else if input == "n" || input == no.to_lowercase() {
        Answer::No
    } else {
        Answer::Cancel
    }
}

fn read_line() -> Option<String> {
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line),
    }
}

/// [`Prompt`] reading answers from stdin, with optional preset answers
#[derive(Default)]
pub struct TerminalPrompt {
    presets: HashMap<String, Answer>,
}

impl TerminalPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `caption` with `answer` without asking
    pub fn with_answer(mut self, caption: &str, answer: Answer) -> Self {
        self.presets.insert(caption.to_string(), answer);
        self
    }
}

impl Prompt for TerminalPrompt {
    fn ask(&self, caption: &str, yes: &str, no: &str) -> Answer {
        if let Some(answer) = self.presets.get(caption) {
            log::debug!("{} -> {:?}", caption, answer);
            return *answer;
        }

        print!("\n{} [y = {}, n = {}, Enter = cancel] ", caption, yes, no);
        let _ = io::stdout().flush();
        match read_line() {
            Some(line) => parse_answer(&line, yes, no),
            None => Answer::Cancel,
        }
    }
}

/// Map a typed 1-based number to an index below `len`
fn parse_choice(input: &str, len: usize) -> Option<usize> {
    match input.trim().parse::<usize>() {
        Ok(n) if n >= 1 && n <= len => Some(n - 1),
        _ => None,
    }
}

/// Let the user pick one of `items`; `None` when nothing valid was chosen
pub fn pick<T: Display>(title: &str, items: &[T]) -> Option<usize> {
    if items.is_empty() {
        return None;
    }

    println!("{}:", title);
    for (i, item) in items.iter().enumerate() {
        println!("  [{}] {}", i + 1, item);
    }
    print!("Select [1-{}]: ", items.len());
    let _ = io::stdout().flush();

    let choice = read_line().and_then(|line| parse_choice(&line, items.len()));
    if choice.is_none() {
        log::info!("Nothing selected");
    }
    choice
}
