//! Man page generator for mcuport
//!
//! Writes `mcuport.1` plus one `mcuport-<command>.1` page per subcommand.
//!
//! Usage: cargo run --bin gen-manpage -- [output-dir]

use clap::{Command, CommandFactory};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[path = "../cli.rs"]
mod cli;

fn write_page(man: clap_mangen::Man, path: PathBuf) -> io::Result<PathBuf> {
    let mut buffer = Vec::new();
    man.render(&mut buffer)?;
    fs::write(&path, buffer)?;
    Ok(path)
}

/// Render the top-level page and every visible subcommand page into `dir`
fn render_pages(root: Command, dir: &Path) -> io::Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let name = root.get_name().to_string();
    let mut pages = Vec::new();
    for sub in root.get_subcommands().filter(|s| !s.is_hide_set()) {
        let title = format!("{}-{}", name, sub.get_name());
        let man = clap_mangen::Man::new(sub.clone()).title(title.clone());
        pages.push(write_page(man, dir.join(format!("{}.1", title)))?);
    }

    let man = clap_mangen::Man::new(root);
    pages.insert(0, write_page(man, dir.join(format!("{}.1", name)))?);
    Ok(pages)
}

fn main() -> io::Result<()> {
    let output_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("man"));

    let pages = render_pages(cli::Cli::command(), &output_dir)?;
    for page in &pages {
        println!("  {}", page.display());
    }
    println!("{} man pages written to {}", pages.len(), output_dir.display());
    if let Some(first) = pages.first() {
        println!("View with: man -l {}", first.display());
    }

    Ok(())
}
