//! Local side of file transfers: reading uploads and writing bulk fetches

use super::outcome::{ErrorKind, Outcome};
use crate::console::OutputSink;
use crate::remote::{Remote, RemoteError};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// A local file or folder read into memory before the remote call starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Upload {
    /// Single file stored under its base name
    File { name: String, data: Vec<u8> },
    /// Folder stored recursively; directories precede their contents
    Tree(Vec<UploadEntry>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum UploadEntry {
    Dir(String),
    File { name: String, data: Vec<u8> },
}

fn base_name(path: &Path) -> io::Result<String> {
    let resolved;
    let path = if path.file_name().is_some() {
        path
    } else {
        // `.` and `..` only have a name once resolved
        resolved = fs::canonicalize(path)?;
        resolved.as_path()
    };
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))
}

/// Read `path` (file or folder) for upload
pub(crate) fn read_upload(path: &Path) -> io::Result<Upload> {
    let metadata = fs::metadata(path)?;
    let name = base_name(path)?;

    if !metadata.is_dir() {
        let data = fs::read(path)?;
        return Ok(Upload::File { name, data });
    }

    let mut entries = vec![UploadEntry::Dir(name.clone())];
    collect_tree(path, &name, &mut entries)?;
    Ok(Upload::Tree(entries))
}

fn collect_tree(dir: &Path, remote: &str, entries: &mut Vec<UploadEntry>) -> io::Result<()> {
    let mut children: Vec<PathBuf> = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<io::Result<_>>()?;
    children.sort();

    for child in children {
        let name = format!("{}/{}", remote, base_name(&child)?);
        if child.is_dir() {
            entries.push(UploadEntry::Dir(name.clone()));
            collect_tree(&child, &name, entries)?;
        } else {
            let data = fs::read(&child)?;
            entries.push(UploadEntry::File { name, data });
        }
    }
    Ok(())
}

/// Store an upload on the board. Existing remote directories are reused.
pub(crate) fn store_upload(remote: &mut dyn Remote, upload: &Upload) -> Result<(), RemoteError> {
    match upload {
        Upload::File { name, data } => remote.store(name, data),
        Upload::Tree(entries) => {
            for entry in entries {
                match entry {
                    UploadEntry::Dir(name) => match remote.make_dir(name) {
                        Ok(()) | Err(RemoteError::DirectoryExists(_)) => {}
                        Err(e) => return Err(e),
                    },
                    UploadEntry::File { name, data } => remote.store(name, data)?,
                }
            }
            Ok(())
        }
    }
}

/// Map a remote entry name below `dest`, refusing names that would escape it
fn local_target(dest: &Path, name: &str) -> Option<PathBuf> {
    let relative = Path::new(name.trim_start_matches('/'));
    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes || relative.as_os_str().is_empty() {
        return None;
    }
    Some(dest.join(relative))
}

/// Copy every remote entry into `dest`
///
/// Stops at the first failure. The returned outcome is a failure in that
/// case, `None` means every entry was retrieved.
pub(crate) fn fetch_all(
    remote: &mut dyn Remote,
    dest: &Path,
    sink: &dyn OutputSink,
) -> Option<Outcome> {
    if let Err(e) = fs::create_dir_all(dest) {
        return Some(Outcome::local_io(dest.display(), &e));
    }

    let names = match remote.list() {
        Ok(names) => names,
        Err(e) => return Some(Outcome::remote(e)),
    };

    for name in names {
        sink.print(&format!("\nRetrieving {} ...", name));

        let Some(target) = local_target(dest, &name) else {
            return Some(Outcome::failure(
                ErrorKind::RemoteOperation,
                format!("Refusing to store {} outside {}", name, dest.display()),
            ));
        };

        if name.ends_with('/') {
            if let Err(e) = fs::create_dir_all(&target) {
                return Some(Outcome::local_io(target.display(), &e));
            }
            continue;
        }

        let data = match remote.fetch(&name) {
            Ok(data) => data,
            Err(e) => return Some(Outcome::remote(e)),
        };
        let written = match target.parent() {
            Some(parent) => fs::create_dir_all(parent).and_then(|()| fs::write(&target, &data)),
            None => fs::write(&target, &data),
        };
        if let Err(e) = written {
            return Some(Outcome::local_io(target.display(), &e));
        }
        log::trace!("Retrieved {} ({} bytes)", name, data.len());
    }

    None
}
