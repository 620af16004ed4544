//! Writing planned files to disk and comparing them with what is there.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use similar::{ChangeTag, TextDiff};

use crate::error::{GenerateError, Result};
use crate::plan::GeneratedFile;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub written: usize,
    pub unchanged: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    UpToDate,
    Missing,
    Stale { diff: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCheck {
    pub path: PathBuf,
    pub status: FileStatus,
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> GenerateError + '_ {
    move |source| GenerateError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Read a file, treating absence as `None`.
fn read_existing(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_error(path)(err)),
    }
}

/// Write `files` under `root`, creating directories as needed. Files whose
/// contents already match are left untouched so build timestamps survive.
pub fn write_files(root: &Path, files: &[GeneratedFile]) -> Result<WriteSummary> {
    let mut summary = WriteSummary::default();
    for file in files {
        let path = root.join(&file.path);
        if read_existing(&path)?.as_deref() == Some(file.contents.as_str()) {
            summary.unchanged += 1;
            continue;
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }
        fs::write(&path, &file.contents).map_err(io_error(&path))?;
        debug!("wrote {}", path.display());
        summary.written += 1;
    }
    Ok(summary)
}

/// Compare `files` with the tree under `root` without writing anything.
pub fn check_files(root: &Path, files: &[GeneratedFile]) -> Result<Vec<FileCheck>> {
    files
        .iter()
        .map(|file| {
            let status = match read_existing(&root.join(&file.path))? {
                None => FileStatus::Missing,
                Some(existing) if existing == file.contents => FileStatus::UpToDate,
                Some(existing) => FileStatus::Stale {
                    diff: unified_diff(&existing, &file.contents),
                },
            };
            Ok(FileCheck {
                path: file.path.clone(),
                status,
            })
        })
        .collect()
}

/// Line diff between two strings using +/- prefixes.
pub fn unified_diff(old: &str, new: &str) -> String {
    let diff = TextDiff::from_lines(old, new);
    let mut output = String::new();
    for change in diff.iter_all_changes() {
        let prefix = match change.tag() {
            ChangeTag::Delete => '-',
            ChangeTag::Insert => '+',
            ChangeTag::Equal => ' ',
        };
        output.push(prefix);
        output.push_str(change.value());
        if change.missing_newline() {
            output.push('\n');
        }
    }
    output
}
