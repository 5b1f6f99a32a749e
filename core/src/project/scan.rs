//! Directory scanning into [`ProjectFile`] records.
//!
//! Honors `.gitignore` (inside or outside a git checkout) and a
//! project-specific `.diaryignore`, and skips hidden entries.

use super::ProjectFile;
use ignore::WalkBuilder;
use log::{debug, warn};
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use thiserror::Error;

/// Per-project ignore file, same syntax as `.gitignore`.
pub const IGNORE_FILE_NAME: &str = ".diaryignore";

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] ignore::Error),
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
}

#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Paths (relative to the root, or absolute) that are never reported,
    /// typically the project map itself.
    pub exclude: Vec<PathBuf>,
    /// Also walk hidden files and directories. `.git` is always skipped.
    pub include_hidden: bool,
}

/// Walk `root` and return every file with its modification time.
///
/// Paths are relative to `root` and the result is sorted by path.
pub fn scan_project(root: &Path, options: &ScanOptions) -> Result<Vec<ProjectFile>, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }

    let excluded: Vec<PathBuf> = options
        .exclude
        .iter()
        .map(|p| p.strip_prefix(root).unwrap_or(p).to_path_buf())
        .collect();

    let walker = WalkBuilder::new(root)
        .hidden(!options.include_hidden)
        .git_ignore(true)
        .require_git(false)
        .add_custom_ignore_filename(IGNORE_FILE_NAME)
        .filter_entry(|entry| entry.file_name() != ".git")
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.io_error().is_some() => {
                warn!("[scan_project] skipping unreadable entry: {e}");
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_path_buf();
        if excluded.contains(&relative) {
            continue;
        }

        let metadata = entry.metadata()?;
        files.push(ProjectFile::new(relative, modified_secs(&metadata)?));
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    debug!(
        "[scan_project] found {} files under {}",
        files.len(),
        root.display()
    );
    Ok(files)
}

/// Modification time in whole seconds since the Unix epoch.
fn modified_secs(metadata: &std::fs::Metadata) -> io::Result<i64> {
    let modified = metadata.modified()?;
    let secs = match modified.duration_since(UNIX_EPOCH) {
        Ok(d) => i64::try_from(d.as_secs()).unwrap_or(i64::MAX),
        Err(e) => -i64::try_from(e.duration().as_secs()).unwrap_or(i64::MAX),
    };
    Ok(secs)
}
