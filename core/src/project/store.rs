//! Project map persistence.
//!
//! The project map is a JSON array of [`ProjectFile`] records:
//! ```text
//! [
//!   { "path": "src/main.rs", "modified": 1718000000, "role": "source" },
//!   { "path": "notes.txt", "modified": 1718000042 }
//! ]
//! ```
//! Writes go to a temporary file next to the target which is then renamed
//! over it, so an interrupted save leaves the previous map intact.

use super::ProjectFile;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Project map {} does not match the expected schema: {message}", .path.display())]
    Schema { path: PathBuf, message: String },
    #[error("Duplicate path in project map: {}", .0.display())]
    DuplicatePath(PathBuf),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The serialized form of a project map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileClassificationList {
    pub files: Vec<ProjectFile>,
}

impl FileClassificationList {
    pub fn new(files: Vec<ProjectFile>) -> Self {
        Self { files }
    }

    /// Parse and validate a project map document.
    pub fn from_json(content: &str) -> Result<Self, StoreError> {
        Self::parse(content, Path::new("<memory>"))
    }

    fn parse(content: &str, origin: &Path) -> Result<Self, StoreError> {
        let list: Self = serde_json::from_str(content).map_err(|e| StoreError::Schema {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })?;
        if let Some(dup) = list.find_duplicate() {
            return Err(StoreError::Schema {
                path: origin.to_path_buf(),
                message: format!("path {} appears more than once", dup.display()),
            });
        }
        Ok(list)
    }

    /// Return the first path that occurs more than once.
    pub fn find_duplicate(&self) -> Option<&Path> {
        let mut seen = HashSet::with_capacity(self.files.len());
        self.files
            .iter()
            .map(|f| f.path.as_path())
            .find(|path| !seen.insert(*path))
    }

    /// Pretty-printed JSON with a trailing newline.
    pub fn to_json(&self) -> Result<String, StoreError> {
        let mut content = serde_json::to_string_pretty(self)?;
        content.push('\n');
        Ok(content)
    }
}

/// Load the project map at `path`. A missing file is an empty map.
pub fn load(path: &Path) -> Result<Vec<ProjectFile>, StoreError> {
    if !path.exists() {
        debug!("[load] no project map at {}", path.display());
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path)?;
    let list = FileClassificationList::parse(&content, path)?;
    debug!(
        "[load] read {} entries from {}",
        list.files.len(),
        path.display()
    );
    Ok(list.files)
}

/// Save the project map to `path` (atomic: write tmp + rename).
pub fn save(path: &Path, project_files: &[ProjectFile]) -> Result<(), StoreError> {
    let list = FileClassificationList::new(project_files.to_vec());
    if let Some(dup) = list.find_duplicate() {
        return Err(StoreError::DuplicatePath(dup.to_path_buf()));
    }
    let content = list.to_json()?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    // The temp file is created owner-only; keep the map's own mode instead
    match fs::metadata(path) {
        Ok(existing) => tmp.as_file().set_permissions(existing.permissions())?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => set_default_mode(tmp.as_file())?,
        Err(e) => return Err(e.into()),
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;

    debug!(
        "[save] wrote {} entries to {}",
        project_files.len(),
        path.display()
    );
    Ok(())
}

#[cfg(unix)]
fn set_default_mode(file: &fs::File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_default_mode(_file: &fs::File) -> io::Result<()> {
    Ok(())
}
