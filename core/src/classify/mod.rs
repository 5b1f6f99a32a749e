//! Incremental role classification.
//!
//! [`classify_files`] compares the scanned file list against the persisted
//! project map, sends only new or modified files to a [`RoleClassifier`],
//! and writes the merged map back.

pub mod batch;
pub mod claude;
pub mod prompt;
pub mod static_rules;

use crate::config::ClassifierConfig;
use crate::project::store::{self, FileClassificationList, StoreError};
use crate::project::{ProjectFile, Role};
use batch::{plan_batches, Batch, ModelTarget};
use futures::future::join_all;
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;

pub use claude::{check_claude_available, ClaudeRoleClassifier};
pub use static_rules::StaticRoleClassifier;

#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("Claude CLI not found. Install from https://claude.ai/code")]
    ClaudeNotFound,
    #[error("Claude command failed: {0}")]
    CommandFailed(String),
    #[error("Failed to parse model response: {0}")]
    ParseError(String),
    #[error("Empty response from model")]
    EmptyResponse,
    #[error("Model returned unknown role '{role}' for {}", .path.display())]
    InvalidRole { path: PathBuf, role: String },
    #[error("No role returned for {}", join_paths(.0))]
    MissingRoles(Vec<PathBuf>),
    #[error("Classification failed for {}: {reason}", join_paths(.paths))]
    Batch { paths: Vec<PathBuf>, reason: String },
    #[error("{} needs ~{tokens} tokens, more than the long-context budget of {budget}", .path.display())]
    TooLarge {
        path: PathBuf,
        tokens: usize,
        budget: usize,
    },
    #[error("Duplicate path in input: {}", .0.display())]
    DuplicatePath(PathBuf),
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// What the model sees for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDescriptor {
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
}

impl FileDescriptor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            excerpt: None,
        }
    }
}

/// A model that assigns a role to each file it is given.
///
/// Implementations must return one role per input path; extra paths are
/// ignored and missing ones fail the classification run.
pub trait RoleClassifier: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Prompt budget in estimated tokens.
    fn context_tokens(&self) -> usize;

    fn classify(&self, files: &[FileDescriptor]) -> Result<HashMap<PathBuf, Role>, ClassifyError>;
}

/// Classify `project_files`, reusing roles from the project map at `map_path`
/// for files whose modification time is unchanged.
///
/// The returned list has the same paths in the same order as `project_files`,
/// and is what gets written to `map_path`. Entries in the old map that are
/// not in `project_files` are dropped. On any error the map is left untouched.
pub async fn classify_files(
    map_path: &Path,
    project_files: Vec<ProjectFile>,
    model: Arc<dyn RoleClassifier>,
    long_context_model: Arc<dyn RoleClassifier>,
    config: &ClassifierConfig,
) -> Result<Vec<ProjectFile>, ClassifyError> {
    let input = FileClassificationList::new(project_files);
    if let Some(dup) = input.find_duplicate() {
        return Err(ClassifyError::DuplicatePath(dup.to_path_buf()));
    }
    let project_files = input.files;

    let previous = store::load(map_path)?;
    let previous_by_path: HashMap<&Path, &ProjectFile> =
        previous.iter().map(|f| (f.path.as_path(), f)).collect();

    let stale: Vec<FileDescriptor> = project_files
        .iter()
        .filter(|file| {
            !previous_by_path
                .get(file.path.as_path())
                .is_some_and(|prev| file.is_unchanged_from(prev))
        })
        .map(|file| describe(file, config))
        .collect();

    info!(
        "[classify_files] {} files, {} unchanged, {} to classify",
        project_files.len(),
        project_files.len() - stale.len(),
        stale.len()
    );

    let mut roles = if stale.is_empty() {
        HashMap::new()
    } else {
        let batches = plan_batches(
            stale,
            model.context_tokens(),
            long_context_model.context_tokens(),
            config.max_batch_files,
        )?;
        run_batches(batches, model, long_context_model, config.max_concurrent).await?
    };

    let merged: Vec<ProjectFile> = project_files
        .into_iter()
        .map(|file| {
            let role = roles.remove(&file.path).or_else(|| {
                previous_by_path
                    .get(file.path.as_path())
                    .and_then(|prev| prev.role)
            });
            ProjectFile { role, ..file }
        })
        .collect();

    store::save(map_path, &merged)?;
    Ok(merged)
}

/// Build the descriptor for a file, attaching an excerpt when configured.
fn describe(file: &ProjectFile, config: &ClassifierConfig) -> FileDescriptor {
    let mut descriptor = FileDescriptor::new(file.path.clone());
    if config.excerpt_chars == 0 {
        return descriptor;
    }

    let full_path = match &config.project_root {
        Some(root) if file.path.is_relative() => root.join(&file.path),
        _ => file.path.clone(),
    };
    match read_excerpt(&full_path, config.excerpt_chars) {
        Ok(excerpt) if !excerpt.trim().is_empty() => descriptor.excerpt = Some(excerpt),
        Ok(_) => {}
        Err(e) => debug!(
            "[describe] no excerpt for {}: {e}",
            full_path.display()
        ),
    }
    descriptor
}

/// Read up to `max_chars` characters from the start of a file.
fn read_excerpt(path: &Path, max_chars: usize) -> io::Result<String> {
    // 4 bytes covers the widest UTF-8 character
    let limit = u64::try_from(max_chars.saturating_mul(4)).unwrap_or(u64::MAX);
    let mut bytes = Vec::new();
    File::open(path)?.take(limit).read_to_end(&mut bytes)?;
    if bytes.contains(&0) {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "binary file"));
    }
    Ok(String::from_utf8_lossy(&bytes).chars().take(max_chars).collect())
}

/// Run every batch against its model and collect one role per path.
async fn run_batches(
    batches: Vec<Batch>,
    model: Arc<dyn RoleClassifier>,
    long_context_model: Arc<dyn RoleClassifier>,
    max_concurrent: usize,
) -> Result<HashMap<PathBuf, Role>, ClassifyError> {
    let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));

    debug!(
        "[run_batches] dispatching {} batches (max_concurrent={max_concurrent})",
        batches.len()
    );

    let tasks: Vec<_> = batches
        .into_iter()
        .enumerate()
        .map(|(index, batch)| {
            let sem = Arc::clone(&semaphore);
            let classifier = match batch.target {
                ModelTarget::Default => Arc::clone(&model),
                ModelTarget::LongContext => Arc::clone(&long_context_model),
            };
            let paths: Vec<PathBuf> = batch.files.iter().map(|f| f.path.clone()).collect();
            let handle = tokio::spawn(async move {
                let _permit = sem
                    .acquire()
                    .await
                    .map_err(|e| ClassifyError::CommandFailed(format!("Semaphore closed: {e}")))?;
                debug!(
                    "[run_batches] batch {index}: {} files via {}",
                    batch.files.len(),
                    classifier.name()
                );
                tokio::task::spawn_blocking(move || classifier.classify(&batch.files))
                    .await
                    .map_err(|e| ClassifyError::CommandFailed(format!("Task join error: {e}")))?
            });
            (paths, handle)
        })
        .collect();

    let (batch_paths, handles): (Vec<_>, Vec<_>) = tasks.into_iter().unzip();
    let results = join_all(handles).await;

    let mut roles = HashMap::new();
    let mut missing = Vec::new();

    for (paths, result) in batch_paths.into_iter().zip(results) {
        let mut returned = match result {
            Ok(Ok(returned)) => returned,
            Ok(Err(e)) => {
                return Err(ClassifyError::Batch {
                    paths,
                    reason: e.to_string(),
                })
            }
            Err(e) => {
                return Err(ClassifyError::Batch {
                    paths,
                    reason: format!("Task join error: {e}"),
                })
            }
        };

        for path in paths {
            match returned.remove(&path) {
                Some(role) => {
                    roles.insert(path, role);
                }
                None => missing.push(path),
            }
        }
        if !returned.is_empty() {
            warn!(
                "[run_batches] ignoring roles for {} paths that were not requested",
                returned.len()
            );
        }
    }

    if missing.is_empty() {
        Ok(roles)
    } else {
        Err(ClassifyError::MissingRoles(missing))
    }
}
