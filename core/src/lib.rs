//! Classify the files of a project by role with an LLM, and keep the result
//! in a JSON project map so unchanged files are never sent twice.

pub mod classify;
pub mod config;
pub mod error;
pub mod project;

#[cfg(feature = "cli")]
pub mod cli;

pub use classify::{classify_files, ClassifyError, FileDescriptor, RoleClassifier};
pub use config::ClassifierConfig;
pub use error::AppError;
pub use project::{FileClassificationList, ProjectFile, Role};
