use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file looked up in the project root when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "diary.json";

/// Default project map file name, relative to the project root.
pub const DEFAULT_MAP_FILE: &str = "project_map.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("Invalid config {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Settings for a classification run.
///
/// Everything the classifier needs is passed in here explicitly; nothing is
/// read from the environment while classifying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Model used for batches that fit its context window.
    pub model: String,
    /// Model used for batches that do not fit `model`.
    pub long_context_model: String,
    /// Prompt budget of `model`, in estimated tokens.
    pub context_tokens: usize,
    /// Prompt budget of `long_context_model`, in estimated tokens.
    pub long_context_tokens: usize,
    /// Upper bound on files per model call.
    pub max_batch_files: usize,
    /// Maximum model calls in flight.
    pub max_concurrent: usize,
    /// Characters of file content sent along with each path. 0 sends paths only.
    pub excerpt_chars: usize,
    /// Command to run instead of the `claude` CLI; receives the prompt on stdin.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_command: Option<String>,
    /// Directory relative file paths are resolved against when reading excerpts.
    #[serde(skip)]
    pub project_root: Option<PathBuf>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model: "haiku".to_owned(),
            long_context_model: "sonnet".to_owned(),
            context_tokens: 4_096,
            long_context_tokens: 16_384,
            max_batch_files: 40,
            max_concurrent: 2,
            excerpt_chars: 0,
            custom_command: None,
            project_root: None,
        }
    }
}

impl ClassifierConfig {
    /// Load a config file. Missing keys take their default values.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load `<root>/diary.json` if it exists, otherwise the defaults.
    pub fn load_for_project(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(DEFAULT_CONFIG_FILE);
        let mut config = if path.is_file() {
            Self::load(&path)?
        } else {
            Self::default()
        };
        config.project_root = Some(root.to_path_buf());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_batch_files == 0 {
            return Err(ConfigError::Invalid(
                "max_batch_files must be at least 1".to_owned(),
            ));
        }
        if self.max_concurrent == 0 {
            return Err(ConfigError::Invalid(
                "max_concurrent must be at least 1".to_owned(),
            ));
        }
        if self.long_context_tokens < self.context_tokens {
            return Err(ConfigError::Invalid(format!(
                "long_context_tokens ({}) is smaller than context_tokens ({})",
                self.long_context_tokens, self.context_tokens
            )));
        }
        Ok(())
    }
}
