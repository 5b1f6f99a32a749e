use serde::Serialize;
use thiserror::Error;

/// Unified error type for the diary CLI.
///
/// This enum provides structured error information that can be
/// serialized to JSON for `--format json` output.
#[derive(Error, Debug, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum AppError {
    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Schema error: {message}")]
    Schema { message: String },

    #[error("Classification error: {message}")]
    Classification { message: String, paths: Vec<String> },

    #[error("Scan error: {message}")]
    Scan { message: String },

    #[error("Config error: {message}")]
    Config { message: String },

    #[error("IO error: {message}")]
    Io { message: String },
}

impl AppError {
    /// Create a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a Schema error
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    /// Create a Classification error not tied to specific files
    pub fn classification(message: impl Into<String>) -> Self {
        Self::Classification {
            message: message.into(),
            paths: Vec::new(),
        }
    }

    /// Create a Scan error
    pub fn scan(message: impl Into<String>) -> Self {
        Self::Scan {
            message: message.into(),
        }
    }

    /// Create a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Check if this error is recoverable (user can retry or take action)
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Model calls and disk access may be transient; nothing partial was written
            Self::Classification { .. } | Self::Storage { .. } | Self::Io { .. } => true,
            // The map or config must be fixed by hand first
            Self::Schema { .. } | Self::Scan { .. } | Self::Config { .. } => false,
        }
    }
}

// Convert from StoreError
impl From<crate::project::StoreError> for AppError {
    fn from(err: crate::project::StoreError) -> Self {
        use crate::project::StoreError;
        match err {
            StoreError::Schema { .. } => AppError::schema(err.to_string()),
            StoreError::Io(e) => AppError::storage(format!("IO: {e}")),
            StoreError::Json(e) => AppError::storage(format!("JSON: {e}")),
            StoreError::DuplicatePath(_) => AppError::storage(err.to_string()),
        }
    }
}

// Convert from ClassifyError
impl From<crate::classify::ClassifyError> for AppError {
    fn from(err: crate::classify::ClassifyError) -> Self {
        use crate::classify::ClassifyError;
        let paths = match &err {
            ClassifyError::MissingRoles(paths) | ClassifyError::Batch { paths, .. } => paths.clone(),
            ClassifyError::InvalidRole { path, .. }
            | ClassifyError::TooLarge { path, .. }
            | ClassifyError::DuplicatePath(path) => vec![path.clone()],
            _ => Vec::new(),
        };
        match err {
            ClassifyError::Store(e) => e.into(),
            other => AppError::Classification {
                message: other.to_string(),
                paths: paths
                    .iter()
                    .map(|p| p.to_string_lossy().into_owned())
                    .collect(),
            },
        }
    }
}

// Convert from ScanError
impl From<crate::project::ScanError> for AppError {
    fn from(err: crate::project::ScanError) -> Self {
        AppError::scan(err.to_string())
    }
}

// Convert from ConfigError
impl From<crate::config::ConfigError> for AppError {
    fn from(err: crate::config::ConfigError) -> Self {
        AppError::config(err.to_string())
    }
}

// Convert from std::io::Error
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::io(err.to_string())
    }
}
