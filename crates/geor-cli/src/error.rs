//! CLI error types.

use geor_directory::DirectoryError;
use thiserror::Error;

/// CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] geor_core::Error),

    /// Directory operation failed.
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// Resource not found.
    #[error("{resource_type} not found: {id}")]
    NotFound {
        /// Type of resource.
        resource_type: &'static str,
        /// Resource identifier.
        id: String,
    },

    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Turns a directory `NotFound` into a resource-level one.
    #[must_use]
    pub fn for_resource(self, resource_type: &'static str, id: &str) -> Self {
        match self {
            Self::Directory(DirectoryError::NotFound(_)) => Self::NotFound {
                resource_type,
                id: id.to_string(),
            },
            other => other,
        }
    }
}

/// CLI result type.
pub type CliResult<T> = Result<T, CliError>;
