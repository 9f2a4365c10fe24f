//! Publication error types.

use thiserror::Error;

/// Errors raised while publishing datasets.
#[derive(Debug, Error)]
pub enum PublicationError {
    /// The dataset has no published layer.
    #[error("dataset not published: {0}")]
    NotPublished(String),

    /// The dataset has no metadata record to link.
    #[error("dataset has no metadata record: {0}")]
    MissingMetadata(String),

    /// The dataset is already published, or the link already exists.
    #[error("publication conflict: {0}")]
    Conflict(String),

    /// The dataset cannot be published in its current state.
    #[error("invalid dataset: {0}")]
    InvalidDataset(String),

    /// The OWS server could not be reached.
    #[error("publication service unavailable: {0}")]
    Unavailable(String),
}

impl PublicationError {
    /// Creates a not published error.
    #[must_use]
    pub fn not_published(dataset: impl Into<String>) -> Self {
        Self::NotPublished(dataset.into())
    }

    /// Creates a missing metadata error.
    #[must_use]
    pub fn missing_metadata(dataset: impl Into<String>) -> Self {
        Self::MissingMetadata(dataset.into())
    }

    /// Creates a conflict error.
    #[must_use]
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Creates an invalid dataset error.
    #[must_use]
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidDataset(msg.into())
    }

    /// Creates an unavailable error.
    #[must_use]
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Checks if retrying later may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Result type for publication operations.
pub type PublicationResult<T> = Result<T, PublicationError>;
