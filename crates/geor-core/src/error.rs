//! Error handling for property loading and configuration.
//!
//! Messages name the offending key or file but never echo property values,
//! since those routinely hold bind credentials.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using the core error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while bootstrapping configuration.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or inconsistent configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A required property is not defined by any source.
    #[error("missing property: {0}")]
    MissingProperty(String),

    /// A property is defined but its value cannot be interpreted.
    #[error("invalid value for property '{key}': {reason}")]
    InvalidProperty {
        /// Property key.
        key: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A properties file could not be read.
    #[error("cannot read properties file {}: {source}", path.display())]
    PropertyFile {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A properties file is syntactically malformed.
    #[error("malformed properties: {0}")]
    Syntax(String),
}

impl Error {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an invalid property error.
    #[must_use]
    pub fn invalid_property(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidProperty {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Returns whether the error comes from reading or parsing a file.
    #[must_use]
    pub const fn is_file_error(&self) -> bool {
        matches!(self, Self::PropertyFile { .. } | Self::Syntax(_))
    }
}
