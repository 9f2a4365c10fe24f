//! Directory error types.
//!
//! Every failure coming out of the directory layer is translated into one of
//! these kinds at the gateway boundary. Nothing is retried here; retry policy
//! belongs to the caller.
//!
//! ## Security Note
//!
//! Messages carry DNs and identifiers but never bind credentials.

use thiserror::Error;

/// LDAP result codes the gateway gives a meaning to (RFC 4511, appendix A).
pub mod result_code {
    /// `noSuchAttribute`: removing a value that is not present.
    pub const NO_SUCH_ATTRIBUTE: u32 = 16;
    /// `attributeOrValueExists`: adding a value that is already present.
    pub const ATTRIBUTE_OR_VALUE_EXISTS: u32 = 20;
    /// `noSuchObject`: the target entry does not exist.
    pub const NO_SUCH_OBJECT: u32 = 32;
    /// `invalidDNSyntax`.
    pub const INVALID_DN_SYNTAX: u32 = 34;
    /// `busy`.
    pub const BUSY: u32 = 51;
    /// `unavailable`.
    pub const UNAVAILABLE: u32 = 52;
    /// `entryAlreadyExists`: the entry to create is already there.
    pub const ENTRY_ALREADY_EXISTS: u32 = 68;
}

/// Errors raised by directory operations.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The looked-up entry does not exist.
    #[error("entry not found: {0}")]
    NotFound(String),

    /// The entry to create already exists.
    #[error("entry already exists: {0}")]
    Conflict(String),

    /// The directory content breaks a model invariant.
    #[error("directory consistency violation: {0}")]
    ConsistencyViolation(String),

    /// The directory could not be reached or did not answer.
    #[error("directory unavailable: {0}")]
    StoreUnavailable(String),

    /// The directory refused the request with another result code.
    #[error("directory rejected the request (result code {code}): {message}")]
    Rejected {
        /// LDAP result code.
        code: u32,
        /// Diagnostic message from the server.
        message: String,
    },

    /// A caller-supplied value cannot be stored in the directory schema.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Invalid configuration.
    #[error("directory configuration error: {0}")]
    Configuration(String),
}

impl DirectoryError {
    /// Creates a not found error.
    #[must_use]
    pub fn not_found(dn: impl Into<String>) -> Self {
        Self::NotFound(dn.into())
    }

    /// Creates a conflict error.
    #[must_use]
    pub fn conflict(dn: impl Into<String>) -> Self {
        Self::Conflict(dn.into())
    }

    /// Creates a consistency violation error.
    #[must_use]
    pub fn consistency(msg: impl Into<String>) -> Self {
        Self::ConsistencyViolation(msg.into())
    }

    /// Creates a store unavailable error.
    #[must_use]
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::StoreUnavailable(msg.into())
    }

    /// Creates an invalid input error.
    #[must_use]
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Translates a non-success LDAP result code.
    ///
    /// `target` names the DN the operation addressed and is used as the
    /// message for the kinds that do not carry server diagnostics.
    #[must_use]
    pub fn from_result_code(code: u32, target: &str, message: &str) -> Self {
        match code {
            result_code::NO_SUCH_OBJECT => Self::NotFound(target.to_string()),
            result_code::ENTRY_ALREADY_EXISTS => Self::Conflict(target.to_string()),
            result_code::BUSY | result_code::UNAVAILABLE => {
                Self::StoreUnavailable(format!("{target}: {message}"))
            }
            _ => Self::Rejected {
                code,
                message: message.to_string(),
            },
        }
    }

    /// Returns the LDAP result code of a rejected request.
    #[must_use]
    pub const fn result_code(&self) -> Option<u32> {
        match self {
            Self::Rejected { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Checks if this is a not found error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Checks if this is a conflict error.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Checks if this is a connection-related error.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

/// Result type for directory operations.
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Translates an `ldap3` failure that happened while addressing `target`.
pub(crate) fn from_ldap3(err: ldap3::LdapError, target: &str) -> DirectoryError {
    match err {
        ldap3::LdapError::LdapResult { result } => {
            DirectoryError::from_result_code(result.rc, target, &result.text)
        }
        other => DirectoryError::StoreUnavailable(other.to_string()),
    }
}

impl From<geor_core::Error> for DirectoryError {
    fn from(err: geor_core::Error) -> Self {
        Self::Configuration(err.to_string())
    }
}
