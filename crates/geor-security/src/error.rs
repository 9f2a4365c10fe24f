//! CAS error types.
//!
//! Ticket values are never included in messages: a service ticket is a
//! bearer credential until it has been validated.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while processing CAS authentication.
#[derive(Debug, Error)]
pub enum CasError {
    /// The CAS server rejected the ticket.
    #[error("ticket rejected ({code}): {message}")]
    InvalidTicket {
        /// CAS failure code, e.g. `INVALID_TICKET`.
        code: String,
        /// Server message.
        message: String,
    },

    /// The CAS server could not be reached.
    #[error("CAS server unavailable: {0}")]
    Unavailable(String),

    /// The CAS server answered with something that is not a service
    /// response.
    #[error("malformed CAS response: {0}")]
    MalformedResponse(String),

    /// Invalid configuration.
    #[error("CAS configuration error: {0}")]
    Configuration(String),
}

impl CasError {
    /// Creates an invalid ticket error.
    #[must_use]
    pub fn invalid_ticket(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidTicket {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Creates an unavailable error.
    #[must_use]
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Creates a malformed response error.
    #[must_use]
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidTicket { .. } => StatusCode::UNAUTHORIZED,
            Self::Unavailable(_) | Self::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
            Self::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code for responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTicket { .. } => "invalid_ticket",
            Self::Unavailable(_) => "cas_unavailable",
            Self::MalformedResponse(_) => "cas_bad_response",
            Self::Configuration(_) => "configuration_error",
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error: String,
    /// Human-readable error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl IntoResponse for CasError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.error_code().to_string(),
            error_description: Some(self.to_string()),
        };
        (status, Json(body)).into_response()
    }
}

impl From<geor_core::Error> for CasError {
    fn from(err: geor_core::Error) -> Self {
        Self::Configuration(err.to_string())
    }
}

/// Result type for CAS operations.
pub type CasResult<T> = Result<T, CasError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_ticket_is_unauthorized() {
        let err = CasError::invalid_ticket("INVALID_TICKET", "Ticket ST-1 not recognized");
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.error_code(), "invalid_ticket");
        assert!(err.to_string().contains("INVALID_TICKET"));
    }

    #[test]
    fn server_failures_are_bad_gateway() {
        assert_eq!(CasError::unavailable("timeout").status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(CasError::malformed("no root").status_code(), StatusCode::BAD_GATEWAY);
    }
}
