//! Submission error types

use crate::transport::http::RestError;
use thiserror::Error;

/// Failure of a single location submission.
///
/// All variants are recoverable from the controller's point of view: the
/// session stays active and the next qualifying fix retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    /// No access token available at send time
    #[error("no access token available")]
    MissingToken,
    /// Server rejected the credentials
    #[error("unauthorized (HTTP {status})")]
    Unauthorized { status: u16 },
    /// Non-success status from the server
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    /// Connection, TLS or timeout failure
    #[error("transport error: {0}")]
    Transport(String),
    /// Response body could not be decoded
    #[error("invalid response body: {0}")]
    Decode(String),
    /// Submission abandoned before completion
    #[error("submission cancelled")]
    Cancelled,
}

impl SubmissionError {
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        match status {
            401 | 403 => SubmissionError::Unauthorized { status },
            _ => SubmissionError::Http {
                status,
                message: message.into(),
            },
        }
    }
}

impl From<RestError> for SubmissionError {
    fn from(error: RestError) -> Self {
        match error {
            RestError::Status { status, message } => SubmissionError::from_status(status, message),
            RestError::Decode(message) => SubmissionError::Decode(message),
            RestError::Transport(message) | RestError::InvalidUrl(message) => {
                SubmissionError::Transport(message)
            }
        }
    }
}

/// Result type for submission operations
pub type SubmissionResult<T> = Result<T, SubmissionError>;
