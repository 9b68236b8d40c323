//! Client Error Types

use crate::marks::MarksError;
use crate::validation::format_validation_errors;
use attendance::BackendError;
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request timeout - API call took too long")]
    Timeout,
    #[error("Network request failed. Please check your internet connection and ensure the server is running. ({0})")]
    Transport(String),
    /// Non-2xx answer. `message` is the body's `message` field, the raw body, or
    /// the status reason, in that order.
    #[error("{status}: {message}")]
    Status { status: u16, message: String },
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error(transparent)]
    InvalidMarks(#[from] MarksError),
    /// A request body failed validation and was not sent.
    #[error("{0}")]
    Invalid(String),
    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Timeout
        } else if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else {
            ClientError::Transport(e.to_string())
        }
    }
}

impl From<ValidationErrors> for ClientError {
    fn from(errors: ValidationErrors) -> Self {
        ClientError::Invalid(format_validation_errors(&errors))
    }
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<ClientError> for BackendError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Timeout => BackendError::Timeout,
            ClientError::Transport(msg) | ClientError::Config(msg) => BackendError::Transport(msg),
            ClientError::Status { status, message } if (400..500).contains(&status) => {
                BackendError::Rejected { status, message }
            }
            ClientError::Status { status, message } => BackendError::Server { status, message },
            ClientError::Decode(msg) => BackendError::Decode(msg),
            ClientError::InvalidMarks(e) => BackendError::Rejected {
                status: 400,
                message: e.to_string(),
            },
            ClientError::Invalid(message) => BackendError::Rejected {
                status: 400,
                message,
            },
        }
    }
}
