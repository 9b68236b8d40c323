//! Attendance Error Types
//!
//! Errors raised by the two external collaborators (location and backend) and by
//! the state machine when an operation's precondition does not hold. Collaborator
//! errors are caught at the session boundary and mapped into denials or failures;
//! they never reach the caller as panics.

use thiserror::Error;

/// Failure from the device location collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("location unavailable: {0}")]
    Unavailable(String),
}

/// Failure from the attendance backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Connection refused, DNS failure, TLS error and the like.
    #[error("network request failed: {0}")]
    Transport(String),
    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,
    /// 5xx from the server.
    #[error("{status}: {message}")]
    Server { status: u16, message: String },
    /// 4xx from the server; the request itself was refused.
    #[error("{status}: {message}")]
    Rejected { status: u16, message: String },
    /// The server answered but the body was not what was expected.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl BackendError {
    /// Whether simply trying again later may succeed.
    pub fn is_transient(&self) -> bool {
        !matches!(self, BackendError::Rejected { .. })
    }
}

/// A state-machine operation was invoked from a state that does not allow it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("cannot {action} while {state}")]
    Invalid {
        action: &'static str,
        state: &'static str,
    },
    /// The last submission was refused on a business rule; the cached policy
    /// must be refreshed before another attempt.
    #[error("attendance policy must be refreshed before trying again")]
    ResyncRequired,
}
