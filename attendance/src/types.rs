//! # Types Module
//!
//! States and results of one attendance attempt.

use chrono::NaiveDate;
use geofence::Denial;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Proof that attendance is recorded for a day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub marked_on: NaiveDate,
    /// Server message, surfaced verbatim.
    pub message: String,
    #[serde(default)]
    pub attendance: Option<serde_json::Value>,
}

/// Why the backend refused a submission the local evaluator allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum BusinessRule {
    /// Server says the administrator disabled attendance.
    AdminDisabled,
    /// Server says the tutor is outside their assigned time.
    OutsideAssignedTime { assigned_time: Option<String> },
    /// The bearer token was refused.
    Unauthorized,
    /// The tutor may not mark attendance.
    Forbidden,
    /// Any other 4xx refusal.
    Rejected { status: u16 },
}

/// A submission that did not end in a recorded attendance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Failure {
    /// Network error, timeout or 5xx. Retryable.
    Transient { message: String },
    /// Backend re-asserted a denial. Not retryable until the policy is refreshed.
    BusinessRule { rule: BusinessRule, message: String },
}

impl Failure {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Failure::Transient { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            Failure::Transient { message } | Failure::BusinessRule { message, .. } => message,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Failure::Transient { .. } => "Error",
            Failure::BusinessRule { rule, .. } => match rule {
                BusinessRule::AdminDisabled => "Attendance Disabled",
                BusinessRule::OutsideAssignedTime { .. } => "Attendance not allowed",
                BusinessRule::Unauthorized => "Authentication Error",
                BusinessRule::Forbidden => "Permission Error",
                BusinessRule::Rejected { .. } => "Attendance Error",
            },
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Lifecycle of one attendance attempt.
///
/// `Idle → Checking → Eligible | Denied → Submitting → Marked | Failed`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AttemptState {
    Idle,
    Checking,
    Eligible { distance_m: f64 },
    Denied { denial: Denial },
    Submitting,
    Marked { receipt: Receipt },
    Failed { failure: Failure },
}

impl AttemptState {
    pub fn name(&self) -> &'static str {
        match self {
            AttemptState::Idle => "idle",
            AttemptState::Checking => "checking",
            AttemptState::Eligible { .. } => "eligible",
            AttemptState::Denied { .. } => "denied",
            AttemptState::Submitting => "submitting",
            AttemptState::Marked { .. } => "marked",
            AttemptState::Failed { .. } => "failed",
        }
    }

    /// An attempt is between the user's action and its result.
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            AttemptState::Checking | AttemptState::Eligible { .. } | AttemptState::Submitting
        )
    }
}

/// Which cached policy facts the backend has contradicted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Staleness {
    pub admin_enabled: bool,
    pub window: bool,
}

impl Staleness {
    pub fn any(&self) -> bool {
        self.admin_enabled || self.window
    }
}

/// What the caller sees when an attempt ends.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    /// Backend recorded the attendance.
    Marked(Receipt),
    /// Today was already marked; nothing was evaluated or sent.
    AlreadyMarked(Receipt),
    /// Another attempt is in flight; this call did nothing.
    InProgress,
    Denied(Denial),
    Failed(Failure),
    /// The caller cancelled during location or submission; back to `Idle`.
    Cancelled,
}
