//! # Attendance State Machine
//!
//! Synchronous transition rules for one tutor's attendance attempts. The machine
//! holds no clock and performs no I/O; [`crate::session::AttendanceSession`] drives
//! it across the two suspension points (location, submission).
//!
//! Guarantees:
//! - At most one attempt is in flight. `mark` while `Checking`, `Eligible` or
//!   `Submitting` is a no-op reported as [`Begin::InFlight`].
//! - `Submitting` is only reachable from `Eligible`.
//! - Once `Marked` for a day, `mark` and `retry` for that day short-circuit to
//!   the receipt without evaluating anything.
//! - After a business-rule failure no new attempt starts until [`AttendanceMachine::resync`].

use crate::error::TransitionError;
use crate::reply::SubmissionOutcome;
use crate::types::{AttemptState, BusinessRule, Failure, Receipt, Staleness};
use chrono::NaiveDate;
use geofence::{Denial, EligibilityResult};

/// How a `mark` or `retry` request was handled.
#[derive(Debug, Clone, PartialEq)]
pub enum Begin {
    /// The machine moved to `Checking`; the caller now owns the attempt.
    Started,
    /// Today is already marked.
    AlreadyMarked(Receipt),
    /// Another attempt is in flight.
    InFlight,
}

#[derive(Debug, Clone)]
pub struct AttendanceMachine {
    state: AttemptState,
    day: Option<NaiveDate>,
    stale: Staleness,
}

impl Default for AttendanceMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl AttendanceMachine {
    pub fn new() -> Self {
        Self {
            state: AttemptState::Idle,
            day: None,
            stale: Staleness::default(),
        }
    }

    pub fn state(&self) -> &AttemptState {
        &self.state
    }

    /// Calendar day the current state belongs to.
    pub fn day(&self) -> Option<NaiveDate> {
        self.day
    }

    pub fn staleness(&self) -> Staleness {
        self.stale
    }

    fn enter(&mut self, next: AttemptState) {
        tracing::debug!(from = self.state.name(), to = next.name(), "attendance state transition");
        self.state = next;
    }

    fn invalid(&self, action: &'static str) -> TransitionError {
        TransitionError::Invalid {
            action,
            state: self.state.name(),
        }
    }

    /// Moves to a new calendar day. Yesterday's outcome does not carry over, except
    /// that an in-flight attempt is left to finish.
    pub fn roll_over(&mut self, today: NaiveDate) {
        match self.day {
            Some(day) if day == today => {}
            Some(_) if self.state.is_in_flight() => {}
            Some(_) => {
                self.day = Some(today);
                if !matches!(self.state, AttemptState::Failed { failure: Failure::BusinessRule { .. } }) {
                    self.enter(AttemptState::Idle);
                }
            }
            None => self.day = Some(today),
        }
    }

    /// The user asked to mark attendance.
    ///
    /// From `Idle` this starts an attempt; from `Denied` or a transient failure it
    /// behaves like [`AttendanceMachine::retry`].
    pub fn mark(&mut self, today: NaiveDate) -> Result<Begin, TransitionError> {
        self.roll_over(today);
        match &self.state {
            AttemptState::Marked { receipt } => Ok(Begin::AlreadyMarked(receipt.clone())),
            s if s.is_in_flight() => Ok(Begin::InFlight),
            AttemptState::Idle => {
                self.enter(AttemptState::Checking);
                Ok(Begin::Started)
            }
            _ => self.retry(today),
        }
    }

    /// Explicit retry. Allowed only from `Denied` or a transient `Failed`.
    pub fn retry(&mut self, today: NaiveDate) -> Result<Begin, TransitionError> {
        self.roll_over(today);
        match &self.state {
            AttemptState::Marked { receipt } => Ok(Begin::AlreadyMarked(receipt.clone())),
            AttemptState::Denied { .. }
            | AttemptState::Failed {
                failure: Failure::Transient { .. },
            } => {
                self.enter(AttemptState::Checking);
                Ok(Begin::Started)
            }
            AttemptState::Failed {
                failure: Failure::BusinessRule { .. },
            } => Err(TransitionError::ResyncRequired),
            s if s.is_in_flight() => Ok(Begin::InFlight),
            _ => Err(self.invalid("retry")),
        }
    }

    /// Records the evaluator's decision for the attempt in `Checking`.
    pub fn evaluated(&mut self, result: EligibilityResult) -> Result<(), TransitionError> {
        if self.state != AttemptState::Checking {
            return Err(self.invalid("record an eligibility decision"));
        }
        match result {
            EligibilityResult::Allowed { distance_m } => {
                self.enter(AttemptState::Eligible { distance_m })
            }
            EligibilityResult::Denied(denial) => {
                tracing::info!(reason = ?denial.reason(), "attendance attempt denied");
                self.enter(AttemptState::Denied { denial })
            }
        }
        Ok(())
    }

    /// Location acquisition timed out.
    pub fn location_timed_out(&mut self) -> Result<(), TransitionError> {
        self.evaluated(EligibilityResult::Denied(Denial::LocationUnavailable))
    }

    /// Starts the single in-flight submission.
    pub fn begin_submit(&mut self) -> Result<(), TransitionError> {
        match self.state {
            AttemptState::Eligible { .. } => {
                self.enter(AttemptState::Submitting);
                Ok(())
            }
            _ => Err(self.invalid("submit")),
        }
    }

    /// Records the backend's answer for the submission in flight.
    pub fn submitted(&mut self, outcome: SubmissionOutcome) -> Result<(), TransitionError> {
        if self.state != AttemptState::Submitting {
            return Err(self.invalid("record a submission result"));
        }
        match outcome {
            SubmissionOutcome::Recorded {
                message,
                attendance,
            } => {
                let marked_on = self.day.unwrap_or_default();
                self.enter(AttemptState::Marked {
                    receipt: Receipt {
                        marked_on,
                        message,
                        attendance,
                    },
                });
            }
            SubmissionOutcome::Failed(failure) => {
                if let Failure::BusinessRule { rule, message } = &failure {
                    tracing::warn!(?rule, %message, "backend refused attendance the client allowed");
                    match rule {
                        BusinessRule::AdminDisabled => self.stale.admin_enabled = true,
                        BusinessRule::OutsideAssignedTime { .. } => self.stale.window = true,
                        _ => {}
                    }
                }
                self.enter(AttemptState::Failed { failure });
            }
        }
        Ok(())
    }

    /// Submission timed out.
    pub fn submission_timed_out(&mut self) -> Result<(), TransitionError> {
        self.submitted(SubmissionOutcome::Failed(Failure::Transient {
            message: "Request timeout - API call took too long".to_string(),
        }))
    }

    /// The caller abandoned the attempt during a suspension. Returns to `Idle`
    /// without side effects. Returns whether anything was cancelled.
    pub fn cancel(&mut self) -> bool {
        if self.state.is_in_flight() {
            self.enter(AttemptState::Idle);
            true
        } else {
            false
        }
    }

    /// The backend says today is already recorded.
    pub fn confirm_marked(&mut self, receipt: Receipt) -> Result<(), TransitionError> {
        if self.state.is_in_flight() {
            return Err(self.invalid("confirm attendance"));
        }
        self.day = Some(receipt.marked_on);
        self.enter(AttemptState::Marked { receipt });
        Ok(())
    }

    /// The cached policy was refreshed from the backend. Clears staleness and
    /// releases a business-rule failure back to `Idle`.
    pub fn resync(&mut self) {
        self.stale = Staleness::default();
        if matches!(
            self.state,
            AttemptState::Failed {
                failure: Failure::BusinessRule { .. }
            }
        ) {
            self.enter(AttemptState::Idle);
        }
    }
}
