//! # Attendance Session
//!
//! Drives the [`AttendanceMachine`] through one tutor's attempts against the two
//! external collaborators. An attempt suspends exactly twice: while the location
//! provider resolves and while the backend records the submission. Either
//! suspension can be cancelled (back to `Idle`) or time out (`Denied(LocationUnavailable)`
//! or `Failed(transient)` respectively). Cancelling goes through the token or
//! [`AttendanceSession::cancel`]; dropping the attempt's future has the same effect.
//!
//! The machine sits behind a plain mutex that is never held across an `.await`;
//! the state guard, not the lock, is what keeps a second `mark` from producing a
//! second submission.

use crate::error::{BackendError, TransitionError};
use crate::machine::{AttendanceMachine, Begin};
use crate::reply::{SubmissionOutcome, classify};
use crate::traits::backend::AttendanceBackend;
use crate::traits::location::LocationProvider;
use crate::types::{AttemptOutcome, AttemptState, BusinessRule, Failure, Receipt, Staleness};
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use geofence::{
    AttendanceAttempt, AttendancePolicy, AttendanceWindow, Center, Coordinate, EligibilityResult,
    evaluate, precheck,
};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Timeouts and clock settings for a session.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub location_timeout: Duration,
    pub submit_timeout: Duration,
    /// Offset used to read "today" and the time of day from the wall clock.
    pub utc_offset: FixedOffset,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            location_timeout: Duration::from_secs(15),
            submit_timeout: Duration::from_secs(20),
            utc_offset: FixedOffset::east_opt(330 * 60).unwrap_or_else(|| Utc.fix()),
        }
    }
}

struct Inner {
    machine: AttendanceMachine,
    policy: AttendancePolicy,
    /// Bumped when an attempt starts or is abandoned.
    generation: u64,
}

impl Inner {
    /// Whether the attempt started as `generation` is still the one in flight.
    fn owns(&self, generation: u64) -> bool {
        self.generation == generation && self.machine.state().is_in_flight()
    }

    fn abandon(&mut self) -> bool {
        let cancelled = self.machine.cancel();
        if cancelled {
            self.generation += 1;
        }
        cancelled
    }
}

/// One tutor's attendance session.
pub struct AttendanceSession<L, B> {
    tutor_id: String,
    center: Center,
    location: L,
    backend: B,
    settings: SessionSettings,
    inner: Mutex<Inner>,
}

impl<L, B> AttendanceSession<L, B>
where
    L: LocationProvider,
    B: AttendanceBackend,
{
    pub fn new(
        tutor_id: impl Into<String>,
        center: Center,
        policy: AttendancePolicy,
        location: L,
        backend: B,
        settings: SessionSettings,
    ) -> Self {
        Self {
            tutor_id: tutor_id.into(),
            center,
            location,
            backend,
            settings,
            inner: Mutex::new(Inner {
                machine: AttendanceMachine::new(),
                policy,
                generation: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Transitions are single assignments, so a poisoned lock still holds a
        // consistent machine.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn state(&self) -> AttemptState {
        self.lock().machine.state().clone()
    }

    pub fn policy(&self) -> AttendancePolicy {
        self.lock().policy.clone()
    }

    pub fn staleness(&self) -> Staleness {
        self.lock().machine.staleness()
    }

    /// Wall clock in the session's offset.
    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.settings.utc_offset)
    }

    /// Evaluates eligibility for `location` without touching the machine or the
    /// backend. Useful for showing the distance before the user presses the button.
    pub fn preview(
        &self,
        location: Option<Coordinate>,
        at: DateTime<FixedOffset>,
    ) -> EligibilityResult {
        let policy = self.policy();
        evaluate(
            &AttendanceAttempt {
                tutor_location: location,
                center: self.center.clone(),
                at,
            },
            &policy,
        )
    }

    /// Marks attendance at `now`.
    ///
    /// Calling this while another attempt is in flight returns
    /// [`AttemptOutcome::InProgress`] and does nothing. Once today is marked it
    /// returns [`AttemptOutcome::AlreadyMarked`] without evaluating.
    pub async fn mark_attendance(
        &self,
        now: DateTime<FixedOffset>,
        cancel: &CancellationToken,
    ) -> Result<AttemptOutcome, TransitionError> {
        self.attempt(now, cancel, AttendanceMachine::mark).await
    }

    /// Explicit retry after a denial or a transient failure. A business-rule
    /// failure yields [`TransitionError::ResyncRequired`] until
    /// [`AttendanceSession::refresh_policy`] runs.
    pub async fn retry(
        &self,
        now: DateTime<FixedOffset>,
        cancel: &CancellationToken,
    ) -> Result<AttemptOutcome, TransitionError> {
        self.attempt(now, cancel, AttendanceMachine::retry).await
    }

    async fn attempt(
        &self,
        now: DateTime<FixedOffset>,
        cancel: &CancellationToken,
        begin: fn(&mut AttendanceMachine, NaiveDate) -> Result<Begin, TransitionError>,
    ) -> Result<AttemptOutcome, TransitionError> {
        let today = now.date_naive();

        let generation = {
            let mut inner = self.lock();
            match begin(&mut inner.machine, today)? {
                Begin::Started => {}
                Begin::AlreadyMarked(receipt) => return Ok(AttemptOutcome::AlreadyMarked(receipt)),
                Begin::InFlight => {
                    tracing::debug!(tutor_id = %self.tutor_id, "attendance attempt already in flight");
                    return Ok(AttemptOutcome::InProgress);
                }
            }

            // Admin, Sunday and window rules need no GPS fix.
            if let Some(denial) = precheck(&now, &self.center, &inner.policy) {
                inner
                    .machine
                    .evaluated(EligibilityResult::Denied(denial.clone()))?;
                return Ok(AttemptOutcome::Denied(denial));
            }
            inner.generation += 1;
            inner.generation
        };
        // Dropping this future mid-suspension puts the machine back to `Idle`.
        let _guard = AttemptGuard {
            inner: &self.inner,
            generation,
        };

        let fix = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            fix = self.acquire_location() => Some(fix),
        };

        let at = {
            let mut inner = self.lock();
            if !inner.owns(generation) {
                return Ok(AttemptOutcome::Cancelled);
            }
            let Some(tutor_location) = fix else {
                inner.abandon();
                tracing::info!(tutor_id = %self.tutor_id, "location acquisition cancelled");
                return Ok(AttemptOutcome::Cancelled);
            };

            let attempt = AttendanceAttempt {
                tutor_location,
                center: self.center.clone(),
                at: now,
            };
            let result = evaluate(&attempt, &inner.policy);
            inner.machine.evaluated(result.clone())?;

            match (result, tutor_location) {
                (EligibilityResult::Allowed { distance_m }, Some(at)) => {
                    inner.machine.begin_submit()?;
                    tracing::info!(
                        tutor_id = %self.tutor_id,
                        center = %self.center.name,
                        distance_m,
                        "submitting attendance"
                    );
                    at
                }
                (EligibilityResult::Denied(denial), _) => return Ok(AttemptOutcome::Denied(denial)),
                (EligibilityResult::Allowed { .. }, None) => {
                    return Err(TransitionError::Invalid {
                        action: "submit without a location",
                        state: "eligible",
                    });
                }
            }
        };

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            r = tokio::time::timeout(self.settings.submit_timeout, self.backend.submit_attendance(at)) => Some(r),
        };

        let mut inner = self.lock();
        if !inner.owns(generation) {
            return Ok(AttemptOutcome::Cancelled);
        }
        let Some(result) = result else {
            inner.abandon();
            tracing::info!(tutor_id = %self.tutor_id, "attendance submission cancelled");
            return Ok(AttemptOutcome::Cancelled);
        };
        let Ok(result) = result else {
            tracing::warn!(
                timeout_secs = self.settings.submit_timeout.as_secs(),
                "attendance submission timed out"
            );
            inner.machine.submission_timed_out()?;
            return Ok(match inner.machine.state() {
                AttemptState::Failed { failure } => AttemptOutcome::Failed(failure.clone()),
                other => {
                    return Err(TransitionError::Invalid {
                        action: "time out a submission",
                        state: other.name(),
                    });
                }
            });
        };

        let outcome = classify(result);
        if let SubmissionOutcome::Failed(Failure::BusinessRule {
            rule: BusinessRule::OutsideAssignedTime {
                assigned_time: Some(text),
            },
            ..
        }) = &outcome
        {
            // Later local checks use the server's window.
            match text.parse::<AttendanceWindow>() {
                Ok(window) => inner.policy.window = Some(window),
                Err(e) => tracing::debug!(error = %e, "assigned time is not a parseable window"),
            }
        }
        inner.machine.submitted(outcome)?;

        Ok(match inner.machine.state() {
            AttemptState::Marked { receipt } => {
                tracing::info!(tutor_id = %self.tutor_id, message = %receipt.message, "attendance marked");
                AttemptOutcome::Marked(receipt.clone())
            }
            AttemptState::Failed { failure } => AttemptOutcome::Failed(failure.clone()),
            other => {
                return Err(TransitionError::Invalid {
                    action: "finish a submission",
                    state: other.name(),
                });
            }
        })
    }

    /// Resolves the tutor's location. `None` means no usable fix (error,
    /// timeout or out-of-range coordinates).
    async fn acquire_location(&self) -> Option<Coordinate> {
        let fix =
            tokio::time::timeout(self.settings.location_timeout, self.location.current_location())
                .await;
        match fix {
            Ok(Ok(c)) if c.is_valid() => Some(c),
            Ok(Ok(c)) => {
                tracing::warn!(location = %c, "location provider returned an invalid coordinate");
                None
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "location unavailable");
                None
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.settings.location_timeout.as_secs(),
                    "location acquisition timed out"
                );
                None
            }
        }
    }

    /// Abandons the attempt in flight, if any, and returns to `Idle`. The
    /// abandoned attempt resolves to [`AttemptOutcome::Cancelled`] when it next
    /// resumes and nothing it would have recorded is kept. Returns whether an
    /// attempt was in flight.
    pub fn cancel(&self) -> bool {
        let cancelled = self.lock().abandon();
        if cancelled {
            tracing::info!(tutor_id = %self.tutor_id, "attendance attempt cancelled");
        }
        cancelled
    }

    /// Re-reads the administrator switch, clears stale flags, and releases a
    /// business-rule failure.
    ///
    /// If the switch cannot be read the cached flag falls back to enabled, as
    /// the backend still has the final word on submission, but nothing is
    /// released: a business-rule failure stays until a refresh succeeds.
    pub async fn refresh_policy(&self) -> Result<AttendancePolicy, BackendError> {
        let status = self.backend.button_status().await;
        let mut inner = self.lock();
        match status {
            Ok(enabled) => {
                inner.policy.admin_enabled = enabled;
                inner.machine.resync();
                Ok(inner.policy.clone())
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to read button status, assuming enabled");
                inner.policy.admin_enabled = true;
                Err(e)
            }
        }
    }

    /// Asks the backend whether today is already recorded and, if so, moves to
    /// `Marked`. Returns whether today is marked. An attempt in flight keeps
    /// the machine; its own result decides.
    pub async fn sync_today(&self, now: DateTime<FixedOffset>) -> Result<bool, BackendError> {
        let recent = self.backend.recent_attendance().await?;
        let Some(first) = recent.into_iter().next() else {
            return Ok(false);
        };

        let mut inner = self.lock();
        let receipt = Receipt {
            marked_on: now.date_naive(),
            message: "Attendance Marked Successfully".to_string(),
            attendance: Some(first),
        };
        if let Err(e) = inner.machine.confirm_marked(receipt) {
            tracing::debug!(error = %e, "attempt in flight, leaving its result to decide");
        }
        Ok(true)
    }
}

/// Returns its attempt's machine to `Idle` if the attempt is dropped while
/// still in flight.
struct AttemptGuard<'a> {
    inner: &'a Mutex<Inner>,
    generation: u64,
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.owns(self.generation) && inner.abandon() {
            tracing::info!("attendance attempt dropped while in flight, back to idle");
        }
    }
}
