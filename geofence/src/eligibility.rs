//! # Attendance Eligibility
//!
//! Combines the admin switch, the Sunday rule, the optional time window, location
//! availability and the radius check into one decision. Checks run in that order and
//! the first failing check wins, so an admin-disabled day is never reported as
//! "out of range" and no distance is computed for it.

use crate::distance::distance;
use crate::policy::AttendancePolicy;
use crate::radius::within;
use crate::types::{Center, Coordinate};
use crate::window::AttendanceWindow;
use chrono::{DateTime, Datelike, FixedOffset, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One tutor's try to mark attendance.
///
/// `at` carries the tutor's local offset; the calendar day and time of day are
/// read in that offset.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceAttempt {
    pub tutor_location: Option<Coordinate>,
    pub center: Center,
    pub at: DateTime<FixedOffset>,
}

/// Stable code for a denial, suitable for matching or serializing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    AdminDisabled,
    SundayBlocked,
    OutsideWindow,
    LocationUnavailable,
    OutOfRange,
}

/// A denial together with the data needed to explain it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Denial {
    AdminDisabled,
    SundayBlocked,
    OutsideWindow { window: AttendanceWindow },
    LocationUnavailable,
    OutOfRange { distance_m: f64, radius_m: f64 },
}

impl Denial {
    pub fn reason(&self) -> DenialReason {
        match self {
            Denial::AdminDisabled => DenialReason::AdminDisabled,
            Denial::SundayBlocked => DenialReason::SundayBlocked,
            Denial::OutsideWindow { .. } => DenialReason::OutsideWindow,
            Denial::LocationUnavailable => DenialReason::LocationUnavailable,
            Denial::OutOfRange { .. } => DenialReason::OutOfRange,
        }
    }

    /// Admin and calendar denials will not change within a session, so a UI may
    /// grey out its retry action for them. The evaluator itself stays retryable.
    pub fn suggests_retry(&self) -> bool {
        !matches!(self, Denial::AdminDisabled | Denial::SundayBlocked)
    }

    /// Short title for an alert dialog.
    pub fn title(&self) -> &'static str {
        match self {
            Denial::AdminDisabled | Denial::SundayBlocked => "Attendance Disabled",
            Denial::OutsideWindow { .. } => "Attendance not allowed",
            Denial::LocationUnavailable => "Error",
            Denial::OutOfRange { .. } => "Out of Range",
        }
    }
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Denial::AdminDisabled => {
                write!(f, "Attendance has been disabled by the administrator")
            }
            Denial::SundayBlocked => write!(f, "Sunday attendance is disabled"),
            Denial::OutsideWindow { window } => {
                write!(f, "Attendance can only be marked during {window}.")
            }
            Denial::LocationUnavailable => write!(f, "Location or center data not available"),
            Denial::OutOfRange {
                distance_m,
                radius_m,
            } => write!(
                f,
                "You are {}m away from the center. You need to be within {}m to mark attendance.",
                distance_m.round(),
                radius_m
            ),
        }
    }
}

/// Result of evaluating an [`AttendanceAttempt`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EligibilityResult {
    Allowed { distance_m: f64 },
    Denied(Denial),
}

impl EligibilityResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, EligibilityResult::Allowed { .. })
    }

    pub fn denial(&self) -> Option<&Denial> {
        match self {
            EligibilityResult::Denied(d) => Some(d),
            EligibilityResult::Allowed { .. } => None,
        }
    }
}

/// Runs the checks that need neither the tutor's location nor any distance math:
/// admin switch, Sunday rule and time window.
///
/// Returns the first failing check, or `None` when all three pass.
pub fn precheck(
    at: &DateTime<FixedOffset>,
    center: &Center,
    policy: &AttendancePolicy,
) -> Option<Denial> {
    if !policy.admin_enabled || !center.enabled {
        return Some(Denial::AdminDisabled);
    }

    if policy.sunday_blocked && at.weekday() == Weekday::Sun {
        return Some(Denial::SundayBlocked);
    }

    if let Some(window) = &policy.window {
        if !window.contains(at.time()) {
            return Some(Denial::OutsideWindow {
                window: window.clone(),
            });
        }
    }

    None
}

/// Evaluates an attempt against a policy.
///
/// Pure: no I/O, no clock reads. Order of checks:
/// 1. admin switch → `AdminDisabled`
/// 2. Sunday rule → `SundayBlocked`
/// 3. time window → `OutsideWindow`
/// 4. tutor or center location missing → `LocationUnavailable`
/// 5. radius → `OutOfRange`
pub fn evaluate(attempt: &AttendanceAttempt, policy: &AttendancePolicy) -> EligibilityResult {
    if let Some(denial) = precheck(&attempt.at, &attempt.center, policy) {
        tracing::debug!(reason = ?denial.reason(), "attendance denied before location check");
        return EligibilityResult::Denied(denial);
    }

    let (Some(user), Some(center)) = (attempt.tutor_location, attempt.center.coordinates) else {
        tracing::debug!("attendance denied: location unavailable");
        return EligibilityResult::Denied(Denial::LocationUnavailable);
    };

    let distance_m = distance(user, center);
    if within(distance_m, policy.radius_m) {
        EligibilityResult::Allowed { distance_m }
    } else {
        tracing::debug!(distance_m, radius_m = policy.radius_m, "attendance denied: out of range");
        EligibilityResult::Denied(Denial::OutOfRange {
            distance_m,
            radius_m: policy.radius_m,
        })
    }
}
