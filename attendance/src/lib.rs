//! # Attendance
//!
//! Drives one tutor's attendance attempts: local eligibility from the
//! [`geofence`] crate, then a single in-flight submission to the backend,
//! recorded at most once per calendar day.
//!
//! ## Layout
//! - [`machine`]: the synchronous state machine (`Idle`, `Checking`, `Eligible`,
//!   `Denied`, `Submitting`, `Marked`, `Failed`).
//! - [`session`]: the async driver with timeouts and cancellation.
//! - [`reply`]: classification of backend replies into success or failure.
//! - [`traits`]: the location and backend collaborators.
//! - [`providers`]: a fixed location provider.
//!
//! ## Usage
//! ```ignore
//! let session = AttendanceSession::new(tutor_id, center, policy, location, client, SessionSettings::default());
//! session.refresh_policy().await?;
//! match session.mark_attendance(session.now(), &CancellationToken::new()).await? {
//!     AttemptOutcome::Marked(receipt) => println!("{}", receipt.message),
//!     other => println!("{other:?}"),
//! }
//! ```

pub mod error;
pub mod machine;
pub mod providers;
pub mod reply;
pub mod session;
pub mod traits;
pub mod types;

pub use error::{BackendError, LocationError, TransitionError};
pub use machine::{AttendanceMachine, Begin};
pub use providers::FixedLocation;
pub use reply::{SubmissionOutcome, classify};
pub use session::{AttendanceSession, SessionSettings};
pub use traits::backend::{AttendanceBackend, SubmitReply};
pub use traits::location::LocationProvider;
pub use types::{AttemptOutcome, AttemptState, BusinessRule, Failure, Receipt, Staleness};
