//! # Geofence Library
//!
//! Pure decision logic for geofenced attendance. Nothing in this crate performs I/O:
//! callers hand in coordinates, a clock reading, and the cached policy, and get a
//! decision back.
//!
//! ## Key Concepts
//! - **Coordinate / Center**: where the tutor is and where they must be.
//! - **Distance**: great-circle distance via the Haversine formula.
//! - **Radius policy**: inclusive `distance <= radius` check.
//! - **Eligibility**: the ordered admin → Sunday → window → location → radius evaluation.

pub mod distance;
pub mod eligibility;
pub mod error;
pub mod policy;
pub mod radius;
pub mod types;
pub mod window;

pub use distance::{EARTH_RADIUS_KM, distance};
pub use eligibility::{AttendanceAttempt, Denial, DenialReason, EligibilityResult, evaluate, precheck};
pub use error::GeofenceError;
pub use policy::AttendancePolicy;
pub use radius::{within, within_radius};
pub use types::{Center, Coordinate};
pub use window::AttendanceWindow;
