//! Geofence Error Types
//!
//! Input errors only. Policy denials are not errors; they are returned as
//! [`crate::EligibilityResult::Denied`] values.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeofenceError {
    /// Latitude outside `[-90, 90]` or not finite.
    #[error("latitude {0} is outside [-90, 90]")]
    InvalidLatitude(f64),
    /// Longitude outside `[-180, 180]` or not finite.
    #[error("longitude {0} is outside [-180, 180]")]
    InvalidLongitude(f64),
    /// Radius must be a finite, non-negative number of meters.
    #[error("radius {0} must be a finite non-negative number of meters")]
    InvalidRadius(f64),
    /// An attendance window could not be parsed from text.
    #[error("invalid attendance window '{0}', expected HH:MM-HH:MM")]
    InvalidWindow(String),
}
