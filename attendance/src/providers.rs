//! Location providers that do not need a device.

use crate::error::LocationError;
use crate::traits::location::LocationProvider;
use async_trait::async_trait;
use geofence::Coordinate;

/// Reports the same position every time, or no fix at all.
///
/// Used by the command line, where the position is given as arguments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedLocation(Option<Coordinate>);

impl FixedLocation {
    pub fn new(at: Coordinate) -> Self {
        Self(Some(at))
    }

    /// A provider that never has a fix.
    pub fn unavailable() -> Self {
        Self(None)
    }

    /// Both parts present and in range, or no fix.
    pub fn from_parts(lat: Option<f64>, lng: Option<f64>) -> Self {
        match (lat, lng) {
            (Some(lat), Some(lng)) => Self(Coordinate::new(lat, lng).ok()),
            _ => Self(None),
        }
    }

    pub fn position(&self) -> Option<Coordinate> {
        self.0
    }
}

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn current_location(&self) -> Result<Coordinate, LocationError> {
        self.0
            .ok_or_else(|| LocationError::Unavailable("no position supplied".to_string()))
    }
}
