//! # Types Module
//!
//! Core location types shared by the distance math and the eligibility evaluator.

use crate::error::GeofenceError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A latitude/longitude pair in decimal degrees.
///
/// Construct with [`Coordinate::new`] to get range validation. The distance
/// functions accept any `Coordinate` and do not re-validate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    /// Creates a coordinate, rejecting latitudes outside `[-90, 90]`,
    /// longitudes outside `[-180, 180]`, and non-finite values.
    pub fn new(lat: f64, lng: f64) -> Result<Self, GeofenceError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(GeofenceError::InvalidLatitude(lat));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(GeofenceError::InvalidLongitude(lng));
        }
        Ok(Self { lat, lng })
    }

    /// Builds a coordinate from the backend's `[latitude, longitude]` pair.
    pub fn from_pair(pair: [f64; 2]) -> Result<Self, GeofenceError> {
        Self::new(pair[0], pair[1])
    }

    /// The `[latitude, longitude]` pair the backend expects.
    pub fn as_pair(&self) -> [f64; 2] {
        [self.lat, self.lng]
    }

    pub fn is_valid(&self) -> bool {
        Self::new(self.lat, self.lng).is_ok()
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lng)
    }
}

/// A tuition center the tutor is assigned to.
///
/// `coordinates` is `None` when the backend has no location on file for the
/// center; the evaluator reports that as `LocationUnavailable`. `enabled` is the
/// administrator's switch for this center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Center {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub coordinates: Option<Coordinate>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Center {
    pub fn new(name: impl Into<String>, coordinates: Option<Coordinate>) -> Self {
        Self {
            id: None,
            name: name.into(),
            coordinates,
            enabled: true,
        }
    }
}
