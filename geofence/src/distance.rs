//! Great-circle distance between two coordinates (Haversine).

use crate::types::Coordinate;

/// Mean Earth radius used by the formula, in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Distance in meters between `a` and `b`.
///
/// Pure and total over valid coordinates. Identical inputs return exactly `0.0`.
/// Deltas are taken as absolute values so `distance(a, b)` and `distance(b, a)`
/// are bit-for-bit equal.
pub fn distance(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = (b.lat - a.lat).abs().to_radians();
    let d_lng = (b.lng - a.lng).abs().to_radians();

    let sin_lat = (d_lat / 2.0).sin();
    let sin_lng = (d_lng / 2.0).sin();
    let h = sin_lat * sin_lat
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * sin_lng * sin_lng;

    // Rounding can push h a hair outside [0, 1] for near-antipodal points.
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c * 1000.0
}
