use crate::distance::distance;
use crate::types::Coordinate;

/// True when `user` lies within `radius_m` meters of `center`.
///
/// The boundary is inclusive: a point exactly `radius_m` away is within range.
pub fn within_radius(user: Coordinate, center: Coordinate, radius_m: f64) -> bool {
    within(distance(user, center), radius_m)
}

/// The radius comparison on an already computed distance.
pub fn within(distance_m: f64, radius_m: f64) -> bool {
    distance_m <= radius_m
}

#[cfg(test)]
mod tests {
    use super::*;

    const CENTER: Coordinate = Coordinate {
        lat: 28.6139,
        lng: 77.2090,
    };

    #[test]
    fn test_same_point_is_within_any_radius() {
        assert!(within_radius(CENTER, CENTER, 20.0));
        assert!(within_radius(CENTER, CENTER, 0.0));
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let tutor = Coordinate {
            lat: 28.61412,
            lng: 77.2090,
        };
        let exact = distance(tutor, CENTER);
        assert!(within_radius(tutor, CENTER, exact));
        assert!(!within_radius(tutor, CENTER, exact - 1e-9));
    }

    #[test]
    fn test_outside_twenty_meters() {
        let tutor = Coordinate {
            lat: 28.61412,
            lng: 77.2090,
        };
        assert!(!within_radius(tutor, CENTER, 20.0));
        assert!(within_radius(tutor, CENTER, 25.0));
    }

    #[test]
    fn test_matches_distance_comparison() {
        let points = [
            Coordinate { lat: 28.6140, lng: 77.2091 },
            Coordinate { lat: 28.6150, lng: 77.2090 },
            Coordinate { lat: 28.6139, lng: 77.2093 },
        ];
        for p in points {
            for r in [0.0, 10.0, 15.0, 50.0, 150.0] {
                assert_eq!(within_radius(p, CENTER, r), distance(p, CENTER) <= r);
            }
        }
    }
}
