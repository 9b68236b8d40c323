use crate::error::GeofenceError;
use crate::window::AttendanceWindow;
use serde::{Deserialize, Serialize};

/// The policy flags the evaluator checks, as last known to the client.
///
/// `admin_enabled` and `window` mirror facts owned by the backend and may go
/// stale; the backend remains the final authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendancePolicy {
    #[serde(default = "default_radius_m")]
    pub radius_m: f64,

    #[serde(default = "default_sunday_blocked")]
    pub sunday_blocked: bool,

    #[serde(default = "default_admin_enabled")]
    pub admin_enabled: bool,

    #[serde(default)]
    pub window: Option<AttendanceWindow>,
}

impl Default for AttendancePolicy {
    fn default() -> Self {
        Self {
            radius_m: default_radius_m(),
            sunday_blocked: default_sunday_blocked(),
            admin_enabled: default_admin_enabled(),
            window: None,
        }
    }
}

impl AttendancePolicy {
    pub fn with_radius(mut self, radius_m: f64) -> Self {
        self.radius_m = radius_m;
        self
    }

    pub fn with_window(mut self, window: AttendanceWindow) -> Self {
        self.window = Some(window);
        self
    }

    pub fn validate(&self) -> Result<(), GeofenceError> {
        if !self.radius_m.is_finite() || self.radius_m < 0.0 {
            return Err(GeofenceError::InvalidRadius(self.radius_m));
        }
        Ok(())
    }
}

fn default_radius_m() -> f64 {
    20.0
}

fn default_sunday_blocked() -> bool {
    true
}

fn default_admin_enabled() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_app() {
        let p = AttendancePolicy::default();
        assert_eq!(p.radius_m, 20.0);
        assert!(p.sunday_blocked);
        assert!(p.admin_enabled);
        assert!(p.window.is_none());
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let p: AttendancePolicy = serde_json::from_str(r#"{"admin_enabled":false}"#).unwrap();
        assert!(!p.admin_enabled);
        assert_eq!(p.radius_m, 20.0);
    }

    #[test]
    fn test_validate_rejects_negative_radius() {
        let p = AttendancePolicy::default().with_radius(-1.0);
        assert_eq!(p.validate(), Err(GeofenceError::InvalidRadius(-1.0)));
        assert!(AttendancePolicy::default().with_radius(f64::NAN).validate().is_err());
    }
}
