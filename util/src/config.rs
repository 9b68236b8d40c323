//! Global application configuration manager.
//!
//! `AppConfig` is a lazily initialized, globally accessible singleton containing
//! runtime configuration values loaded from environment variables. It provides
//! thread-safe access and mutation for testing or overrides in runtime environments.
//!
//! Unlike a server, the tutor client must start even with a half-filled `.env`, so
//! every value has a default and malformed numbers fall back to it instead of
//! panicking.

use std::env;
use std::str::FromStr;
use std::sync::{OnceLock, RwLock};

/// Represents the complete application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub env: String,
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    pub api_base_url: String,
    pub api_token: String,
    pub tutor_id: String,
    pub request_timeout_secs: u64,
    pub location_timeout_secs: u64,
    pub attendance_radius_m: f64,
    pub sunday_blocked: bool,
    pub utc_offset_minutes: i32,
    pub attendance_window: Option<String>,
    pub center_name: String,
    pub center_lat: Option<f64>,
    pub center_lng: Option<f64>,
    pub app_version: String,
}

/// Lazily-initialized, thread-safe singleton instance of `AppConfig`.
static CONFIG_INSTANCE: OnceLock<RwLock<AppConfig>> = OnceLock::new();

pub const DEFAULT_API_BASE_URL: &str = "https://api.tqfmohallatuitioncenters.in/api";
pub const DEFAULT_LOG_LEVEL: &str = "tutor=info,attendance=info,client=info,geofence=info";

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.into())
}

fn var_parse<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn var_opt<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn var_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(v) => matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
        Err(_) => default,
    }
}

impl AppConfig {
    /// Loads the configuration from `.env` and environment variables.
    ///
    /// This method is used internally to populate the singleton. Missing values
    /// take their defaults.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            env: var_or("APP_ENV", "development"),
            project_name: var_or("PROJECT_NAME", "tutor-attendance"),
            log_level: var_or("LOG_LEVEL", DEFAULT_LOG_LEVEL),
            log_file: var_or("LOG_FILE", "tutor.log"),
            log_to_stdout: var_bool("LOG_TO_STDOUT", false),
            api_base_url: var_or("API_BASE_URL", DEFAULT_API_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            api_token: env::var("API_TOKEN").unwrap_or_default(),
            tutor_id: env::var("TUTOR_ID").unwrap_or_default(),
            request_timeout_secs: var_parse("REQUEST_TIMEOUT_SECS", 20),
            location_timeout_secs: var_parse("LOCATION_TIMEOUT_SECS", 15),
            attendance_radius_m: var_parse("ATTENDANCE_RADIUS_M", 20.0),
            sunday_blocked: var_bool("SUNDAY_BLOCKED", true),
            utc_offset_minutes: var_parse("UTC_OFFSET_MINUTES", 330),
            attendance_window: env::var("ATTENDANCE_WINDOW")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            center_name: var_or("CENTER_NAME", "Assigned Center"),
            center_lat: var_opt("CENTER_LAT"),
            center_lng: var_opt("CENTER_LNG"),
            app_version: var_or("APP_VERSION", "3.0.0"),
        }
    }

    /// Returns a shared reference to the global configuration.
    ///
    /// # Panics
    /// Panics if the lock is poisoned.
    pub fn global() -> std::sync::RwLockReadGuard<'static, AppConfig> {
        CONFIG_INSTANCE
            .get_or_init(|| RwLock::new(AppConfig::from_env()))
            .read()
            .expect("Failed to acquire AppConfig read lock")
    }

    /// Resets the configuration by reloading from environment variables.
    ///
    /// Useful in tests to clear overrides.
    pub fn reset() {
        if let Some(lock) = CONFIG_INSTANCE.get() {
            let mut guard = lock
                .write()
                .expect("Failed to acquire AppConfig write lock");
            *guard = AppConfig::from_env();
        }
    }

    /// Generic internal setter for any field in the config.
    ///
    /// Used by public per-field setter methods.
    fn set_field<F>(setter: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let lock = CONFIG_INSTANCE.get_or_init(|| RwLock::new(AppConfig::from_env()));
        let mut guard = lock
            .write()
            .expect("Failed to acquire AppConfig write lock");
        setter(&mut guard);
    }

    // --- Per-field setters below ---

    pub fn set_attendance_radius_m(value: f64) {
        AppConfig::set_field(|cfg| cfg.attendance_radius_m = value);
    }

    pub fn set_center(name: impl Into<String>, lat: Option<f64>, lng: Option<f64>) {
        AppConfig::set_field(|cfg| {
            cfg.center_name = name.into();
            cfg.center_lat = lat;
            cfg.center_lng = lng;
        });
    }
}
