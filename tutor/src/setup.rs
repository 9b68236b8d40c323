//! Builds the attendance domain objects from [`AppConfig`].

use anyhow::{Context, Result};
use attendance::{AttendanceSession, FixedLocation, SessionSettings};
use chrono::{FixedOffset, Offset, Utc};
use client::ApiClient;
use geofence::{AttendancePolicy, AttendanceWindow, Center, Coordinate};
use std::time::Duration;
use util::config::AppConfig;

pub fn utc_offset(config: &AppConfig) -> FixedOffset {
    FixedOffset::east_opt(config.utc_offset_minutes * 60).unwrap_or_else(|| {
        tracing::warn!(minutes = config.utc_offset_minutes, "UTC offset out of range, using UTC");
        Utc.fix()
    })
}

pub fn policy(config: &AppConfig) -> Result<AttendancePolicy> {
    let window = config
        .attendance_window
        .as_deref()
        .map(str::parse::<AttendanceWindow>)
        .transpose()
        .context("ATTENDANCE_WINDOW")?;

    let policy = AttendancePolicy {
        radius_m: config.attendance_radius_m,
        sunday_blocked: config.sunday_blocked,
        admin_enabled: true,
        window,
    };
    policy.validate().context("attendance policy")?;
    Ok(policy)
}

/// The assigned center. Missing or out-of-range coordinates leave the center
/// without a location, which the evaluator reports as unavailable.
pub fn center(config: &AppConfig) -> Center {
    let coordinates = match (config.center_lat, config.center_lng) {
        (Some(lat), Some(lng)) => match Coordinate::new(lat, lng) {
            Ok(c) => Some(c),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring invalid center coordinates");
                None
            }
        },
        _ => None,
    };
    Center::new(config.center_name.clone(), coordinates)
}

pub fn session_settings(config: &AppConfig) -> SessionSettings {
    SessionSettings {
        location_timeout: Duration::from_secs(config.location_timeout_secs),
        submit_timeout: Duration::from_secs(config.request_timeout_secs),
        utc_offset: utc_offset(config),
    }
}

/// A session for the configured tutor at a position given on the command line.
pub fn session(
    config: &AppConfig,
    location: FixedLocation,
    api: ApiClient,
) -> Result<AttendanceSession<FixedLocation, ApiClient>> {
    Ok(AttendanceSession::new(
        config.tutor_id.clone(),
        center(config),
        policy(config)?,
        location,
        api,
        session_settings(config),
    ))
}

#[cfg(test)]
pub(crate) fn test_config() -> AppConfig {
    AppConfig {
        env: "test".into(),
        project_name: "tutor-attendance".into(),
        log_level: "tutor=debug".into(),
        log_file: "tutor.log".into(),
        log_to_stdout: false,
        api_base_url: "http://127.0.0.1:9/api".into(),
        api_token: String::new(),
        tutor_id: "tutor-1".into(),
        request_timeout_secs: 20,
        location_timeout_secs: 15,
        attendance_radius_m: 20.0,
        sunday_blocked: true,
        utc_offset_minutes: 330,
        attendance_window: Some("16:00-18:00".into()),
        center_name: "Main Center".into(),
        center_lat: Some(28.6139),
        center_lng: Some(77.2090),
        app_version: "3.0.0".into(),
    }
}
