//! Validation of subject marks entered by a tutor.
//!
//! Tutors type dates as `DD-MM-YY`; the backend stores `YYYY-MM-DD`.

use crate::validation::format_validation_errors;
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MarksError {
    #[error("Please enter valid marks percentage (0-100)")]
    InvalidPercentage(String),
    #[error("{0}")]
    Invalid(String),
    #[error("Please select exam date")]
    MissingExamDate,
    #[error("Exam date must be DD-MM-YY or YYYY-MM-DD, got '{0}'")]
    InvalidExamDate(String),
}

impl From<ValidationErrors> for MarksError {
    fn from(errors: ValidationErrors) -> Self {
        MarksError::Invalid(format_validation_errors(&errors))
    }
}

/// Body of the add and update marks endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MarksEntry {
    #[validate(range(min = 0.0, max = 100.0, message = "Marks must be between 0 and 100"))]
    pub marks_percentage: f64,
    /// `YYYY-MM-DD`.
    #[validate(length(min = 1, message = "Please select exam date"))]
    pub exam_date: String,
}

impl MarksEntry {
    /// Validates raw form input.
    pub fn parse(percentage: &str, exam_date: &str) -> Result<Self, MarksError> {
        let text = percentage.trim();
        let marks_percentage: f64 = text
            .parse()
            .ok()
            .filter(|p: &f64| p.is_finite())
            .ok_or_else(|| MarksError::InvalidPercentage(text.to_string()))?;

        let mut entry = Self {
            marks_percentage,
            exam_date: exam_date.trim().to_string(),
        };
        entry.validate()?;
        entry.exam_date = to_api_date(&entry.exam_date)?;
        Ok(entry)
    }
}

/// Converts `DD-MM-YY` (or `DD-MM-YYYY`) to `YYYY-MM-DD`; `YYYY-MM-DD` passes
/// through. Two-digit years below 30 are 20xx, the rest 19xx.
pub fn to_api_date(input: &str) -> Result<String, MarksError> {
    let text = input.trim();
    if text.is_empty() {
        return Err(MarksError::MissingExamDate);
    }
    let invalid = || MarksError::InvalidExamDate(text.to_string());

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        if text.split('-').next().is_some_and(|y| y.len() == 4) {
            return Ok(date.format("%Y-%m-%d").to_string());
        }
    }

    let parts: Vec<&str> = text.split('-').collect();
    let [d, m, y] = parts.as_slice() else {
        return Err(invalid());
    };
    let day: u32 = d.parse().map_err(|_| invalid())?;
    let month: u32 = m.parse().map_err(|_| invalid())?;
    let year: i32 = match y.len() {
        2 => {
            let short: i32 = y.parse().map_err(|_| invalid())?;
            if short < 30 { 2000 + short } else { 1900 + short }
        }
        4 => y.parse().map_err(|_| invalid())?,
        _ => return Err(invalid()),
    };

    NaiveDate::from_ymd_opt(year, month, day)
        .map(|date| date.format("%Y-%m-%d").to_string())
        .ok_or_else(invalid)
}

/// `YYYY-MM-DD` or an RFC 3339 timestamp to `DD-MM-YY`, for display. Anything
/// else is returned unchanged.
pub fn to_display_date(input: &str) -> String {
    let date_part = input.get(..10).unwrap_or(input);
    match NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        Ok(date) => date.format("%d-%m-%y").to_string(),
        Err(_) => input.to_string(),
    }
}
