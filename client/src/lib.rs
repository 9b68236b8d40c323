//! # Client
//!
//! HTTP client for the tuition-center backend: attendance submission and policy
//! facts (as an [`attendance::AttendanceBackend`]), the version check,
//! announcements, the tutor's roster, student records and subject marks.

pub mod client;
pub mod endpoints;
pub mod error;
pub mod marks;
pub mod models;
pub mod validation;

pub use client::ApiClient;
pub use error::ClientError;
pub use marks::{MarksEntry, MarksError};
pub use models::{Announcement, MarkRecord, Student, StudentUpdate, SubjectRecord, VersionCheck};
