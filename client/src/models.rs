//! Response bodies of the tutor-facing endpoints.
//!
//! Only the fields the tutor client reads are typed; the backend sends more.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

#[derive(Debug, Clone, Deserialize)]
pub struct ButtonStatus {
    pub status: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AttendanceRequest {
    /// `[latitude, longitude]`.
    pub current_location: [f64; 2],
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VersionCheckRequest<'a> {
    pub user_version: &'a str,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionCheck {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub current_version: Option<String>,
    #[serde(default)]
    pub update_required: Option<bool>,
}

impl VersionCheck {
    pub fn update_required(&self) -> bool {
        self.update_required.unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub father_name: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub medium: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
    /// Fields the client does not edit, kept as sent.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of `PUT /students/:id`.
#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StudentUpdate {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Father Name is required"))]
    pub father_name: String,
    #[validate(length(min = 1, message = "Contact is required"))]
    pub contact: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medium: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

impl StudentUpdate {
    /// Starts an edit from the stored record. A missing status becomes `active`.
    pub fn from_student(student: &Student) -> Self {
        let text = |v: &Option<String>| v.as_deref().map(str::trim).unwrap_or_default().to_string();
        Self {
            name: student.name.trim().to_string(),
            father_name: text(&student.father_name),
            contact: text(&student.contact),
            status: student
                .status
                .clone()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "active".to_string()),
            medium: student.medium.clone(),
            gender: student.gender.clone(),
            remarks: student.remarks.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TutorResponse {
    #[serde(default)]
    pub students: Option<Vec<Student>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRef {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub subject_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkRecord {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    pub percentage: f64,
    #[serde(default)]
    pub exam_date: Option<String>,
    #[serde(default)]
    pub recorded_at: Option<String>,
}

/// One subject of a student with its marks history, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub student: Option<String>,
    pub subject: SubjectRef,
    #[serde(default)]
    pub marks_percentage: Vec<MarkRecord>,
}

impl SubjectRecord {
    pub fn latest(&self) -> Option<&MarkRecord> {
        self.marks_percentage.last()
    }

    pub fn average(&self) -> Option<f64> {
        if self.marks_percentage.is_empty() {
            return None;
        }
        let sum: f64 = self.marks_percentage.iter().map(|m| m.percentage).sum();
        Some(sum / self.marks_percentage.len() as f64)
    }
}
