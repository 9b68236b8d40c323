use crate::error::BackendError;
use async_trait::async_trait;
use geofence::Coordinate;
use serde::{Deserialize, Serialize};

/// Body the backend returns for an attendance submission.
///
/// `assigned_time` is only present when the server refuses a submission made
/// outside the tutor's assigned time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SubmitReply {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub attendance: Option<serde_json::Value>,
    #[serde(default, rename = "assignedTime")]
    pub assigned_time: Option<String>,
}

/// The attendance endpoints of the REST backend.
#[async_trait]
pub trait AttendanceBackend: Send + Sync {
    /// `POST` the tutor's coordinates for durable recording.
    async fn submit_attendance(&self, at: Coordinate) -> Result<SubmitReply, BackendError>;

    /// Administrator switch for the attendance button.
    async fn button_status(&self) -> Result<bool, BackendError>;

    /// Today's attendance records for the tutor; non-empty means already marked.
    async fn recent_attendance(&self) -> Result<Vec<serde_json::Value>, BackendError>;
}

#[async_trait]
impl<T: AttendanceBackend + ?Sized> AttendanceBackend for std::sync::Arc<T> {
    async fn submit_attendance(&self, at: Coordinate) -> Result<SubmitReply, BackendError> {
        (**self).submit_attendance(at).await
    }

    async fn button_status(&self) -> Result<bool, BackendError> {
        (**self).button_status().await
    }

    async fn recent_attendance(&self) -> Result<Vec<serde_json::Value>, BackendError> {
        (**self).recent_attendance().await
    }
}
