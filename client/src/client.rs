//! # API Client
//!
//! `reqwest` implementation of the tutor endpoints. Every request carries the
//! bearer token when one is configured and is bounded by the request timeout.

use crate::endpoints::{self, build_path};
use crate::error::ClientError;
use crate::marks::MarksEntry;
use crate::models::{
    Announcement, AttendanceRequest, ButtonStatus, Student, StudentUpdate, SubjectRecord,
    TutorResponse, VersionCheck, VersionCheckRequest,
};
use async_trait::async_trait;
use attendance::{AttendanceBackend, BackendError, SubmitReply};
use geofence::Coordinate;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use util::config::AppConfig;
use validator::Validate;

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<String>,
    app_version: String,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
            app_version: "3.0.0".to_string(),
        })
    }

    /// Builds a client from the base URL, token, timeout and app version in `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self, ClientError> {
        let mut client = Self::new(
            config.api_base_url.clone(),
            Some(config.api_token.clone()),
            Duration::from_secs(config.request_timeout_secs),
        )?;
        client.app_version = config.app_version.clone();
        Ok(client)
    }

    pub fn with_app_version(mut self, version: impl Into<String>) -> Self {
        self.app_version = version.into();
        self
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%method, %url, "api call");
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = builder.send().await?;
        let response = check_status(response).await?;
        decode(response).await
    }

    /// `POST /native/version-check`. A 426 answer carries a normal body meaning
    /// the installed version must be updated.
    pub async fn check_version(&self) -> Result<VersionCheck, ClientError> {
        let response = self
            .request(Method::POST, endpoints::VERSION_CHECK)
            .json(&VersionCheckRequest {
                user_version: &self.app_version,
            })
            .send()
            .await?;

        if response.status() == StatusCode::UPGRADE_REQUIRED {
            let mut body: VersionCheck = decode(response).await?;
            body.update_required.get_or_insert(true);
            tracing::info!(current = ?body.current_version, "app update required");
            return Ok(body);
        }
        decode(check_status(response).await?).await
    }

    /// `GET /announcements/`, newest first.
    pub async fn announcements(&self) -> Result<Vec<Announcement>, ClientError> {
        self.send(self.request(Method::GET, endpoints::ANNOUNCEMENTS))
            .await
    }

    pub async fn latest_announcement(&self) -> Result<Option<Announcement>, ClientError> {
        Ok(self.announcements().await?.into_iter().next())
    }

    /// Students assigned to the tutor, from `GET /tutors/:id`.
    pub async fn tutor_students(&self, tutor_id: &str) -> Result<Vec<Student>, ClientError> {
        let path = build_path(endpoints::TUTOR, &[("id", tutor_id)]);
        let tutor: TutorResponse = self.send(self.request(Method::GET, &path)).await?;
        Ok(tutor.students.unwrap_or_default())
    }

    pub async fn student(&self, student_id: &str) -> Result<Student, ClientError> {
        let path = build_path(endpoints::STUDENT, &[("id", student_id)]);
        self.send(self.request(Method::GET, &path)).await
    }

    /// `PUT /students/:id`. The update is validated before anything is sent;
    /// returns the stored record.
    pub async fn update_student(
        &self,
        student_id: &str,
        update: &StudentUpdate,
    ) -> Result<Student, ClientError> {
        update.validate()?;
        let path = build_path(endpoints::STUDENT, &[("id", student_id)]);
        tracing::info!(student_id, "updating student");
        self.send(self.request(Method::PUT, &path).json(update))
            .await
    }

    pub async fn student_subjects(
        &self,
        student_id: &str,
    ) -> Result<Vec<SubjectRecord>, ClientError> {
        let path = build_path(
            endpoints::STUDENT_SUBJECTS_BY_STUDENT,
            &[("studentId", student_id)],
        );
        self.send(self.request(Method::GET, &path)).await
    }

    pub async fn add_marks(
        &self,
        student_id: &str,
        subject_id: &str,
        entry: &MarksEntry,
    ) -> Result<Value, ClientError> {
        let path = build_path(
            endpoints::STUDENT_SUBJECT_ADD_MARKS,
            &[("studentId", student_id), ("subjectId", subject_id)],
        );
        tracing::info!(student_id, subject_id, percentage = entry.marks_percentage, "adding marks");
        self.send(self.request(Method::POST, &path).json(entry))
            .await
    }

    pub async fn update_marks(
        &self,
        student_id: &str,
        subject_id: &str,
        entry: &MarksEntry,
    ) -> Result<Value, ClientError> {
        let path = build_path(
            endpoints::STUDENT_SUBJECT_UPDATE,
            &[("studentId", student_id), ("subjectId", subject_id)],
        );
        tracing::info!(student_id, subject_id, percentage = entry.marks_percentage, "updating marks");
        self.send(self.request(Method::PUT, &path).json(entry))
            .await
    }

    pub async fn delete_marks(&self, mark_id: &str, subject_id: &str) -> Result<Value, ClientError> {
        let path = build_path(
            endpoints::STUDENT_SUBJECT_DELETE_MARK,
            &[("markId", mark_id), ("subjectId", subject_id)],
        );
        tracing::info!(mark_id, subject_id, "deleting marks");
        self.send(self.request(Method::DELETE, &path)).await
    }
}

/// Turns a non-2xx response into [`ClientError::Status`] with the most useful
/// message the body offers.
async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .filter(|m| !m.is_empty())
        .or_else(|| Some(text.trim().to_string()).filter(|t| !t.is_empty()))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()))
        });

    tracing::warn!(status = status.as_u16(), %message, "api error response");
    Err(ClientError::Status {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| {
        ClientError::Decode(format!("error decoding response body: {e}. Full response: {text}"))
    })
}

#[async_trait]
impl AttendanceBackend for ApiClient {
    async fn submit_attendance(&self, at: Coordinate) -> Result<SubmitReply, BackendError> {
        let body = AttendanceRequest {
            current_location: at.as_pair(),
        };
        Ok(self
            .send(self.request(Method::POST, endpoints::ATTENDANCE).json(&body))
            .await?)
    }

    async fn button_status(&self) -> Result<bool, BackendError> {
        let status: ButtonStatus = self
            .send(self.request(Method::GET, endpoints::BUTTON_STATUS))
            .await?;
        Ok(status.status)
    }

    async fn recent_attendance(&self) -> Result<Vec<Value>, BackendError> {
        Ok(self
            .send(self.request(Method::GET, endpoints::ATTENDANCE_RECENT))
            .await?)
    }
}
