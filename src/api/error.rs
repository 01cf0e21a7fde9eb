//! API error handling for consistent JSON error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::job::JobError;

/// API error type that converts to `{"error": true, "message": ...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": true,
            "message": self.message,
        }));
        (self.status, body).into_response()
    }
}

impl From<JobError> for ApiError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::NotFound(_) => Self::not_found(err.to_string()),
            JobError::NotReady(_)
            | JobError::UnsupportedFormat(_)
            | JobError::InvalidAudioFile(_) => Self::bad_request(err.to_string()),
            JobError::AlreadyExists(_) => Self::new(StatusCode::CONFLICT, err.to_string()),
            other => {
                error!("Request failed: {:#}", anyhow::Error::from(other));
                Self::internal("Internal server error")
            }
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        error!("Request failed: {:#}", err);
        Self::internal(err.to_string())
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobStatus;

    #[test]
    fn test_job_error_status_codes() {
        let cases = [
            (JobError::NotFound("a".into()), StatusCode::NOT_FOUND),
            (JobError::NotReady(JobStatus::Analyzing), StatusCode::BAD_REQUEST),
            (JobError::UnsupportedFormat("xml".into()), StatusCode::BAD_REQUEST),
            (JobError::InvalidAudioFile("a.exe".into()), StatusCode::BAD_REQUEST),
            (JobError::AlreadyExists("a".into()), StatusCode::CONFLICT),
            (
                JobError::Storage(anyhow::anyhow!("disk full")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }

    #[test]
    fn test_not_ready_message() {
        let err = ApiError::from(JobError::NotReady(JobStatus::Transcribing));
        assert_eq!(err.message, "Processing not completed (status: transcribing)");
    }
}
