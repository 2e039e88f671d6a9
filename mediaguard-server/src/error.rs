//! API error handling module
//!
//! Provides a unified error type for all API endpoints with structured error variants.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mediaguard_core::{MediaGuardError, ValidationError};
use thiserror::Error;

/// API error type with structured variants for different error categories
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad request - client provided invalid input
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Not found - requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error - unexpected server-side failure
    #[error("Internal error: {0}")]
    Internal(String),

    /// Service unavailable - required service is not configured or available
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Upload rejected before analysis
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// MediaGuard core error - error from the analysis library
    #[error("Analysis error: {0}")]
    Core(MediaGuardError),
}

impl From<MediaGuardError> for ApiError {
    fn from(err: MediaGuardError) -> Self {
        match err {
            MediaGuardError::Validation(e) => Self::Validation(e),
            other => Self::Core(other),
        }
    }
}

impl ApiError {
    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create an internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a service unavailable error
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Validation(e) => match e {
                ValidationError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                ValidationError::UnsupportedFormat(_) | ValidationError::Corrupted(_) => {
                    StatusCode::BAD_REQUEST
                }
            },
            Self::Core(e) => match e {
                MediaGuardError::JobNotFound(_) => StatusCode::NOT_FOUND,
                MediaGuardError::InvalidJobId(_) => StatusCode::BAD_REQUEST,

                // Saturation and upstream failures → 503
                MediaGuardError::QueueFull { .. }
                | MediaGuardError::QueueClosed
                | MediaGuardError::Oracle(_)
                | MediaGuardError::HttpError(_) => StatusCode::SERVICE_UNAVAILABLE,

                MediaGuardError::Validation(_) => StatusCode::BAD_REQUEST,

                // Internal processing failures → 500
                MediaGuardError::Sampling(_)
                | MediaGuardError::EmptyScores
                | MediaGuardError::Decode(_)
                | MediaGuardError::InvalidTransition(_)
                | MediaGuardError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Get the error code for programmatic error handling
    fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "INVALID_INPUT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::Validation(e) => match e {
                ValidationError::TooLarge { .. } => "PAYLOAD_TOO_LARGE",
                ValidationError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
                ValidationError::Corrupted(_) => "CORRUPTED_MEDIA",
            },
            Self::Core(e) => match e {
                MediaGuardError::JobNotFound(_) => "JOB_NOT_FOUND",
                MediaGuardError::InvalidJobId(_) => "INVALID_JOB_ID",
                MediaGuardError::QueueFull { .. } => "QUEUE_FULL",
                MediaGuardError::QueueClosed => "SHUTTING_DOWN",
                MediaGuardError::Oracle(_) | MediaGuardError::HttpError(_) => "CLASSIFIER_UNAVAILABLE",
                MediaGuardError::Validation(_) => "INVALID_MEDIA",
                MediaGuardError::Sampling(_) => "SAMPLING_FAILED",
                MediaGuardError::EmptyScores => "NO_SCORES",
                MediaGuardError::Decode(_) => "DECODE_ERROR",
                MediaGuardError::InvalidTransition(_) | MediaGuardError::Io(_) => "INTERNAL_ERROR",
            },
        }
    }

    /// Get sanitized error message for client response
    fn client_message(&self) -> String {
        match self {
            Self::Validation(ValidationError::TooLarge { kind, max, .. }) => {
                format!("{} exceeds the maximum size of {} MB", kind, max / (1024 * 1024))
            }
            Self::Validation(ValidationError::UnsupportedFormat(_)) => {
                "Unsupported media format (allowed: JPEG, PNG)".to_string()
            }
            Self::Validation(ValidationError::Corrupted(_)) => {
                "Media is corrupted or unreadable".to_string()
            }
            // For core errors, sanitize internal details
            Self::Core(e) => match e {
                MediaGuardError::JobNotFound(id) => format!("Job {} not found", id),
                MediaGuardError::InvalidJobId(_) => "Malformed job id".to_string(),
                MediaGuardError::QueueFull { .. } => {
                    "Analysis queue is full, retry later".to_string()
                }
                MediaGuardError::QueueClosed => "Server is shutting down".to_string(),
                MediaGuardError::Oracle(_) | MediaGuardError::HttpError(_) => {
                    "Classifier unavailable".to_string()
                }
                _ => "Analysis failed".to_string(),
            },
            // For other errors, use the Display message
            _ => self.to_string(),
        }
    }

    /// Get the error category for logging
    fn error_category(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::NotFound(_) => "not_found",
            Self::Internal(_) => "internal",
            Self::ServiceUnavailable(_) => "service_unavailable",
            Self::Validation(_) => "validation",
            Self::Core(_) => "core",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let category = self.error_category();
        let code = self.error_code();
        let internal_message = self.to_string();
        let client_message = self.client_message();

        // Log based on severity, always including internal details
        if status.is_server_error() {
            tracing::error!(
                status = %status,
                category = category,
                code = code,
                error = %internal_message,
                client_message = %client_message,
                "Server error"
            );
        } else {
            tracing::warn!(
                status = %status,
                category = category,
                code = code,
                error = %internal_message,
                "Client error"
            );
        }

        // All error responses include a `code` field for programmatic error handling
        let body = serde_json::json!({
            "error": client_message,
            "code": code,
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediaguard_core::MediaKind;

    #[test]
    fn test_validation_status_codes() {
        let too_large = ApiError::from(ValidationError::TooLarge {
            kind: MediaKind::Video,
            size: 60 * 1024 * 1024,
            max: 50 * 1024 * 1024,
        });
        assert_eq!(too_large.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(too_large.error_code(), "PAYLOAD_TOO_LARGE");
        assert!(too_large.client_message().contains("50 MB"));

        let format = ApiError::from(ValidationError::UnsupportedFormat("Gif".into()));
        assert_eq!(format.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(format.error_code(), "UNSUPPORTED_FORMAT");

        let corrupted = ApiError::from(ValidationError::Corrupted("eof".into()));
        assert_eq!(corrupted.error_code(), "CORRUPTED_MEDIA");
    }

    #[test]
    fn test_core_errors_unwrap_validation() {
        let err = ApiError::from(MediaGuardError::Validation(ValidationError::Corrupted(
            "bad".into(),
        )));
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn test_job_errors() {
        let missing = ApiError::from(MediaGuardError::JobNotFound("abc".into()));
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(missing.error_code(), "JOB_NOT_FOUND");

        let full = ApiError::from(MediaGuardError::QueueFull { capacity: 4 });
        assert_eq!(full.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(full.error_code(), "QUEUE_FULL");

        let malformed = ApiError::from(MediaGuardError::InvalidJobId("x".into()));
        assert_eq!(malformed.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_details_not_leaked() {
        let err = ApiError::from(MediaGuardError::Decode("/tmp/mediaguard-abc.mp4: moov atom".into()));
        assert!(!err.client_message().contains("/tmp"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
