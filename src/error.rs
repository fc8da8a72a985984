//! # Error Handling
//!
//! Service error types and how they're converted to HTTP responses.
//!
//! ## Mapping:
//! - Malformed input (bad base64, wrong sample rate, empty payload) → 400
//! - No suppressor loaded → 503, checked before the pipeline runs
//! - Contract violations inside the pipeline → 500 with the diagnostic detail
//!
//! Per-frame suppression failures never show up here; the pipeline absorbs
//! them with its pass-through fallback.

use crate::audio::PipelineError;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use std::fmt;

/// Custom error types for the application.
///
/// ## Usage Example:
/// ```ignore
/// return Err(AppError::BadRequest("Invalid base64".to_string()));
/// ```
#[derive(Debug)]
pub enum AppError {
    /// Internal server errors (pipeline contract violations, poisoned locks, etc.)
    Internal(String),

    /// Client sent invalid or malformed data
    BadRequest(String),

    /// User input failed validation rules
    ValidationError(String),

    /// A required capability (the noise suppressor) is not available
    ServiceUnavailable(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

/// Converts errors into JSON responses of the form:
///
/// ```json
/// {
///   "error": {
///     "type": "bad_request",
///     "message": "Invalid base64 audio payload: ...",
///     "timestamp": "2025-01-01T12:00:00Z"
///   }
/// }
/// ```
impl ResponseError for AppError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;
        match self {
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) | AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (error_type, message) = match self {
            AppError::Internal(msg) => ("internal_error", msg),
            AppError::BadRequest(msg) => ("bad_request", msg),
            AppError::ValidationError(msg) => ("validation_error", msg),
            AppError::ServiceUnavailable(msg) => ("service_unavailable", msg),
        };

        HttpResponse::build(self.status_code()).json(json!({
            "error": {
                "type": error_type,
                "message": message,
                "timestamp": chrono::Utc::now().to_rfc3339()
            }
        }))
    }
}

/// JSON parsing errors are almost always the client's fault.
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(format!("JSON parsing error: {}", err))
    }
}

/// The transport wrapper around the audio did not decode.
impl From<base64::DecodeError> for AppError {
    fn from(err: base64::DecodeError) -> Self {
        AppError::BadRequest(format!("Invalid base64 audio payload: {}", err))
    }
}

/// Pipeline errors are contract violations, never bad client input.
impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        AppError::Internal(format!("Audio cleaning failed: {}", err))
    }
}

/// The blocking pool went away or the closure panicked.
impl From<actix_web::error::BlockingError> for AppError {
    fn from(err: actix_web::error::BlockingError) -> Self {
        AppError::Internal(format!("Audio cleaning task failed: {}", err))
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use base64::Engine;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::ServiceUnavailable("x".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(AppError::BadRequest("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Internal("x".into()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_conversions() {
        let decode_err = base64::engine::general_purpose::STANDARD
            .decode("not base64!!")
            .unwrap_err();
        assert!(matches!(AppError::from(decode_err), AppError::BadRequest(_)));

        let pipeline_err = PipelineError::InvalidFrameLength(0);
        assert!(matches!(AppError::from(pipeline_err), AppError::Internal(_)));
    }
}
