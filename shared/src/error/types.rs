//! AppError and the response envelope

use super::category::ErrorCategory;
use super::codes::ErrorCode;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Structured detail map attached to a failure
pub type ErrorDetails = HashMap<String, Value>;

/// Error returned by every zone-server handler
///
/// `details` carries machine-readable context such as the offending
/// `field`, a polygon point `index`, or raw `stderr` of the detection run.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<ErrorDetails>,
}

impl AppError {
    /// Error with the code's default message
    pub fn new(code: ErrorCode) -> Self {
        Self::with_message(code, code.message())
    }

    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Attach one detail entry; later entries with the same key win
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.as_ref()?.get(key)
    }

    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    /// Validation failure of one request field, reported under `details.field`
    pub fn invalid_field(field: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::validation(msg).with_detail("field", field.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::DatabaseError, msg)
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::AlreadyExists, msg)
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// JSON envelope of every API response
///
/// ```text
/// success: {"code": 0, "message": "OK", "data": …}
/// failure: {"code": 2004, "category": "not_found", "message": "…", "details": {…}}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ErrorCategory>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ErrorDetails>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self::success_with_message("OK", data)
    }

    pub fn success_with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            code: Some(ErrorCode::Success.code()),
            category: None,
            message: message.into(),
            data: Some(data),
            details: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.code.is_none_or(|c| c == ErrorCode::Success.code())
    }
}

impl ApiResponse<()> {
    /// Failure envelope of `err`
    pub fn error(err: &AppError) -> Self {
        Self {
            code: Some(err.code.code()),
            category: Some(err.category()),
            message: err.message.clone(),
            data: None,
            details: err.details.clone(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.http_status();
        if self.category() == ErrorCategory::System {
            tracing::error!(code = %self.code, message = %self.message, "System error occurred");
        } else {
            tracing::debug!(code = %self.code, message = %self.message, "Request rejected");
        }
        (status, axum::Json(ApiResponse::<()>::error(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_message() {
        let err = AppError::new(ErrorCode::ZoneNotFound);
        assert_eq!(err.code, ErrorCode::ZoneNotFound);
        assert_eq!(err.message, "Zone not found");
        assert!(err.details.is_none());
    }

    #[test]
    fn test_details_accumulate() {
        let err = AppError::new(ErrorCode::InvalidGeometry)
            .with_detail("field", "polygon")
            .with_detail("index", 2);

        assert_eq!(err.detail("field").unwrap(), "polygon");
        assert_eq!(err.detail("index").unwrap(), 2);
        assert!(err.detail("missing").is_none());
    }

    #[test]
    fn test_invalid_field() {
        let err = AppError::invalid_field("label", "label is too long");
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(err.detail("field").unwrap(), "label");
    }

    #[test]
    fn test_http_status() {
        assert_eq!(
            AppError::new(ErrorCode::ProjectNotFound).http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::new(ErrorCode::MissingNavigationParameter).http_status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_failure_envelope_carries_category() {
        let err = AppError::new(ErrorCode::DetectionFailed).with_detail("stderr", "boom");
        let response = ApiResponse::<()>::error(&err);

        assert_eq!(response.code, Some(3001));
        assert!(!response.is_success());
        assert!(response.data.is_none());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["category"], "external_process");
        assert_eq!(json["details"]["stderr"], "boom");
    }

    #[test]
    fn test_success_envelope_is_minimal() {
        let response = ApiResponse::success(42);
        assert!(response.is_success());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["code"], 0);
        assert_eq!(json["data"], 42);
        assert!(json.get("category").is_none());
        assert!(json.get("details").is_none());
    }
}
