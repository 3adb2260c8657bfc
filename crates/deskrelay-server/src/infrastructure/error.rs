use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use deskrelay_core::SnapshotError;
use thiserror::Error;

/// Structured error type for all relay handlers.
///
/// Each variant maps to an HTTP status code, a machine-readable code string,
/// and a human-readable message (its `Display` text).  Implements
/// [`IntoResponse`] so handlers can return `Result<T, ApiError>` directly.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 400 - The control body was not a JSON object.
    #[error("Invalid control snapshot: {0}.")]
    InvalidSnapshot(String),
    /// 404 - The session has no image yet.
    #[error("Session {0} has no image yet.")]
    NoImage(String),
}

impl ApiError {
    /// Returns the HTTP status code for this error variant.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidSnapshot(_) => StatusCode::BAD_REQUEST,
            ApiError::NoImage(_) => StatusCode::NOT_FOUND,
        }
    }

    /// Returns a machine-readable error code string.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidSnapshot(_) => "invalid_snapshot",
            ApiError::NoImage(_) => "no_image",
        }
    }

    /// Returns a human-readable error message.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl From<SnapshotError> for ApiError {
    fn from(err: SnapshotError) -> Self {
        ApiError::InvalidSnapshot(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": {
                "code": self.code(),
                "message": self.message(),
            }
        });
        (self.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_snapshot_is_bad_request() {
        let err = ApiError::InvalidSnapshot("expected value".into());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "invalid_snapshot");
        assert!(err.message().contains("expected value"));
    }

    #[test]
    fn test_no_image_is_not_found() {
        let err = ApiError::NoImage("abc".into());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), "no_image");
        assert!(err.message().contains("abc"));
    }

    #[test]
    fn test_snapshot_error_converts_to_bad_request() {
        // Arrange
        let err = deskrelay_core::ControlSnapshot::from_slice(b"[]").unwrap_err();

        // Act
        let api: ApiError = err.into();

        // Assert
        assert_eq!(api.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(api.message(), api.to_string());
        assert!(api.message().contains("JSON object"), "{}", api.message());
    }

    #[test]
    fn test_into_response_carries_status() {
        let response = ApiError::NoImage("abc".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
