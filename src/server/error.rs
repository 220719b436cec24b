//! HTTP mapping of pipeline errors

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::CliniaError;

const BYTES_PER_MB: u64 = 1024 * 1024;

impl CliniaError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            CliniaError::Validation(_) => StatusCode::BAD_REQUEST,
            CliniaError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            CliniaError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short error label placed in the `error` field of the response body
    pub fn category(&self) -> &'static str {
        match self {
            CliniaError::Validation(_) => "Invalid request",
            CliniaError::PayloadTooLarge { .. } => "File too large",
            CliniaError::Transcription(_) => "Transcription failed",
            CliniaError::Llm(_) => "Processing failed",
            CliniaError::Document(_) => "Failed to create Google Doc",
            CliniaError::NotFound(_) => "Session not found",
            _ => "Internal server error",
        }
    }

    /// Message without the category prefix added by `Display`
    fn details(&self) -> String {
        match self {
            CliniaError::Validation(m)
            | CliniaError::Transcription(m)
            | CliniaError::Llm(m)
            | CliniaError::Document(m)
            | CliniaError::NotFound(m)
            | CliniaError::Config(m)
            | CliniaError::Other(m) => m.clone(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for CliniaError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let body = match &self {
            CliniaError::PayloadTooLarge { limit_bytes } => json!({
                "error": self.category(),
                "max_size_mb": limit_bytes / BYTES_PER_MB,
            }),
            _ => json!({
                "error": self.category(),
                "details": self.details(),
            }),
        };

        (status, Json(body)).into_response()
    }
}

/// Map a failure while reading a multipart field.
///
/// Exceeding the body limit surfaces here as a 413 from the stream.
pub fn multipart_error(err: MultipartError, limit_bytes: u64) -> CliniaError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        CliniaError::PayloadTooLarge { limit_bytes }
    } else {
        CliniaError::Validation(err.body_text())
    }
}

pub fn multipart_rejection(rejection: MultipartRejection) -> CliniaError {
    CliniaError::Validation(rejection.body_text())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(
            CliniaError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            CliniaError::PayloadTooLarge { limit_bytes: 1 }.status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            CliniaError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            CliniaError::Transcription("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            CliniaError::Llm("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn details_drop_display_prefix() {
        let err = CliniaError::Transcription("upload rejected".into());
        assert_eq!(err.details(), "upload rejected");
        assert_eq!(err.category(), "Transcription failed");
    }
}
