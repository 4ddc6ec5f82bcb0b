//! HTTP error response conversion
//!
//! Every error leaves the API as `{"msg": <client message>, "code": 1}` with the status
//! taken from [`ErrorMetadata`]. Server-side detail is logged, never returned.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use imgdrop_core::{EditorConfigError, ErrorMetadata, LogLevel, UploadError, UploadOutcome};
use serde::Serialize;

/// Failure body shared by all endpoints.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub msg: String,
    pub code: u8,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            msg: msg.into(),
            code: 1,
        }
    }
}

impl From<&UploadOutcome> for ErrorResponse {
    fn from(outcome: &UploadOutcome) -> Self {
        Self {
            msg: outcome.error_message.clone().unwrap_or_default(),
            code: outcome.error_code,
        }
    }
}

/// Wrapper type so domain errors from other crates can implement IntoResponse.
#[derive(Debug)]
pub enum HttpAppError {
    Upload(UploadError),
    EditorConfig(EditorConfigError),
}

impl From<UploadError> for HttpAppError {
    fn from(err: UploadError) -> Self {
        HttpAppError::Upload(err)
    }
}

impl From<EditorConfigError> for HttpAppError {
    fn from(err: EditorConfigError) -> Self {
        HttpAppError::EditorConfig(err)
    }
}

fn log_error(error: &UploadError) {
    let code = error.error_code();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_code = code, "Upload rejected");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_code = code, "Upload rejected");
        }
        LogLevel::Error => {
            tracing::error!(
                error = %error.detailed_message(),
                error_code = code,
                "Upload failed"
            );
        }
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        match self {
            HttpAppError::Upload(err) => {
                let status = StatusCode::from_u16(err.http_status_code())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                log_error(&err);
                (status, Json(ErrorResponse::from(&UploadOutcome::failed(&err)))).into_response()
            }
            HttpAppError::EditorConfig(err) => {
                let status = match err {
                    EditorConfigError::NotFound(_) => {
                        tracing::debug!(error = %err, "Editor config not found");
                        StatusCode::NOT_FOUND
                    }
                    _ => {
                        tracing::error!(error = %err, "Editor configuration is invalid");
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, Json(ErrorResponse::new(err.to_string()))).into_response()
            }
        }
    }
}
