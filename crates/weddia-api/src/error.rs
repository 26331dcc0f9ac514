//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`. Domain errors
//! (`AppError` or types convertible into it) become `HttpAppError` via
//! `.map_err(Into::into)` or `?` and render consistently (status, body,
//! logging).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use weddia_core::{AppError, ErrorMetadata, LogLevel};
use weddia_processing::OptimizeError;
use weddia_storage::StorageError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Whether this error is recoverable (can be retried)
    pub recoverable: bool,
}

/// Wrapper type for AppError to implement IntoResponse.
/// Necessary because of Rust's orphan rules - we can't implement
/// IntoResponse (external trait) for AppError (external type from weddia-core).
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => HttpAppError(AppError::NotFound(key)),
            other => HttpAppError(AppError::Storage(other.to_string())),
        }
    }
}

impl From<OptimizeError> for HttpAppError {
    fn from(err: OptimizeError) -> Self {
        HttpAppError(AppError::Decode(err.to_string()))
    }
}

impl From<sqlx::Error> for HttpAppError {
    fn from(err: sqlx::Error) -> Self {
        HttpAppError(AppError::Database(err))
    }
}

fn log_error(error: &AppError) {
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error.detailed_message(), code = error.error_code(), "Request failed")
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error.detailed_message(), code = error.error_code(), "Request failed")
        }
        LogLevel::Error => {
            tracing::error!(error = %error.detailed_message(), code = error.error_code(), "Request failed")
        }
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let error = self.0;
        log_error(&error);

        let status = StatusCode::from_u16(error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse {
            error: error.client_message(),
            error_type: Some(error.error_type().to_string()),
            code: error.error_code().to_string(),
            recoverable: error.is_recoverable(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_maps_to_400() {
        let response =
            HttpAppError(AppError::Validation("bad file type".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn forbidden_maps_to_403() {
        let response = HttpAppError(AppError::Forbidden("not yours".into())).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn storage_not_found_maps_to_404() {
        let response: HttpAppError = StorageError::NotFound("temp/x".into()).into();
        assert_eq!(response.into_response().status(), StatusCode::NOT_FOUND);
    }
}
