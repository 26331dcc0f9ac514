//! Error types module
//!
//! All errors surfaced by the upload pipeline are unified under the `AppError`
//! enum: validation, staging, dispatch, per-file processing, and the
//! authorization/existence failures of the status read path.

use std::io;

use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented.
/// This trait allows errors to self-describe their HTTP response characteristics.
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "VALIDATION_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[error("Storage error: {0}")]
    Storage(String),

    /// Bad input shape/size/type, caught before any I/O.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Failure writing a file to temporary storage; the batch is aborted
    /// before a job is created.
    #[error("Staging failed for {file_name}: {reason}")]
    Staging { file_name: String, reason: String },

    /// Staging succeeded but job creation/dispatch could not be registered.
    #[error("Completion registration failed: {0}")]
    CompletionRegistration(String),

    /// The queue/direct hand-off itself failed; the job is forced to failed.
    #[error("Dispatch failed: {0}")]
    Dispatch(String),

    /// Input could not be decoded as its declared media type.
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(format!("JSON parsing error: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::Validation(format!("UUID parsing error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, sensitive, log_level).
/// Reduces duplication in the ErrorMetadata impl; client_message stays per-variant
/// for dynamic content.
fn app_error_static_metadata(err: &AppError) -> (u16, &'static str, bool, bool, LogLevel) {
    match err {
        AppError::Database(_) => (500, "DATABASE_ERROR", true, true, LogLevel::Error),
        AppError::Storage(_) => (500, "STORAGE_ERROR", true, true, LogLevel::Error),
        AppError::Validation(_) => (400, "VALIDATION_ERROR", false, false, LogLevel::Debug),
        AppError::Staging { .. } => (502, "STAGING_ERROR", true, false, LogLevel::Warn),
        AppError::CompletionRegistration(_) => (
            500,
            "COMPLETION_REGISTRATION_ERROR",
            true,
            true,
            LogLevel::Error,
        ),
        AppError::Dispatch(_) => (500, "DISPATCH_ERROR", false, true, LogLevel::Error),
        AppError::Decode(_) => (400, "DECODE_ERROR", false, false, LogLevel::Warn),
        AppError::NotFound(_) => (404, "NOT_FOUND", false, false, LogLevel::Debug),
        AppError::Forbidden(_) => (403, "FORBIDDEN", false, false, LogLevel::Warn),
        AppError::Unauthorized(_) => (401, "UNAUTHORIZED", false, false, LogLevel::Warn),
        AppError::PayloadTooLarge(_) => (413, "PAYLOAD_TOO_LARGE", false, false, LogLevel::Debug),
        AppError::Internal(_) => (500, "INTERNAL_ERROR", false, true, LogLevel::Error),
        AppError::InternalWithSource { .. } => (500, "INTERNAL_ERROR", false, true, LogLevel::Error),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Database(_) => "Database",
            AppError::Storage(_) => "Storage",
            AppError::Validation(_) => "Validation",
            AppError::Staging { .. } => "Staging",
            AppError::CompletionRegistration(_) => "CompletionRegistration",
            AppError::Dispatch(_) => "Dispatch",
            AppError::Decode(_) => "Decode",
            AppError::NotFound(_) => "NotFound",
            AppError::Forbidden(_) => "Forbidden",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including the source chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).3
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).4
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Database(_) => "Failed to access database".to_string(),
            AppError::Storage(_) => "Failed to access storage".to_string(),
            AppError::Validation(msg) => msg.clone(),
            AppError::Staging { file_name, .. } => {
                format!("Failed to upload {}", file_name)
            }
            AppError::CompletionRegistration(_) => {
                "Failed to register the upload for processing".to_string()
            }
            AppError::Dispatch(_) => "Failed to start background processing".to_string(),
            AppError::Decode(msg) => msg.clone(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::Forbidden(msg) => msg.clone(),
            AppError::Unauthorized(msg) => msg.clone(),
            AppError::PayloadTooLarge(msg) => msg.clone(),
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::InternalWithSource { .. } => "Internal server error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_maps_status_codes() {
        assert_eq!(
            AppError::Validation("bad".into()).http_status_code(),
            400
        );
        assert_eq!(AppError::NotFound("job".into()).http_status_code(), 404);
        assert_eq!(AppError::Forbidden("job".into()).http_status_code(), 403);
        assert_eq!(
            AppError::Dispatch("queue down".into()).http_status_code(),
            500
        );
    }

    #[test]
    fn sensitive_errors_hide_internal_message() {
        let err = AppError::Internal("pool exhausted at 10.0.0.3".into());
        assert!(err.is_sensitive());
        assert_eq!(err.client_message(), "Internal server error");
    }

    #[test]
    fn staging_error_names_the_file() {
        let err = AppError::Staging {
            file_name: "IMG_0001.jpg".into(),
            reason: "connection reset".into(),
        };
        assert!(err.to_string().contains("IMG_0001.jpg"));
        assert_eq!(err.error_code(), "STAGING_ERROR");
    }
}
