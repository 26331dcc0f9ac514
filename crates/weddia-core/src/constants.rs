//! Shared constants for the upload pipeline.

/// Maximum size accepted for a single uploaded file (100 MiB).
pub const MAX_FILE_SIZE_BYTES: usize = 100 * 1024 * 1024;

/// Batches with at least this many files take the staged/background path.
pub const BACKGROUND_UPLOAD_THRESHOLD: usize = 5;

/// Content types accepted for upload.
pub const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
    "video/mp4",
    "video/quicktime",
    "video/webm",
];

/// Bounded retry count applied by the queue when invoking the worker callback.
pub const QUEUE_DEFAULT_RETRIES: u32 = 2;

/// Execution timeout (seconds) the queue enforces on a worker invocation.
pub const QUEUE_EXECUTION_TIMEOUT_SECS: u64 = 300;

/// Polling interval for job status while a job is pending or processing.
pub const STATUS_POLL_INTERVAL_SECS: u64 = 2;

/// Presigned upload URLs expire after this many seconds.
pub const PRESIGNED_URL_EXPIRY_SECS: u64 = 15 * 60;

/// Returns true when the content type is in the upload allowlist.
pub fn is_allowed_content_type(content_type: &str) -> bool {
    ALLOWED_CONTENT_TYPES.contains(&content_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowlist_accepts_both_jpeg_spellings() {
        assert!(is_allowed_content_type("image/jpeg"));
        assert!(is_allowed_content_type("image/jpg"));
    }

    #[test]
    fn allowlist_rejects_unknown_types() {
        assert!(!is_allowed_content_type("application/pdf"));
        assert!(!is_allowed_content_type("image/tiff"));
        assert!(!is_allowed_content_type(""));
    }
}
