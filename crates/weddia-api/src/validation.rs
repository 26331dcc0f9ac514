//! Upload input validation, applied before any storage or database I/O.

use weddia_core::constants::is_allowed_content_type;
use weddia_core::AppError;

/// Validate one file's declared attributes against the upload rules.
pub fn validate_upload_file(
    file_name: &str,
    content_type: &str,
    size: usize,
    max_file_size_bytes: usize,
) -> Result<(), AppError> {
    if file_name.trim().is_empty() {
        return Err(AppError::Validation("File name must not be empty".to_string()));
    }
    if !is_allowed_content_type(content_type) {
        return Err(AppError::Validation(format!(
            "Unsupported file type {} for {}",
            content_type, file_name
        )));
    }
    if size > max_file_size_bytes {
        return Err(AppError::PayloadTooLarge(format!(
            "{} exceeds the maximum file size of {} MB",
            file_name,
            max_file_size_bytes / 1024 / 1024
        )));
    }
    Ok(())
}

/// Validate the display name attributed to a post.
pub fn validate_display_name(posted_user_name: &str) -> Result<(), AppError> {
    if posted_user_name.trim().is_empty() {
        return Err(AppError::Validation(
            "Display name must not be empty".to_string(),
        ));
    }
    Ok(())
}
