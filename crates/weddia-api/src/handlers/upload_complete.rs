//! Direct-to-storage upload, step two: after the client has PUT every file to
//! its staging key, this call registers the upload job and dispatches it.
//!
//! The declared metadata is re-validated; clients can tamper with their own
//! earlier declarations, so nothing from the presign step is trusted.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use weddia_core::models::FileMetadata;
use weddia_core::AppError;
use weddia_storage::temp_key_for;

use crate::auth::AuthUser;
use crate::error::HttpAppError;
use crate::state::AppState;
use crate::validation::{validate_display_name, validate_upload_file};

#[derive(Debug, Deserialize)]
pub struct CompleteUploadRequest {
    pub posted_user_name: String,
    pub files: Vec<FileMetadata>,
}

#[derive(Debug, Serialize)]
pub struct CompleteUploadResponse {
    pub job_id: Uuid,
    pub status: &'static str,
    pub total_files: usize,
}

#[tracing::instrument(
    skip(state, request),
    fields(
        user_id = %auth.user_id,
        wedding_id = %auth.wedding_id,
        file_count = request.files.len(),
        operation = "complete_upload"
    )
)]
pub async fn complete_upload(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(request): Json<CompleteUploadRequest>,
) -> Result<(StatusCode, Json<CompleteUploadResponse>), HttpAppError> {
    validate_display_name(&request.posted_user_name)?;
    if request.files.is_empty() {
        return Err(AppError::Validation("No files in upload".to_string()).into());
    }

    let wedding_prefix = format!("weddings/{}/", auth.wedding_id);
    for file in &request.files {
        validate_upload_file(
            &file.file_name,
            &file.content_type,
            file.size.max(0) as usize,
            state.config.max_file_size_bytes,
        )?;
        // Keys must be ones this caller could have been issued: scoped to
        // their wedding, with the staging key derived from the final key.
        if !file.storage_key.starts_with(&wedding_prefix) {
            return Err(AppError::Validation(format!(
                "Storage key for {} does not belong to this wedding",
                file.file_name
            ))
            .into());
        }
        if file.temp_key != temp_key_for(&file.storage_key) {
            return Err(AppError::Validation(format!(
                "Temp key for {} does not match its storage key",
                file.file_name
            ))
            .into());
        }
    }

    let descriptor = state
        .jobs
        .create(
            auth.wedding_id,
            auth.user_id,
            request.posted_user_name.trim(),
            &request.files,
        )
        .await
        .map_err(|e| match e {
            AppError::Validation(_) => e,
            other => AppError::CompletionRegistration(other.to_string()),
        })?;

    state.dispatcher.dispatch(&descriptor).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(CompleteUploadResponse {
            job_id: descriptor.job_id,
            status: "pending",
            total_files: descriptor.file_metadata.len(),
        }),
    ))
}
