//! Direct-to-storage upload, step one: the client declares its batch and
//! receives one presigned PUT URL per file, each targeting a staging key.
//! No job exists yet; the job is registered by the completion call.

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use weddia_core::constants::PRESIGNED_URL_EXPIRY_SECS;
use weddia_processing::sanitize_file_name;
use weddia_storage::derive_keys;

use crate::auth::AuthUser;
use crate::error::HttpAppError;
use crate::state::AppState;
use crate::validation::validate_upload_file;

#[derive(Debug, Deserialize)]
pub struct PresignedUploadRequest {
    pub files: Vec<DeclaredFile>,
}

#[derive(Debug, Deserialize)]
pub struct DeclaredFile {
    pub file_name: String,
    pub content_type: String,
    pub size: i64,
}

#[derive(Debug, Serialize)]
pub struct PresignedUploadResponse {
    pub uploads: Vec<PresignedUpload>,
    pub expires_in_seconds: u64,
}

#[derive(Debug, Serialize)]
pub struct PresignedUpload {
    pub file_name: String,
    pub content_type: String,
    pub size: i64,
    /// Final key the file will be published under.
    pub storage_key: String,
    /// Staging key the presigned URL writes to.
    pub temp_key: String,
    pub upload_url: String,
}

#[tracing::instrument(
    skip(state, request),
    fields(
        user_id = %auth.user_id,
        wedding_id = %auth.wedding_id,
        file_count = request.files.len(),
        operation = "presigned_upload"
    )
)]
pub async fn presigned_upload(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(request): Json<PresignedUploadRequest>,
) -> Result<Json<PresignedUploadResponse>, HttpAppError> {
    if request.files.is_empty() {
        return Err(weddia_core::AppError::Validation("No files declared".to_string()).into());
    }

    for file in &request.files {
        validate_upload_file(
            &file.file_name,
            &file.content_type,
            file.size.max(0) as usize,
            state.config.max_file_size_bytes,
        )?;
    }

    let expiry = Duration::from_secs(PRESIGNED_URL_EXPIRY_SECS);
    let mut uploads = Vec::with_capacity(request.files.len());
    for file in request.files {
        let file_name = sanitize_file_name(&file.file_name);
        let keys = derive_keys(&auth.wedding_id.to_string(), &file_name);
        let upload_url = state
            .storage
            .presigned_put_url(&keys.temp_key, &file.content_type, expiry)
            .await?;
        uploads.push(PresignedUpload {
            file_name,
            content_type: file.content_type,
            size: file.size,
            storage_key: keys.storage_key,
            temp_key: keys.temp_key,
            upload_url,
        });
    }

    Ok(Json(PresignedUploadResponse {
        uploads,
        expires_in_seconds: PRESIGNED_URL_EXPIRY_SECS,
    }))
}
