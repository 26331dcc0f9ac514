//! Server-proxied bulk upload: the client sends the raw files as multipart
//! form data, the server stages them and registers the background job.
//!
//! All files are validated before any byte reaches storage, so a bad batch
//! fails atomically with 400. Staging failures abort the batch before a job
//! row exists; already-staged copies are cleaned up best effort.

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;
use weddia_core::models::FileMetadata;
use weddia_core::AppError;
use weddia_processing::sanitize_file_name;
use weddia_storage::derive_keys;

use crate::auth::AuthUser;
use crate::error::HttpAppError;
use crate::state::AppState;
use crate::validation::{validate_display_name, validate_upload_file};

#[derive(Debug, Serialize)]
pub struct InitiateUploadResponse {
    pub job_id: Uuid,
    pub status: &'static str,
    pub total_files: usize,
}

struct IncomingFile {
    file_name: String,
    content_type: String,
    data: Vec<u8>,
}

#[tracing::instrument(
    skip(state, multipart),
    fields(
        user_id = %auth.user_id,
        wedding_id = %auth.wedding_id,
        operation = "initiate_upload"
    )
)]
pub async fn initiate_upload(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<InitiateUploadResponse>), HttpAppError> {
    let mut posted_user_name = String::new();
    let mut files: Vec<IncomingFile> = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        HttpAppError(AppError::Validation(format!("Invalid multipart body: {}", e)))
    })? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("posted_user_name") => {
                posted_user_name = field.text().await.map_err(|e| {
                    HttpAppError(AppError::Validation(format!(
                        "Invalid posted_user_name field: {}",
                        e
                    )))
                })?;
            }
            Some("files") => {
                let file_name = sanitize_file_name(field.file_name().unwrap_or_default());
                let content_type = field.content_type().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| {
                        HttpAppError(AppError::Validation(format!(
                            "Failed to read file {}: {}",
                            file_name, e
                        )))
                    })?
                    .to_vec();
                files.push(IncomingFile {
                    file_name,
                    content_type,
                    data,
                });
            }
            _ => {}
        }
    }

    validate_display_name(&posted_user_name)?;
    if files.is_empty() {
        return Err(AppError::Validation("No files in upload".to_string()).into());
    }
    for file in &files {
        validate_upload_file(
            &file.file_name,
            &file.content_type,
            file.data.len(),
            state.config.max_file_size_bytes,
        )?;
    }

    // Stage every file under temp/ before the job row exists. On failure the
    // whole batch aborts; copies staged so far are removed best effort.
    let mut file_metadata: Vec<FileMetadata> = Vec::with_capacity(files.len());
    for file in files {
        let keys = derive_keys(&auth.wedding_id.to_string(), &file.file_name);
        let size = file.data.len() as i64;

        if let Err(e) = state
            .storage
            .upload(&keys.temp_key, file.data, &file.content_type)
            .await
        {
            for staged in &file_metadata {
                if let Err(cleanup_err) = state.storage.delete(&staged.temp_key).await {
                    tracing::warn!(
                        temp_key = %staged.temp_key,
                        error = %cleanup_err,
                        "Failed to clean up staged file after aborted batch"
                    );
                }
            }
            return Err(AppError::Staging {
                file_name: file.file_name,
                reason: e.to_string(),
            }
            .into());
        }

        file_metadata.push(FileMetadata {
            file_name: file.file_name,
            content_type: file.content_type,
            size,
            storage_key: keys.storage_key,
            temp_key: keys.temp_key,
        });
    }

    let descriptor = state
        .jobs
        .create(
            auth.wedding_id,
            auth.user_id,
            posted_user_name.trim(),
            &file_metadata,
        )
        .await
        .map_err(|e| match e {
            AppError::Validation(_) => e,
            other => AppError::CompletionRegistration(other.to_string()),
        })?;

    state.dispatcher.dispatch(&descriptor).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(InitiateUploadResponse {
            job_id: descriptor.job_id,
            status: "pending",
            total_files: descriptor.file_metadata.len(),
        }),
    ))
}
