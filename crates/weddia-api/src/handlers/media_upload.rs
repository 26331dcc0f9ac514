//! Synchronous single-file upload. Small batches skip the staging pipeline
//! entirely: the file is optimized and published within the request, and the
//! media row exists by the time the response returns.

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use weddia_core::models::{Media, MediaType};
use weddia_core::AppError;
use weddia_processing::{sanitize_file_name, MediaOptimizer};
use weddia_storage::{derive_keys, replace_extension};
use weddia_worker::GalleryRefresh;

use crate::auth::AuthUser;
use crate::error::HttpAppError;
use crate::state::AppState;
use crate::validation::{validate_display_name, validate_upload_file};

#[tracing::instrument(
    skip(state, multipart),
    fields(
        user_id = %auth.user_id,
        wedding_id = %auth.wedding_id,
        operation = "upload_media"
    )
)]
pub async fn upload_media(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Media>), HttpAppError> {
    let mut posted_user_name = String::new();
    let mut file: Option<(String, String, Vec<u8>)> = None;

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
            Some("file") => {
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
                file = Some((file_name, content_type, data));
            }
            _ => {}
        }
    }

    validate_display_name(&posted_user_name)?;
    let (file_name, content_type, data) =
        file.ok_or_else(|| AppError::Validation("No file in upload".to_string()))?;
    validate_upload_file(
        &file_name,
        &content_type,
        data.len(),
        state.config.max_file_size_bytes,
    )?;

    let optimized = MediaOptimizer::optimize(data, &content_type, &file_name)?;
    tracing::info!(
        file_name = %file_name,
        original_size = optimized.original_size,
        optimized_size = optimized.optimized_size,
        "Media optimized"
    );

    let keys = derive_keys(&auth.wedding_id.to_string(), &file_name);
    let final_key = replace_extension(&keys.storage_key, &optimized.extension);
    let url = state
        .storage
        .upload(&final_key, optimized.data, &optimized.content_type)
        .await?;

    let media_type = MediaType::from_content_type(&content_type);
    let media = state
        .media
        .insert(auth.wedding_id, posted_user_name.trim(), &url, media_type)
        .await?;

    state.gallery.refresh().await;

    Ok((StatusCode::CREATED, Json(media)))
}
