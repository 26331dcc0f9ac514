//! Gallery read: live media for the caller's wedding, newest first.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;
use weddia_core::models::Media;

use crate::auth::AuthUser;
use crate::error::HttpAppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MediaListResponse {
    pub media: Vec<Media>,
    /// Bumped once per finished upload job; clients compare it to decide
    /// whether their cached gallery is stale.
    pub gallery_version: u64,
}

#[tracing::instrument(
    skip(state),
    fields(wedding_id = %auth.wedding_id, operation = "list_media")
)]
pub async fn list_media(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<MediaListResponse>, HttpAppError> {
    let media = state.media.list_for_wedding(auth.wedding_id).await?;
    Ok(Json(MediaListResponse {
        media,
        gallery_version: state.gallery.version(),
    }))
}
