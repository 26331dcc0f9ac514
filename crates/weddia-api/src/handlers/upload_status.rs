//! Job status polling endpoint. Ownership is checked in the repository: a job
//! belonging to another user reads as 403, an unknown job as 404.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use weddia_core::models::JobSnapshot;

use crate::auth::AuthUser;
use crate::error::HttpAppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub job_id: Uuid,
}

#[tracing::instrument(
    skip(state),
    fields(
        user_id = %auth.user_id,
        job_id = %query.job_id,
        operation = "upload_status"
    )
)]
pub async fn upload_status(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<StatusQuery>,
) -> Result<Json<JobSnapshot>, HttpAppError> {
    let snapshot = state.jobs.get_status(query.job_id, auth.user_id).await?;
    Ok(Json(snapshot))
}
