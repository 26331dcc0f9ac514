//! Route table and middleware layers.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use weddia_core::Config;

use crate::handlers;
use crate::state::AppState;

const BODY_LIMIT_SLACK_BYTES: usize = 1024 * 1024;

pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Server-proxied batches carry several files in one body; the presigned
    // path is preferred for large batches but this route must still hold a
    // full threshold-sized batch.
    let batch_body_limit = config.max_file_size_bytes * config.background_upload_threshold.max(1)
        + BODY_LIMIT_SLACK_BYTES;
    let single_body_limit = config.max_file_size_bytes + BODY_LIMIT_SLACK_BYTES;

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(
            "/api/jobs/process",
            post(handlers::process_job::process_job),
        )
        .route(
            "/api/upload/initiate",
            post(handlers::upload_initiate::initiate_upload)
                .layer(DefaultBodyLimit::max(batch_body_limit)),
        )
        .route(
            "/api/upload/presigned",
            post(handlers::upload_presigned::presigned_upload),
        )
        .route(
            "/api/upload/complete",
            post(handlers::upload_complete::complete_upload),
        )
        .route(
            "/api/upload/status",
            get(handlers::upload_status::upload_status),
        )
        .route(
            "/api/media",
            post(handlers::media_upload::upload_media)
                .get(handlers::media_list::list_media)
                .layer(DefaultBodyLimit::max(single_body_limit)),
        )
        .layer(ConcurrencyLimitLayer::new(config.http_concurrency_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
