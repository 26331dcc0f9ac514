//! Application setup and initialization, extracted from main.rs.

pub mod database;
pub mod routes;
pub mod server;
pub mod services;

use crate::state::AppState;
use anyhow::{Context, Result};
use std::sync::Arc;
use weddia_core::Config;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Fail fast on misconfiguration
    config
        .validate()
        .context("Configuration validation failed")?;

    crate::telemetry::init_telemetry();

    tracing::info!(
        environment = %config.environment,
        storage_backend = %config.storage_backend,
        job_transport = %config.job_transport,
        "Configuration loaded and validated"
    );

    let pool = database::setup_database(&config).await?;

    let storage = weddia_storage::create_storage(&config)
        .await
        .context("Failed to initialize storage backend")?;

    let state = services::initialize_services(&config, pool, storage)?;

    let router = routes::setup_routes(&config, state.clone());

    Ok((state, router))
}
