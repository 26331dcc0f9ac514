//! Application state shared by all handlers.

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use weddia_core::Config;
use weddia_db::{MediaRepository, UploadJobRepository};
use weddia_storage::Storage;
use weddia_worker::{GalleryRefresh, JobDispatcher, JobProcessor};

/// Monotonic version of the published gallery view. The worker bumps it once
/// per finished job; clients use it to invalidate their cached gallery.
pub struct GalleryCache {
    version: AtomicU64,
}

impl GalleryCache {
    pub fn new() -> Self {
        Self {
            version: AtomicU64::new(0),
        }
    }

    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Relaxed)
    }
}

impl Default for GalleryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GalleryRefresh for GalleryCache {
    async fn refresh(&self) {
        let version = self.version.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(gallery_version = version, "Gallery cache invalidated");
    }
}

pub struct AppState {
    pub config: Config,
    pub pool: PgPool,
    pub storage: Arc<dyn Storage>,
    pub jobs: UploadJobRepository,
    pub media: MediaRepository,
    pub processor: Arc<JobProcessor>,
    pub dispatcher: JobDispatcher,
    pub gallery: Arc<GalleryCache>,
}
