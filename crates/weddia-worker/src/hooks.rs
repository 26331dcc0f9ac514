//! Downstream hooks invoked by the worker.

use async_trait::async_trait;

/// Cache invalidation signal for the published gallery view.
///
/// Invoked once per finished job. Implementations live outside the pipeline
/// (the API bumps its gallery cache version); failures are the implementor's
/// concern and must not propagate into job processing.
#[async_trait]
pub trait GalleryRefresh: Send + Sync {
    async fn refresh(&self);
}

/// Hook used when no gallery cache exists (tests, standalone worker runs).
pub struct NoopGalleryRefresh;

#[async_trait]
impl GalleryRefresh for NoopGalleryRefresh {
    async fn refresh(&self) {}
}
