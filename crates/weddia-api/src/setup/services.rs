//! Service and repository wiring.

use anyhow::{bail, Result};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use weddia_core::Config;
use weddia_db::{JobStore, MediaRepository, MediaStore, UploadJobRepository};
use weddia_storage::Storage;
use weddia_worker::{HttpQueue, JobDispatcher, JobProcessor, MessageQueue};

use crate::state::{AppState, GalleryCache};

/// Build repositories, the worker, and the dispatcher into shared state.
pub fn initialize_services(
    config: &Config,
    pool: PgPool,
    storage: Arc<dyn Storage>,
) -> Result<Arc<AppState>> {
    let jobs = UploadJobRepository::new(pool.clone());
    let media = MediaRepository::new(pool.clone());
    let gallery = Arc::new(GalleryCache::new());

    let job_store: Arc<dyn JobStore> = Arc::new(jobs.clone());
    let media_store: Arc<dyn MediaStore> = Arc::new(media.clone());

    let processor = Arc::new(JobProcessor::new(
        Arc::clone(&job_store),
        media_store,
        Arc::clone(&storage),
        gallery.clone(),
    ));

    let dispatcher = match config.job_transport.as_str() {
        "direct" => JobDispatcher::direct(Arc::clone(&processor), job_store),
        "queued" => {
            let (Some(publish_url), Some(token), Some(callback_url)) = (
                config.queue_publish_url.clone(),
                config.queue_token.clone(),
                config.worker_callback_url.clone(),
            ) else {
                bail!("Queued transport requires QUEUE_PUBLISH_URL, QUEUE_TOKEN and WORKER_CALLBACK_URL");
            };
            let queue: Arc<dyn MessageQueue> = Arc::new(HttpQueue::new(
                publish_url,
                token,
                Duration::from_secs(config.queue_timeout_seconds),
            ));
            JobDispatcher::queued(
                Arc::clone(&processor),
                job_store,
                queue,
                callback_url,
                config.queue_retries,
            )
        }
        other => bail!("Invalid JOB_TRANSPORT: {}", other),
    };

    tracing::info!(
        transport = %config.job_transport,
        "Services initialized"
    );

    Ok(Arc::new(AppState {
        config: config.clone(),
        pool,
        storage,
        jobs,
        media,
        processor,
        dispatcher,
        gallery,
    }))
}
