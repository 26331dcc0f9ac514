//! Job status polling.
//!
//! A watcher polls the status endpoint while the job is pending or processing
//! and emits exactly one terminal event when the job completes or fails.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;
use weddia_core::constants::STATUS_POLL_INTERVAL_SECS;
use weddia_core::models::JobSnapshot;

use crate::ApiClient;

/// Status read used by the watcher; `ApiClient` in production, fakes in tests.
#[async_trait]
pub trait StatusApi: Send + Sync {
    async fn upload_status(&self, job_id: Uuid) -> anyhow::Result<JobSnapshot>;
}

#[async_trait]
impl StatusApi for ApiClient {
    async fn upload_status(&self, job_id: Uuid) -> anyhow::Result<JobSnapshot> {
        ApiClient::upload_status(self, job_id).await
    }
}

#[derive(Debug, Clone)]
pub enum WatchEvent {
    /// A non-terminal snapshot; counters may have advanced.
    Progress(JobSnapshot),
    /// The job reached `completed` or `failed`. Emitted once; the watcher
    /// stops afterwards.
    Terminal(JobSnapshot),
}

pub struct StatusWatcher {
    api: Arc<dyn StatusApi>,
    poll_interval: Duration,
}

impl StatusWatcher {
    pub fn new(api: Arc<dyn StatusApi>) -> Self {
        Self {
            api,
            poll_interval: Duration::from_secs(STATUS_POLL_INTERVAL_SECS),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Spawn a polling task for one job. The returned channel yields progress
    /// events followed by a single terminal event, then closes. Transient poll
    /// errors are logged and retried on the next tick.
    pub fn watch(&self, job_id: Uuid) -> mpsc::Receiver<WatchEvent> {
        let (tx, rx) = mpsc::channel(16);
        let api = Arc::clone(&self.api);
        let poll_interval = self.poll_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            loop {
                ticker.tick().await;
                let snapshot = match api.upload_status(job_id).await {
                    Ok(snapshot) => snapshot,
                    Err(e) => {
                        tracing::warn!(job_id = %job_id, error = %e, "Status poll failed");
                        continue;
                    }
                };

                let terminal = snapshot.status.is_terminal();
                let event = if terminal {
                    WatchEvent::Terminal(snapshot)
                } else {
                    WatchEvent::Progress(snapshot)
                };
                if tx.send(event).await.is_err() {
                    break;
                }
                if terminal {
                    break;
                }
            }
        });

        rx
    }
}
