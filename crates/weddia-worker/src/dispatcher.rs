//! Job hand-off: direct in-process invocation or durable queue publish.

use std::sync::Arc;
use weddia_core::models::{JobDescriptor, JobStatus};
use weddia_core::AppError;
use weddia_db::JobStore;

use crate::processor::JobProcessor;
use crate::queue::MessageQueue;

/// Execution mode, selected from configuration at construction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobTransport {
    /// Invoke the worker immediately in-process (development). The dispatch
    /// call returns before processing completes.
    Direct,
    /// Publish the descriptor to the message queue, which re-invokes the
    /// worker over HTTP with at-least-once delivery (production).
    Queued { retries: u32 },
}

/// Stateless job hand-off. All durable state lives in the upload job row;
/// if the hand-off itself fails the job is forced to `failed` so that no
/// client is ever left polling a job that will never update.
pub struct JobDispatcher {
    transport: JobTransport,
    processor: Arc<JobProcessor>,
    jobs: Arc<dyn JobStore>,
    queue: Option<Arc<dyn MessageQueue>>,
    /// Target of queue callbacks, required in queued mode.
    callback_url: Option<String>,
}

impl JobDispatcher {
    pub fn direct(processor: Arc<JobProcessor>, jobs: Arc<dyn JobStore>) -> Self {
        Self {
            transport: JobTransport::Direct,
            processor,
            jobs,
            queue: None,
            callback_url: None,
        }
    }

    pub fn queued(
        processor: Arc<JobProcessor>,
        jobs: Arc<dyn JobStore>,
        queue: Arc<dyn MessageQueue>,
        callback_url: String,
        retries: u32,
    ) -> Self {
        Self {
            transport: JobTransport::Queued { retries },
            processor,
            jobs,
            queue: Some(queue),
            callback_url: Some(callback_url),
        }
    }

    pub fn transport(&self) -> &JobTransport {
        &self.transport
    }

    /// Hand a freshly created job to a worker. Returns once the hand-off is
    /// durable (queued) or the worker future is spawned (direct).
    pub async fn dispatch(&self, descriptor: &JobDescriptor) -> Result<(), AppError> {
        match self.transport {
            JobTransport::Direct => {
                let processor = Arc::clone(&self.processor);
                let job_id = descriptor.job_id;
                tokio::spawn(async move {
                    if let Err(e) = processor.process_job(job_id).await {
                        tracing::error!(
                            job_id = %job_id,
                            error = %e,
                            "Direct job processing failed"
                        );
                    }
                });
                Ok(())
            }
            JobTransport::Queued { retries } => {
                let queue = self
                    .queue
                    .as_ref()
                    .ok_or_else(|| AppError::Dispatch("No queue configured".to_string()))?;
                let callback_url = self
                    .callback_url
                    .as_deref()
                    .ok_or_else(|| AppError::Dispatch("No callback URL configured".to_string()))?;

                let body = serde_json::to_value(descriptor)?;
                match queue.publish(callback_url, body, retries).await {
                    Ok(message_id) => {
                        tracing::info!(
                            job_id = %descriptor.job_id,
                            message_id = %message_id,
                            "Job dispatched to queue"
                        );
                        Ok(())
                    }
                    Err(e) => {
                        // The job must not stay pending when no worker will
                        // ever run it.
                        let message =
                            format!("Failed to register background processing: {}", e);
                        if let Err(finalize_err) = self
                            .jobs
                            .finalize(descriptor.job_id, JobStatus::Failed, Some(&message))
                            .await
                        {
                            tracing::error!(
                                job_id = %descriptor.job_id,
                                error = %finalize_err,
                                "Failed to mark job failed after dispatch error"
                            );
                        }
                        Err(AppError::Dispatch(message))
                    }
                }
            }
        }
    }
}
