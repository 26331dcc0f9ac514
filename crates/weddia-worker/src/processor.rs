//! The per-job control loop: fetch staged bytes, optimize, promote, record.

use std::fmt;
use std::sync::Arc;
use uuid::Uuid;
use weddia_core::models::{FileMetadata, JobStatus, MediaType, UploadJob};
use weddia_core::AppError;
use weddia_db::{JobStore, MediaStore};
use weddia_processing::{MediaOptimizer, OptimizeError};
use weddia_storage::{keys, Storage};

use crate::hooks::GalleryRefresh;

/// Terminal summary of one worker run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobOutcome {
    pub status: JobStatus,
    pub processed_files: i32,
    pub failed_files: i32,
}

/// Failure of a single file inside a running job. Absorbed and recorded,
/// never propagated past the per-file loop.
enum FileError {
    Fetch(String),
    Decode(String),
    Upload(String),
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileError::Fetch(reason) => write!(f, "failed to fetch staged file: {}", reason),
            FileError::Decode(reason) => write!(f, "failed to decode: {}", reason),
            FileError::Upload(reason) => write!(f, "failed to upload: {}", reason),
        }
    }
}

/// Processes one job per invocation. All collaborators are injected; tests
/// run the full loop against in-memory fakes.
pub struct JobProcessor {
    jobs: Arc<dyn JobStore>,
    media: Arc<dyn MediaStore>,
    storage: Arc<dyn Storage>,
    gallery: Arc<dyn GalleryRefresh>,
}

impl JobProcessor {
    pub fn new(
        jobs: Arc<dyn JobStore>,
        media: Arc<dyn MediaStore>,
        storage: Arc<dyn Storage>,
        gallery: Arc<dyn GalleryRefresh>,
    ) -> Self {
        Self {
            jobs,
            media,
            storage,
            gallery,
        }
    }

    /// Worker entry point. Runs the job to a terminal state; every file in
    /// `file_metadata` is attempted exactly once, in order.
    #[tracing::instrument(skip(self), fields(job_id = %job_id, operation = "process_job"))]
    pub async fn process_job(&self, job_id: Uuid) -> Result<JobOutcome, AppError> {
        let job = self
            .jobs
            .get(job_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Upload job {} not found", job_id)))?;

        // At-least-once delivery can re-invoke a job that already finished,
        // after its staged copies were deleted. The terminal record stands;
        // rerunning would count every file as a fetch failure.
        if job.status.is_terminal() {
            tracing::info!(
                job_id = %job_id,
                status = %job.status,
                "Job already terminal, nothing to do"
            );
            return Ok(JobOutcome {
                status: job.status,
                processed_files: job.processed_files,
                failed_files: job.failed_files,
            });
        }

        // Mark processing before touching any file, so a crash mid-run reads
        // as "in progress, possibly stalled" rather than "never started".
        self.jobs.mark_processing(job_id).await?;

        let mut processed_files = 0i32;
        let mut failed_files = 0i32;
        let mut errors: Vec<String> = Vec::new();

        for file in &job.file_metadata {
            match self.process_file(&job, file).await {
                Ok(()) => {
                    processed_files += 1;
                    tracing::info!(
                        job_id = %job_id,
                        file_name = %file.file_name,
                        "File processed"
                    );
                }
                Err(reason) => {
                    failed_files += 1;
                    errors.push(format!("{}: {}", file.file_name, reason));
                    tracing::warn!(
                        job_id = %job_id,
                        file_name = %file.file_name,
                        error = %reason,
                        "File failed"
                    );
                    self.delete_temp_best_effort(&file.temp_key).await;
                }
            }

            // Persist counters after every attempt so status is observable mid-run.
            self.jobs
                .update_counters(job_id, processed_files, failed_files)
                .await?;
        }

        let status = if failed_files == job.total_files {
            JobStatus::Failed
        } else {
            JobStatus::Completed
        };
        let error_message = if errors.is_empty() {
            None
        } else {
            Some(errors.join("\n"))
        };

        self.jobs
            .finalize(job_id, status, error_message.as_deref())
            .await?;

        tracing::info!(
            job_id = %job_id,
            status = %status,
            processed_files = processed_files,
            failed_files = failed_files,
            "Job finished"
        );

        self.gallery.refresh().await;

        Ok(JobOutcome {
            status,
            processed_files,
            failed_files,
        })
    }

    /// One file's optimize-and-promote step. Any error is a per-file failure.
    async fn process_file(&self, job: &UploadJob, file: &FileMetadata) -> Result<(), FileError> {
        let staged = self
            .storage
            .download(&file.temp_key)
            .await
            .map_err(|e| FileError::Fetch(e.to_string()))?;

        let optimized = MediaOptimizer::optimize(staged, &file.content_type, &file.file_name)
            .map_err(|e| match e {
                OptimizeError::Decode { reason, .. } => FileError::Decode(reason),
                OptimizeError::Encode { reason, .. } => FileError::Upload(reason),
            })?;

        // The optimizer may change the output format; the final key's
        // extension must follow it.
        let final_key = keys::replace_extension(&file.storage_key, &optimized.extension);

        let url = self
            .storage
            .upload(&final_key, optimized.data, &optimized.content_type)
            .await
            .map_err(|e| FileError::Upload(e.to_string()))?;

        self.delete_temp_best_effort(&file.temp_key).await;

        // Re-invocation safety: a redelivered job may revisit a file that
        // already produced a media row. Skip the insert, keep the success.
        let already_recorded = self
            .media
            .exists_by_url(&url)
            .await
            .map_err(|e| FileError::Upload(e.to_string()))?;
        if already_recorded {
            tracing::info!(
                job_id = %job.id,
                file_name = %file.file_name,
                "Media row already exists, skipping insert"
            );
            return Ok(());
        }

        let media_type = MediaType::from_content_type(&file.content_type);
        self.media
            .insert(job.wedding_id, &job.posted_user_name, &url, media_type)
            .await
            .map_err(|e| FileError::Upload(e.to_string()))?;

        Ok(())
    }

    /// Staged copies are garbage after promotion or failure; deletion failures
    /// are logged and never affect file or job outcome.
    async fn delete_temp_best_effort(&self, temp_key: &str) {
        if let Err(e) = self.storage.delete(temp_key).await {
            tracing::warn!(
                temp_key = %temp_key,
                error = %e,
                "Failed to delete staged object"
            );
        }
    }
}
