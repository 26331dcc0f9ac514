//! Client-side upload orchestration.
//!
//! Small batches are published synchronously, one request per file; batches at
//! or above the background threshold take the staged path: presign, PUT each
//! file directly to storage, then register the job with one completion call.
//! All validation happens before any network I/O.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;
use weddia_core::constants::{
    is_allowed_content_type, BACKGROUND_UPLOAD_THRESHOLD, MAX_FILE_SIZE_BYTES,
};
use weddia_core::models::{FileMetadata, Media};

use crate::api::{InitiateUploadResponse, PresignedUploadResponse};
use crate::ApiClient;

/// One file selected for upload, fully buffered.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Validation error: {0}")]
    Validation(String),

    /// A file could not be staged; no job was registered.
    #[error("Staging failed for {file_name}: {reason}")]
    Staging { file_name: String, reason: String },

    /// Every file is staged but the job could not be registered. The staged
    /// copies remain in storage until the server-side sweep reclaims them.
    #[error("Completion registration failed: {0}")]
    CompletionRegistration(String),

    #[error("API error: {0}")]
    Api(String),
}

/// How a batch ended up on the server.
#[derive(Debug)]
pub enum UploadOutcome {
    /// Synchronous path: every file is already published.
    Published(Vec<Media>),
    /// Staged path: a background job owns the batch; poll it for progress.
    JobRegistered { job_id: Uuid, total_files: usize },
}

/// The API surface the orchestrator needs. `ApiClient` is the production
/// implementation; tests substitute a fake.
#[async_trait]
pub trait UploadApi: Send + Sync {
    async fn upload_media(
        &self,
        posted_user_name: &str,
        file: &UploadFile,
    ) -> anyhow::Result<Media>;

    async fn request_presigned(
        &self,
        files: &[UploadFile],
    ) -> anyhow::Result<PresignedUploadResponse>;

    async fn put_presigned(
        &self,
        upload_url: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> anyhow::Result<()>;

    async fn complete_upload(
        &self,
        posted_user_name: &str,
        files: &[FileMetadata],
    ) -> anyhow::Result<InitiateUploadResponse>;
}

#[async_trait]
impl UploadApi for ApiClient {
    async fn upload_media(
        &self,
        posted_user_name: &str,
        file: &UploadFile,
    ) -> anyhow::Result<Media> {
        ApiClient::upload_media(self, posted_user_name, file).await
    }

    async fn request_presigned(
        &self,
        files: &[UploadFile],
    ) -> anyhow::Result<PresignedUploadResponse> {
        ApiClient::request_presigned(self, files).await
    }

    async fn put_presigned(
        &self,
        upload_url: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> anyhow::Result<()> {
        ApiClient::put_presigned(self, upload_url, content_type, data).await
    }

    async fn complete_upload(
        &self,
        posted_user_name: &str,
        files: &[FileMetadata],
    ) -> anyhow::Result<InitiateUploadResponse> {
        ApiClient::complete_upload(self, posted_user_name, files).await
    }
}

/// Progress callback: (files done, files total).
pub type ProgressFn = Box<dyn Fn(usize, usize) + Send + Sync>;

pub struct UploadOrchestrator {
    api: Arc<dyn UploadApi>,
    background_threshold: usize,
    max_file_size_bytes: usize,
    progress: Option<ProgressFn>,
}

impl UploadOrchestrator {
    pub fn new(api: Arc<dyn UploadApi>) -> Self {
        Self {
            api,
            background_threshold: BACKGROUND_UPLOAD_THRESHOLD,
            max_file_size_bytes: MAX_FILE_SIZE_BYTES,
            progress: None,
        }
    }

    pub fn with_background_threshold(mut self, threshold: usize) -> Self {
        self.background_threshold = threshold;
        self
    }

    pub fn with_max_file_size(mut self, bytes: usize) -> Self {
        self.max_file_size_bytes = bytes;
        self
    }

    pub fn on_progress(mut self, callback: ProgressFn) -> Self {
        self.progress = Some(callback);
        self
    }

    fn report_progress(&self, done: usize, total: usize) {
        if let Some(callback) = &self.progress {
            callback(done, total);
        }
    }

    fn validate(&self, posted_user_name: &str, files: &[UploadFile]) -> Result<(), UploadError> {
        if posted_user_name.trim().is_empty() {
            return Err(UploadError::Validation(
                "Display name must not be empty".to_string(),
            ));
        }
        if files.is_empty() {
            return Err(UploadError::Validation("No files selected".to_string()));
        }
        for file in files {
            if file.file_name.trim().is_empty() {
                return Err(UploadError::Validation(
                    "File name must not be empty".to_string(),
                ));
            }
            if !is_allowed_content_type(&file.content_type) {
                return Err(UploadError::Validation(format!(
                    "Unsupported file type {} for {}",
                    file.content_type, file.file_name
                )));
            }
            if file.data.len() > self.max_file_size_bytes {
                return Err(UploadError::Validation(format!(
                    "{} exceeds the maximum file size of {} MB",
                    file.file_name,
                    self.max_file_size_bytes / 1024 / 1024
                )));
            }
        }
        Ok(())
    }

    /// Upload a batch, choosing the path by batch size.
    pub async fn upload(
        &self,
        posted_user_name: &str,
        files: Vec<UploadFile>,
    ) -> Result<UploadOutcome, UploadError> {
        self.validate(posted_user_name, &files)?;

        if files.len() < self.background_threshold {
            self.upload_sync(posted_user_name, files).await
        } else {
            self.upload_staged(posted_user_name, files).await
        }
    }

    async fn upload_sync(
        &self,
        posted_user_name: &str,
        files: Vec<UploadFile>,
    ) -> Result<UploadOutcome, UploadError> {
        let total = files.len();
        let mut published = Vec::with_capacity(total);
        for (index, file) in files.iter().enumerate() {
            let media = self
                .api
                .upload_media(posted_user_name, file)
                .await
                .map_err(|e| UploadError::Api(e.to_string()))?;
            published.push(media);
            self.report_progress(index + 1, total);
        }
        Ok(UploadOutcome::Published(published))
    }

    async fn upload_staged(
        &self,
        posted_user_name: &str,
        files: Vec<UploadFile>,
    ) -> Result<UploadOutcome, UploadError> {
        let total = files.len();
        let presigned = self
            .api
            .request_presigned(&files)
            .await
            .map_err(|e| UploadError::Api(e.to_string()))?;

        if presigned.uploads.len() != total {
            return Err(UploadError::Api(format!(
                "Presign returned {} targets for {} files",
                presigned.uploads.len(),
                total
            )));
        }

        // Uploads come back in request order; stage each file at its target.
        let mut file_metadata = Vec::with_capacity(total);
        for (index, (file, target)) in files.iter().zip(presigned.uploads.iter()).enumerate() {
            self.api
                .put_presigned(&target.upload_url, &file.content_type, file.data.clone())
                .await
                .map_err(|e| UploadError::Staging {
                    file_name: file.file_name.clone(),
                    reason: e.to_string(),
                })?;
            self.report_progress(index + 1, total);
            file_metadata.push(FileMetadata {
                file_name: target.file_name.clone(),
                content_type: file.content_type.clone(),
                size: file.data.len() as i64,
                storage_key: target.storage_key.clone(),
                temp_key: target.temp_key.clone(),
            });
        }

        let response = self
            .api
            .complete_upload(posted_user_name, &file_metadata)
            .await
            .map_err(|e| UploadError::CompletionRegistration(e.to_string()))?;

        tracing::info!(
            job_id = %response.job_id,
            total_files = response.total_files,
            "Upload job registered"
        );

        Ok(UploadOutcome::JobRegistered {
            job_id: response.job_id,
            total_files: response.total_files,
        })
    }
}
