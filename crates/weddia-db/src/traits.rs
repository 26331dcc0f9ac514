//! Repository trait abstractions for the worker.
//!
//! These traits define the minimal interface the worker and dispatcher need
//! from the repositories, allowing tests to substitute in-memory fakes
//! without a database.

use async_trait::async_trait;
use uuid::Uuid;
use weddia_core::models::{JobStatus, Media, MediaType, UploadJob};
use weddia_core::AppError;

use crate::media::MediaRepository;
use crate::upload_jobs::UploadJobRepository;

/// Job mutations performed by the worker and dispatcher.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn get(&self, job_id: Uuid) -> Result<Option<UploadJob>, AppError>;

    async fn mark_processing(&self, job_id: Uuid) -> Result<(), AppError>;

    async fn update_counters(
        &self,
        job_id: Uuid,
        processed_files: i32,
        failed_files: i32,
    ) -> Result<(), AppError>;

    async fn finalize(
        &self,
        job_id: Uuid,
        status: JobStatus,
        error_message: Option<&str>,
    ) -> Result<(), AppError>;
}

/// Media persistence performed by the worker.
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn insert(
        &self,
        wedding_id: Uuid,
        posted_user_name: &str,
        url: &str,
        media_type: MediaType,
    ) -> Result<Media, AppError>;

    async fn exists_by_url(&self, url: &str) -> Result<bool, AppError>;
}

#[async_trait]
impl JobStore for UploadJobRepository {
    async fn get(&self, job_id: Uuid) -> Result<Option<UploadJob>, AppError> {
        UploadJobRepository::get(self, job_id).await
    }

    async fn mark_processing(&self, job_id: Uuid) -> Result<(), AppError> {
        UploadJobRepository::mark_processing(self, job_id).await
    }

    async fn update_counters(
        &self,
        job_id: Uuid,
        processed_files: i32,
        failed_files: i32,
    ) -> Result<(), AppError> {
        UploadJobRepository::update_counters(self, job_id, processed_files, failed_files).await
    }

    async fn finalize(
        &self,
        job_id: Uuid,
        status: JobStatus,
        error_message: Option<&str>,
    ) -> Result<(), AppError> {
        UploadJobRepository::finalize(self, job_id, status, error_message).await
    }
}

#[async_trait]
impl MediaStore for MediaRepository {
    async fn insert(
        &self,
        wedding_id: Uuid,
        posted_user_name: &str,
        url: &str,
        media_type: MediaType,
    ) -> Result<Media, AppError> {
        MediaRepository::insert(self, wedding_id, posted_user_name, url, media_type).await
    }

    async fn exists_by_url(&self, url: &str) -> Result<bool, AppError> {
        MediaRepository::exists_by_url(self, url).await
    }
}
