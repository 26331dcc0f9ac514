//! Domain methods for the Weddia API client.
//!
//! Response shapes mirror the server handlers; job and media models are
//! re-used from `weddia_core::models`.

use crate::uploader::UploadFile;
use crate::ApiClient;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use weddia_core::models::{FileMetadata, JobSnapshot, Media};

/// Response of both the initiate and complete endpoints: the registered job.
#[derive(Debug, Serialize, Deserialize)]
pub struct InitiateUploadResponse {
    pub job_id: Uuid,
    pub status: String,
    pub total_files: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PresignedUploadResponse {
    pub uploads: Vec<PresignedUpload>,
    pub expires_in_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresignedUpload {
    pub file_name: String,
    pub content_type: String,
    pub size: i64,
    pub storage_key: String,
    pub temp_key: String,
    pub upload_url: String,
}

/// Single published media item, as returned by POST /api/media.
pub type MediaResponse = Media;

#[derive(Debug, Serialize, Deserialize)]
pub struct MediaListResponse {
    pub media: Vec<Media>,
    pub gallery_version: u64,
}

#[derive(Debug, Serialize)]
struct DeclaredFile<'a> {
    file_name: &'a str,
    content_type: &'a str,
    size: i64,
}

impl ApiClient {
    /// Server-proxied bulk upload: send the raw files, receive a job id.
    pub async fn initiate_upload(
        &self,
        posted_user_name: &str,
        files: &[UploadFile],
    ) -> Result<InitiateUploadResponse> {
        let mut form = reqwest::multipart::Form::new()
            .text("posted_user_name", posted_user_name.to_string());
        for file in files {
            let part = reqwest::multipart::Part::bytes(file.data.clone())
                .file_name(file.file_name.clone())
                .mime_str(&file.content_type)
                .with_context(|| format!("Invalid content type for {}", file.file_name))?;
            form = form.part("files", part);
        }
        self.post_multipart("/api/upload/initiate", form).await
    }

    /// Declare a batch and receive presigned PUT URLs targeting staging keys.
    pub async fn request_presigned(
        &self,
        files: &[UploadFile],
    ) -> Result<PresignedUploadResponse> {
        let declared: Vec<DeclaredFile<'_>> = files
            .iter()
            .map(|f| DeclaredFile {
                file_name: &f.file_name,
                content_type: &f.content_type,
                size: f.data.len() as i64,
            })
            .collect();
        self.post_json(
            "/api/upload/presigned",
            &serde_json::json!({ "files": declared }),
        )
        .await
    }

    /// PUT one file's bytes to a presigned staging URL.
    pub async fn put_presigned(
        &self,
        upload_url: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<()> {
        let response = self
            .client()
            .put(upload_url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await
            .context("Failed to send staged upload")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow::anyhow!(
                "Staged upload failed with status {}: {}",
                status,
                error_text
            ));
        }
        Ok(())
    }

    /// Register the job for a fully staged batch.
    pub async fn complete_upload(
        &self,
        posted_user_name: &str,
        files: &[FileMetadata],
    ) -> Result<InitiateUploadResponse> {
        self.post_json(
            "/api/upload/complete",
            &serde_json::json!({
                "posted_user_name": posted_user_name,
                "files": files,
            }),
        )
        .await
    }

    /// Poll the status of an upload job.
    pub async fn upload_status(&self, job_id: Uuid) -> Result<JobSnapshot> {
        self.get("/api/upload/status", &[("job_id", job_id.to_string())])
            .await
    }

    /// Synchronous single-file upload; the media row exists when this returns.
    pub async fn upload_media(
        &self,
        posted_user_name: &str,
        file: &UploadFile,
    ) -> Result<MediaResponse> {
        let part = reqwest::multipart::Part::bytes(file.data.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)
            .with_context(|| format!("Invalid content type for {}", file.file_name))?;
        let form = reqwest::multipart::Form::new()
            .text("posted_user_name", posted_user_name.to_string())
            .part("file", part);
        self.post_multipart("/api/media", form).await
    }

    /// Fetch the wedding gallery, newest first.
    pub async fn list_media(&self) -> Result<MediaListResponse> {
        self.get("/api/media", &[]).await
    }
}
