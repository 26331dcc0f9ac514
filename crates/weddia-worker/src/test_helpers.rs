//! In-memory fakes for worker and dispatcher tests.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;
use weddia_core::models::{FileMetadata, JobStatus, Media, MediaType, UploadJob};
use weddia_core::AppError;
use weddia_db::{JobStore, MediaStore};
use weddia_storage::{Storage, StorageBackend, StorageError, StorageResult};

use crate::queue::{MessageQueue, QueueError};

/// Mock storage backend that keeps objects in memory.
pub struct MockStorage {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    /// Keys whose uploads should fail, for error-path tests.
    failing_uploads: Arc<Mutex<Vec<String>>>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(HashMap::new())),
            failing_uploads: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set a file in the mock storage
    pub fn set_file(&self, key: &str, data: Vec<u8>) {
        self.files.lock().unwrap().insert(key.to_string(), data);
    }

    /// Check if a file exists in the mock storage
    pub fn has_file(&self, key: &str) -> bool {
        self.files.lock().unwrap().contains_key(key)
    }

    /// Get file data (for test assertions)
    pub fn get_file(&self, key: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(key).cloned()
    }

    /// Make future uploads to `key` fail.
    pub fn fail_uploads_to(&self, key: &str) {
        self.failing_uploads.lock().unwrap().push(key.to_string());
    }
}

impl Default for MockStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn upload(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> StorageResult<String> {
        let failing = self.failing_uploads.lock().unwrap();
        if failing.iter().any(|k| storage_key.starts_with(k.as_str())) {
            return Err(StorageError::UploadFailed("simulated failure".to_string()));
        }
        drop(failing);
        self.files
            .lock()
            .unwrap()
            .insert(storage_key.to_string(), data);
        Ok(format!("https://media.example.com/{}", storage_key))
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(storage_key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(storage_key.to_string()))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        self.files
            .lock()
            .unwrap()
            .remove(storage_key)
            .ok_or_else(|| StorageError::NotFound(storage_key.to_string()))?;
        Ok(())
    }

    async fn get_presigned_url(
        &self,
        storage_key: &str,
        _expires_in: Duration,
    ) -> StorageResult<String> {
        if !self.has_file(storage_key) {
            return Err(StorageError::NotFound(storage_key.to_string()));
        }
        Ok(format!("https://media.example.com/presigned/{}", storage_key))
    }

    async fn presigned_put_url(
        &self,
        storage_key: &str,
        _content_type: &str,
        _expires_in: Duration,
    ) -> StorageResult<String> {
        Ok(format!("https://media.example.com/put/{}", storage_key))
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        Ok(self.has_file(storage_key))
    }

    async fn sweep_stale_temp(&self, _older_than: Duration) -> StorageResult<usize> {
        let mut files = self.files.lock().unwrap();
        let stale: Vec<String> = files
            .keys()
            .filter(|k| k.starts_with("temp/"))
            .cloned()
            .collect();
        for key in &stale {
            files.remove(key);
        }
        Ok(stale.len())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

/// In-memory job store tracking every counter write, so tests can assert
/// that progress is persisted after each file attempt.
pub struct MockJobStore {
    jobs: Mutex<HashMap<Uuid, UploadJob>>,
    pub counter_writes: Mutex<Vec<(i32, i32)>>,
}

impl MockJobStore {
    pub fn new() -> Self {
        Self {
            jobs: Mutex::new(HashMap::new()),
            counter_writes: Mutex::new(Vec::new()),
        }
    }

    pub fn put_job(&self, job: UploadJob) {
        self.jobs.lock().unwrap().insert(job.id, job);
    }

    pub fn job(&self, job_id: Uuid) -> Option<UploadJob> {
        self.jobs.lock().unwrap().get(&job_id).cloned()
    }
}

impl Default for MockJobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobStore for MockJobStore {
    async fn get(&self, job_id: Uuid) -> Result<Option<UploadJob>, AppError> {
        Ok(self.jobs.lock().unwrap().get(&job_id).cloned())
    }

    async fn mark_processing(&self, job_id: Uuid) -> Result<(), AppError> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs
            .get_mut(&job_id)
            .ok_or_else(|| AppError::NotFound(job_id.to_string()))?;
        job.status = JobStatus::Processing;
        job.updated_at = Utc::now();
        Ok(())
    }

    async fn update_counters(
        &self,
        job_id: Uuid,
        processed_files: i32,
        failed_files: i32,
    ) -> Result<(), AppError> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs
            .get_mut(&job_id)
            .ok_or_else(|| AppError::NotFound(job_id.to_string()))?;
        job.processed_files = processed_files;
        job.failed_files = failed_files;
        job.updated_at = Utc::now();
        self.counter_writes
            .lock()
            .unwrap()
            .push((processed_files, failed_files));
        Ok(())
    }

    async fn finalize(
        &self,
        job_id: Uuid,
        status: JobStatus,
        error_message: Option<&str>,
    ) -> Result<(), AppError> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs
            .get_mut(&job_id)
            .ok_or_else(|| AppError::NotFound(job_id.to_string()))?;
        job.status = status;
        job.error_message = error_message.map(String::from);
        job.completed_at = Some(Utc::now());
        job.updated_at = Utc::now();
        Ok(())
    }
}

/// In-memory media store.
pub struct MockMediaStore {
    rows: Mutex<Vec<Media>>,
}

impl MockMediaStore {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
        }
    }

    pub fn rows(&self) -> Vec<Media> {
        self.rows.lock().unwrap().clone()
    }
}

impl Default for MockMediaStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaStore for MockMediaStore {
    async fn insert(
        &self,
        wedding_id: Uuid,
        posted_user_name: &str,
        url: &str,
        media_type: MediaType,
    ) -> Result<Media, AppError> {
        let media = Media {
            id: Uuid::new_v4(),
            wedding_id,
            posted_user_name: posted_user_name.to_string(),
            url: url.to_string(),
            media_type,
            posted_at: Utc::now(),
            deleted_at: None,
        };
        self.rows.lock().unwrap().push(media.clone());
        Ok(media)
    }

    async fn exists_by_url(&self, url: &str) -> Result<bool, AppError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .any(|m| m.url == url && m.deleted_at.is_none()))
    }
}

/// Queue fake recording publishes; can be switched to fail.
pub struct MockQueue {
    pub published: Mutex<Vec<(String, serde_json::Value, u32)>>,
    fail: Mutex<bool>,
}

impl MockQueue {
    pub fn new() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            fail: Mutex::new(false),
        }
    }

    pub fn fail_next_publish(&self) {
        *self.fail.lock().unwrap() = true;
    }
}

impl Default for MockQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageQueue for MockQueue {
    async fn publish(
        &self,
        target_url: &str,
        body: serde_json::Value,
        retries: u32,
    ) -> Result<String, QueueError> {
        if *self.fail.lock().unwrap() {
            return Err(QueueError::PublishFailed("simulated outage".to_string()));
        }
        self.published
            .lock()
            .unwrap()
            .push((target_url.to_string(), body, retries));
        Ok(format!("msg_{}", Uuid::new_v4()))
    }
}

/// Build a pending job plus its staged bytes in the given storage.
pub fn stage_job(
    storage: &MockStorage,
    files: Vec<(&str, &str, Vec<u8>)>,
) -> (UploadJob, Vec<FileMetadata>) {
    let wedding_id = Uuid::new_v4();
    let mut metadata = Vec::new();

    for (file_name, content_type, data) in files {
        let keys = weddia_storage::derive_keys(&wedding_id.to_string(), file_name);
        storage.set_file(&keys.temp_key, data.clone());
        metadata.push(FileMetadata {
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            size: data.len() as i64,
            storage_key: keys.storage_key,
            temp_key: keys.temp_key,
        });
    }

    let job = UploadJob {
        id: Uuid::new_v4(),
        wedding_id,
        user_id: Uuid::new_v4(),
        posted_user_name: "Alice".to_string(),
        total_files: metadata.len() as i32,
        processed_files: 0,
        failed_files: 0,
        status: JobStatus::Pending,
        file_metadata: metadata.clone(),
        error_message: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
        completed_at: None,
    };

    (job, metadata)
}
