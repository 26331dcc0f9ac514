use crate::traits::{Storage, StorageBackend, StorageError, StorageResult};
use crate::TEMP_PREFIX;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage implementation (development and tests)
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/weddia/media")
    /// * `base_url` - Base URL for serving files (e.g., "http://localhost:4000/media")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
        })
    }

    /// Convert a storage key to a filesystem path, rejecting keys that would
    /// escape the base storage directory.
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        if storage_key.contains("..") || storage_key.starts_with('/') {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }
        Ok(self.base_path.join(storage_key))
    }

    fn generate_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::UploadFailed(format!("Failed to create directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Recursively delete regular files under `dir` modified before `cutoff`.
    async fn sweep_dir(&self, dir: PathBuf, cutoff: SystemTime) -> StorageResult<usize> {
        let mut removed = 0usize;
        let mut stack = vec![dir];

        while let Some(current) = stack.pop() {
            let mut entries = match fs::read_dir(&current).await {
                Ok(entries) => entries,
                Err(_) => continue,
            };
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(StorageError::IoError)?
            {
                let path = entry.path();
                let metadata = entry.metadata().await.map_err(StorageError::IoError)?;
                if metadata.is_dir() {
                    stack.push(path);
                    continue;
                }
                let modified = metadata.modified().map_err(StorageError::IoError)?;
                if modified >= cutoff {
                    continue;
                }
                match fs::remove_file(&path).await {
                    Ok(()) => removed += 1,
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            path = %path.display(),
                            "Failed to delete stale staged file"
                        );
                    }
                }
            }
        }

        Ok(removed)
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> StorageResult<String> {
        let path = self.key_to_path(storage_key)?;
        self.ensure_parent_dir(&path).await?;

        let size = data.len() as u64;
        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path)
            .await
            .map_err(|e| StorageError::UploadFailed(format!("Failed to create file: {}", e)))?;
        file.write_all(&data)
            .await
            .map_err(|e| StorageError::UploadFailed(format!("Failed to write file: {}", e)))?;
        file.flush()
            .await
            .map_err(|e| StorageError::UploadFailed(format!("Failed to flush file: {}", e)))?;

        tracing::info!(
            key = %storage_key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local upload successful"
        );

        Ok(self.generate_url(storage_key))
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        let path = self.key_to_path(storage_key)?;

        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(storage_key.to_string()))
            }
            Err(e) => Err(StorageError::DownloadFailed(e.to_string())),
        }
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let path = self.key_to_path(storage_key)?;

        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(storage_key.to_string()))
            }
            Err(e) => Err(StorageError::DeleteFailed(e.to_string())),
        }
    }

    async fn get_presigned_url(
        &self,
        storage_key: &str,
        _expires_in: Duration,
    ) -> StorageResult<String> {
        // Local files are served directly; there is nothing to sign.
        if !self.exists(storage_key).await? {
            return Err(StorageError::NotFound(storage_key.to_string()));
        }
        Ok(self.generate_url(storage_key))
    }

    async fn presigned_put_url(
        &self,
        _storage_key: &str,
        _content_type: &str,
        _expires_in: Duration,
    ) -> StorageResult<String> {
        Err(StorageError::ConfigError(
            "Presigned PUT URLs are not supported by local storage".to_string(),
        ))
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(storage_key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    async fn sweep_stale_temp(&self, older_than: Duration) -> StorageResult<usize> {
        let cutoff = SystemTime::now()
            .checked_sub(older_than)
            .ok_or_else(|| StorageError::BackendError("Invalid sweep cutoff".to_string()))?;
        let temp_root = self.base_path.join(TEMP_PREFIX.trim_end_matches('/'));
        let removed = self.sweep_dir(temp_root, cutoff).await?;

        tracing::info!(removed = removed, "Stale temp sweep finished");
        Ok(removed)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn storage() -> (TempDir, LocalStorage) {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path(), "http://localhost:4000/media".to_string())
            .await
            .unwrap();
        (dir, storage)
    }

    #[tokio::test]
    async fn upload_download_round_trip() {
        let (_dir, storage) = storage().await;
        let data = b"wedding photo bytes".to_vec();

        let url = storage
            .upload("weddings/w1/1_abc.jpg", data.clone(), "image/jpeg")
            .await
            .unwrap();
        assert_eq!(url, "http://localhost:4000/media/weddings/w1/1_abc.jpg");

        let downloaded = storage.download("weddings/w1/1_abc.jpg").await.unwrap();
        assert_eq!(downloaded, data);
    }

    #[tokio::test]
    async fn staged_object_round_trip_is_byte_identical() {
        let (_dir, storage) = storage().await;
        let data: Vec<u8> = (0..=255).collect();

        storage
            .upload("temp/weddings/w1/2_def.png", data.clone(), "image/png")
            .await
            .unwrap();
        let staged = storage.download("temp/weddings/w1/2_def.png").await.unwrap();
        assert_eq!(staged, data);
    }

    #[tokio::test]
    async fn path_traversal_rejected() {
        let (_dir, storage) = storage().await;

        let result = storage.download("../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage
            .upload("/absolute/key", b"x".to_vec(), "image/jpeg")
            .await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn delete_nonexistent_returns_not_found() {
        let (_dir, storage) = storage().await;
        let result = storage.delete("weddings/w1/missing.jpg").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn exists_reflects_uploads_and_deletes() {
        let (_dir, storage) = storage().await;
        assert!(!storage.exists("weddings/w1/3_ghi.jpg").await.unwrap());

        storage
            .upload("weddings/w1/3_ghi.jpg", b"x".to_vec(), "image/jpeg")
            .await
            .unwrap();
        assert!(storage.exists("weddings/w1/3_ghi.jpg").await.unwrap());

        storage.delete("weddings/w1/3_ghi.jpg").await.unwrap();
        assert!(!storage.exists("weddings/w1/3_ghi.jpg").await.unwrap());
    }

    #[tokio::test]
    async fn presigned_put_is_unsupported() {
        let (_dir, storage) = storage().await;
        let result = storage
            .presigned_put_url("weddings/w1/4.jpg", "image/jpeg", Duration::from_secs(60))
            .await;
        assert!(matches!(result, Err(StorageError::ConfigError(_))));
    }

    #[tokio::test]
    async fn sweep_removes_only_stale_temp_objects() {
        let (_dir, storage) = storage().await;
        storage
            .upload("temp/weddings/w1/old.jpg", b"old".to_vec(), "image/jpeg")
            .await
            .unwrap();
        storage
            .upload("weddings/w1/final.jpg", b"keep".to_vec(), "image/jpeg")
            .await
            .unwrap();

        // Everything just written is newer than the cutoff.
        let removed = storage
            .sweep_stale_temp(Duration::from_secs(3600))
            .await
            .unwrap();
        assert_eq!(removed, 0);

        // A zero cutoff makes the staged object stale; the final object is untouched.
        let removed = storage.sweep_stale_temp(Duration::ZERO).await.unwrap();
        assert_eq!(removed, 1);
        assert!(!storage.exists("temp/weddings/w1/old.jpg").await.unwrap());
        assert!(storage.exists("weddings/w1/final.jpg").await.unwrap());
    }
}
