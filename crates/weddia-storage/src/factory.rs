use crate::{LocalStorage, S3Storage, Storage, StorageError, StorageResult};
use weddia_core::Config;
use std::sync::Arc;

/// Create a storage backend based on configuration
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    match config.storage_backend.as_str() {
        "s3" => {
            let bucket = config
                .s3_bucket
                .clone()
                .ok_or_else(|| StorageError::ConfigError("S3_BUCKET not configured".to_string()))?;
            let region = config
                .s3_region
                .clone()
                .unwrap_or_else(|| "auto".to_string());
            let storage = S3Storage::new(
                bucket,
                region,
                config.s3_endpoint.clone(),
                config.s3_public_base_url.clone(),
            )
            .await?;
            Ok(Arc::new(storage))
        }
        "local" => {
            let base_path = config.local_storage_path.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
            })?;
            let base_url = config
                .local_storage_base_url
                .clone()
                .unwrap_or_else(|| format!("http://localhost:{}/media", config.server_port));
            let storage = LocalStorage::new(base_path, base_url).await?;
            Ok(Arc::new(storage))
        }
        other => Err(StorageError::ConfigError(format!(
            "Unknown storage backend: {}",
            other
        ))),
    }
}
