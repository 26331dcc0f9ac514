//! Configuration module
//!
//! Env-driven configuration for the API server, worker, and storage layers.
//! Values come from the process environment (with `.env` support via dotenvy)
//! and fall back to sensible development defaults where safe.

use std::env;

use crate::constants::{
    BACKGROUND_UPLOAD_THRESHOLD, MAX_FILE_SIZE_BYTES, QUEUE_DEFAULT_RETRIES,
    QUEUE_EXECUTION_TIMEOUT_SECS,
};

const DEFAULT_SERVER_PORT: u16 = 4000;
const DEFAULT_HTTP_CONCURRENCY_LIMIT: usize = 10_000;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 20;
const DEFAULT_DB_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    /// Server-level cap on in-flight requests.
    pub http_concurrency_limit: usize,
    pub environment: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub jwt_secret: String,

    // Storage configuration
    /// "s3" or "local"
    pub storage_backend: String,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    /// Custom endpoint for S3-compatible providers (R2, MinIO, etc.)
    pub s3_endpoint: Option<String>,
    pub s3_public_base_url: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,

    // Upload pipeline configuration
    pub max_file_size_bytes: usize,
    pub background_upload_threshold: usize,

    // Job dispatch configuration
    /// "direct" or "queued"
    pub job_transport: String,
    pub queue_publish_url: Option<String>,
    pub queue_token: Option<String>,
    pub queue_signing_key: Option<String>,
    pub queue_retries: u32,
    pub queue_timeout_seconds: u64,
    /// Public URL of the worker callback endpoint, required in queued mode.
    pub worker_callback_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let config = Self {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_SERVER_PORT.to_string())
                .parse()?,
            http_concurrency_limit: env::var("HTTP_CONCURRENCY_LIMIT")
                .unwrap_or_else(|_| DEFAULT_HTTP_CONCURRENCY_LIMIT.to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| DEFAULT_DB_MAX_CONNECTIONS.to_string())
                .parse()?,
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| DEFAULT_DB_TIMEOUT_SECS.to_string())
                .parse()?,
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?,

            storage_backend: env::var("STORAGE_BACKEND").unwrap_or_else(|_| "local".to_string()),
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            s3_public_base_url: env::var("S3_PUBLIC_BASE_URL").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),

            max_file_size_bytes: env::var("MAX_FILE_SIZE_BYTES")
                .unwrap_or_else(|_| MAX_FILE_SIZE_BYTES.to_string())
                .parse()?,
            background_upload_threshold: env::var("BACKGROUND_UPLOAD_THRESHOLD")
                .unwrap_or_else(|_| BACKGROUND_UPLOAD_THRESHOLD.to_string())
                .parse()?,

            job_transport: env::var("JOB_TRANSPORT").unwrap_or_else(|_| "direct".to_string()),
            queue_publish_url: env::var("QUEUE_PUBLISH_URL").ok(),
            queue_token: env::var("QUEUE_TOKEN").ok(),
            queue_signing_key: env::var("QUEUE_SIGNING_KEY").ok(),
            queue_retries: env::var("QUEUE_RETRIES")
                .unwrap_or_else(|_| QUEUE_DEFAULT_RETRIES.to_string())
                .parse()?,
            queue_timeout_seconds: env::var("QUEUE_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| QUEUE_EXECUTION_TIMEOUT_SECS.to_string())
                .parse()?,
            worker_callback_url: env::var("WORKER_CALLBACK_URL").ok(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Fail fast on misconfiguration instead of erroring at first use.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        match self.storage_backend.as_str() {
            "s3" => {
                if self.s3_bucket.is_none() {
                    anyhow::bail!("S3_BUCKET must be set when STORAGE_BACKEND=s3");
                }
                if self.s3_region.is_none() && self.s3_endpoint.is_none() {
                    anyhow::bail!(
                        "S3_REGION or S3_ENDPOINT must be set when STORAGE_BACKEND=s3"
                    );
                }
            }
            "local" => {
                if self.local_storage_path.is_none() {
                    anyhow::bail!("LOCAL_STORAGE_PATH must be set when STORAGE_BACKEND=local");
                }
            }
            other => anyhow::bail!("Invalid STORAGE_BACKEND: {} (expected s3 or local)", other),
        }

        match self.job_transport.as_str() {
            "direct" => {}
            "queued" => {
                if self.queue_publish_url.is_none() {
                    anyhow::bail!("QUEUE_PUBLISH_URL must be set when JOB_TRANSPORT=queued");
                }
                if self.queue_token.is_none() {
                    anyhow::bail!("QUEUE_TOKEN must be set when JOB_TRANSPORT=queued");
                }
                if self.worker_callback_url.is_none() {
                    anyhow::bail!("WORKER_CALLBACK_URL must be set when JOB_TRANSPORT=queued");
                }
            }
            other => anyhow::bail!(
                "Invalid JOB_TRANSPORT: {} (expected direct or queued)",
                other
            ),
        }

        if self.max_file_size_bytes == 0 {
            anyhow::bail!("MAX_FILE_SIZE_BYTES must be greater than zero");
        }
        if self.background_upload_threshold == 0 {
            anyhow::bail!("BACKGROUND_UPLOAD_THRESHOLD must be greater than zero");
        }
        if self.http_concurrency_limit == 0 {
            anyhow::bail!("HTTP_CONCURRENCY_LIMIT must be greater than zero");
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            server_port: 4000,
            http_concurrency_limit: DEFAULT_HTTP_CONCURRENCY_LIMIT,
            environment: "test".to_string(),
            database_url: "postgres://localhost/weddia_test".to_string(),
            db_max_connections: 5,
            db_timeout_seconds: 30,
            jwt_secret: "secret".to_string(),
            storage_backend: "local".to_string(),
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            s3_public_base_url: None,
            local_storage_path: Some("/tmp/weddia".to_string()),
            local_storage_base_url: None,
            max_file_size_bytes: MAX_FILE_SIZE_BYTES,
            background_upload_threshold: BACKGROUND_UPLOAD_THRESHOLD,
            job_transport: "direct".to_string(),
            queue_publish_url: None,
            queue_token: None,
            queue_signing_key: None,
            queue_retries: QUEUE_DEFAULT_RETRIES,
            queue_timeout_seconds: QUEUE_EXECUTION_TIMEOUT_SECS,
            worker_callback_url: None,
        }
    }

    #[test]
    fn valid_local_direct_config_passes() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn s3_backend_requires_bucket() {
        let mut config = base_config();
        config.storage_backend = "s3".to_string();
        assert!(config.validate().is_err());
        config.s3_bucket = Some("wedding-media".to_string());
        config.s3_endpoint = Some("https://accountid.r2.example.com".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn queued_transport_requires_queue_settings() {
        let mut config = base_config();
        config.job_transport = "queued".to_string();
        assert!(config.validate().is_err());
        config.queue_publish_url = Some("https://queue.example.com/v2/publish".to_string());
        config.queue_token = Some("tok".to_string());
        config.worker_callback_url = Some("https://api.example.com/api/jobs/process".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_concurrency_limit_rejected() {
        let mut config = base_config();
        config.http_concurrency_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_transport_rejected() {
        let mut config = base_config();
        config.job_transport = "lambda".to_string();
        assert!(config.validate().is_err());
    }
}
