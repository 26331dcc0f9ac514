//! Shared HTTP client for the Weddia API.
//!
//! Provides a minimal client with Bearer auth, generic GET/POST helpers, and
//! the upload orchestration used by app frontends: threshold-based routing
//! between the synchronous single-file path and the staged background path,
//! plus job status polling.

pub mod api;
pub mod status;
pub mod uploader;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// HTTP client for the Weddia API with Bearer auth.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    pub fn new(base_url: String, token: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Create client from environment: WEDDIA_API_URL and WEDDIA_TOKEN.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("WEDDIA_API_URL")
            .unwrap_or_else(|_| "http://localhost:4000".to_string());
        let token =
            std::env::var("WEDDIA_TOKEN").context("Missing token. Set WEDDIA_TOKEN")?;
        Self::new(base_url, token)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.bearer_auth(&self.token)
    }

    async fn read_success<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow::anyhow!(
                "API request failed with status {}: {}",
                status,
                error_text
            ));
        }

        response
            .json()
            .await
            .context("Failed to parse response as JSON")
    }

    /// GET request with optional query parameters. Deserializes JSON response.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = self.build_url(path);
        let mut request = self.apply_auth(self.client.get(&url));
        if !query.is_empty() {
            request = request.query(query);
        }
        let response = request.send().await.context("Failed to send request")?;
        Self::read_success(response).await
    }

    /// POST JSON body and deserialize response.
    pub async fn post_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.build_url(path);
        let request = self.apply_auth(self.client.post(&url).json(body));
        let response = request.send().await.context("Failed to send request")?;
        Self::read_success(response).await
    }

    /// POST multipart form and deserialize response.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T> {
        let url = self.build_url(path);
        let request = self.apply_auth(self.client.post(&url).multipart(form));
        let response = request.send().await.context("Failed to send request")?;
        Self::read_success(response).await
    }

    /// Raw client for custom requests (presigned PUTs carry their own auth).
    pub fn client(&self) -> &Client {
        &self.client
    }
}

pub use api::{
    InitiateUploadResponse, MediaListResponse, MediaResponse, PresignedUpload,
    PresignedUploadResponse,
};
pub use status::{StatusWatcher, WatchEvent};
pub use uploader::{UploadApi, UploadError, UploadFile, UploadOrchestrator, UploadOutcome};
pub use weddia_core::models::JobSnapshot;
