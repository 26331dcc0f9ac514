//! Message queue client for the queued dispatch transport.
//!
//! The queue is an HTTP-callback service: `publish` hands it a target URL and
//! a JSON body, and the queue POSTs that body to the target with at-least-once
//! delivery and a bounded retry count. Application-level per-file failures are
//! handled inside the worker, not by queue retries.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Queue publish failed: {0}")]
    PublishFailed(String),

    #[error("Queue rejected message: status {status}, body {body}")]
    Rejected { status: u16, body: String },
}

#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Publish a message targeting `target_url`. Returns the queue's message id.
    async fn publish(
        &self,
        target_url: &str,
        body: serde_json::Value,
        retries: u32,
    ) -> Result<String, QueueError>;
}

/// HTTP queue client (QStash-compatible publish API).
///
/// `POST {publish_base_url}/{target_url}` with a bearer token; retry count and
/// execution timeout ride along as headers interpreted by the queue.
pub struct HttpQueue {
    client: reqwest::Client,
    publish_base_url: String,
    token: String,
    execution_timeout: Duration,
}

impl HttpQueue {
    pub fn new(publish_base_url: String, token: String, execution_timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            publish_base_url,
            token,
            execution_timeout,
        }
    }
}

#[async_trait]
impl MessageQueue for HttpQueue {
    async fn publish(
        &self,
        target_url: &str,
        body: serde_json::Value,
        retries: u32,
    ) -> Result<String, QueueError> {
        let url = format!(
            "{}/{}",
            self.publish_base_url.trim_end_matches('/'),
            target_url
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .header("Upstash-Retries", retries.to_string())
            .header(
                "Upstash-Timeout",
                format!("{}s", self.execution_timeout.as_secs()),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| QueueError::PublishFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QueueError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        #[derive(serde::Deserialize)]
        struct PublishResponse {
            #[serde(rename = "messageId")]
            message_id: String,
        }

        let parsed: PublishResponse = response
            .json()
            .await
            .map_err(|e| QueueError::PublishFailed(format!("Invalid publish response: {}", e)))?;

        tracing::info!(
            message_id = %parsed.message_id,
            target_url = %target_url,
            retries = retries,
            "Job published to queue"
        );

        Ok(parsed.message_id)
    }
}
