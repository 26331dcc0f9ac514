//! Worker callback endpoint, invoked by the message queue in queued mode.
//!
//! The request is authenticated by an HMAC-SHA256 signature over the raw body
//! rather than a user token. Processing runs inline; the queue's execution
//! timeout bounds the request, and a non-2xx response triggers redelivery,
//! which is safe because the worker is idempotent per file.

use std::sync::Arc;

use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use uuid::Uuid;
use weddia_core::models::{JobDescriptor, JobStatus};
use weddia_core::AppError;

use crate::error::HttpAppError;
use crate::state::AppState;

const SIGNATURE_HEADER: &str = "x-queue-signature";

#[derive(Debug, Serialize)]
pub struct ProcessJobResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub processed_files: i32,
    pub failed_files: i32,
}

fn verify_signature(signing_key: &str, headers: &HeaderMap, body: &[u8]) -> Result<(), AppError> {
    let provided = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing queue signature".to_string()))?;

    let expected = hex::decode(provided)
        .map_err(|_| AppError::Unauthorized("Malformed queue signature".to_string()))?;

    let mut mac = Hmac::<Sha256>::new_from_slice(signing_key.as_bytes())
        .map_err(|e| AppError::Internal(format!("Invalid signing key: {}", e)))?;
    mac.update(body);
    mac.verify_slice(&expected)
        .map_err(|_| AppError::Unauthorized("Invalid queue signature".to_string()))?;
    Ok(())
}

#[tracing::instrument(skip(state, headers, body), fields(operation = "process_job"))]
pub async fn process_job(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ProcessJobResponse>, HttpAppError> {
    if let Some(signing_key) = state.config.queue_signing_key.as_deref() {
        verify_signature(signing_key, &headers, &body)?;
    }

    let descriptor: JobDescriptor = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("Invalid job descriptor: {}", e)))?;

    let outcome = state.processor.process_job(descriptor.job_id).await?;

    Ok(Json(ProcessJobResponse {
        job_id: descriptor.job_id,
        status: outcome.status,
        processed_files: outcome.processed_files,
        failed_files: outcome.failed_files,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn sign(key: &str, body: &[u8]) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(key.as_bytes()).unwrap();
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn valid_signature_passes() {
        let body = br#"{"job_id":"x"}"#;
        let mut headers = HeaderMap::new();
        headers.insert(
            SIGNATURE_HEADER,
            HeaderValue::from_str(&sign("key", body)).unwrap(),
        );
        assert!(verify_signature("key", &headers, body).is_ok());
    }

    #[test]
    fn wrong_key_is_rejected() {
        let body = br#"{"job_id":"x"}"#;
        let mut headers = HeaderMap::new();
        headers.insert(
            SIGNATURE_HEADER,
            HeaderValue::from_str(&sign("other", body)).unwrap(),
        );
        assert!(verify_signature("key", &headers, body).is_err());
    }

    #[test]
    fn missing_signature_is_rejected() {
        assert!(verify_signature("key", &HeaderMap::new(), b"{}").is_err());
    }

    #[test]
    fn tampered_body_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(
            SIGNATURE_HEADER,
            HeaderValue::from_str(&sign("key", b"original")).unwrap(),
        );
        assert!(verify_signature("key", &headers, b"tampered").is_err());
    }
}
