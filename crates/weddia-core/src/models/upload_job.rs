use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "text")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl Display for JobStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for JobStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "processing" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid job status: {}", s)),
        }
    }
}

/// Per-file descriptor carried in a job's `file_metadata` payload. Ordered;
/// immutable after job creation. The worker reads it to know what to process.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileMetadata {
    pub file_name: String,
    pub content_type: String,
    pub size: i64,
    /// Final storage key, `weddings/{wedding_id}/{timestamp}_{random}.{ext}`.
    pub storage_key: String,
    /// Same key under the `temp/` namespace; where the raw bytes are staged.
    pub temp_key: String,
}

/// Durable record of one bulk upload batch. Created once by the completion
/// call, mutated exclusively by the worker, never deleted by this subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadJob {
    pub id: Uuid,
    pub wedding_id: Uuid,
    pub user_id: Uuid,
    pub posted_user_name: String,
    pub total_files: i32,
    pub processed_files: i32,
    pub failed_files: i32,
    pub status: JobStatus,
    pub file_metadata: Vec<FileMetadata>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl UploadJob {
    /// Counter invariant, holds at all times during processing.
    pub fn counters_consistent(&self) -> bool {
        self.processed_files + self.failed_files <= self.total_files
    }

    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            job_id: self.id,
            status: self.status,
            total_files: self.total_files,
            processed_files: self.processed_files,
            failed_files: self.failed_files,
            error_message: self.error_message.clone(),
            completed_at: self.completed_at,
        }
    }
}

/// The status view returned to polling clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub total_files: i32,
    pub processed_files: i32,
    pub failed_files: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Everything the dispatcher hands to a worker invocation. Also the message
/// body published on the queue in queued mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub job_id: Uuid,
    pub wedding_id: Uuid,
    pub user_id: Uuid,
    pub posted_user_name: String,
    pub file_metadata: Vec<FileMetadata>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(total: i32, processed: i32, failed: i32, status: JobStatus) -> UploadJob {
        UploadJob {
            id: Uuid::new_v4(),
            wedding_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            posted_user_name: "Alice".to_string(),
            total_files: total,
            processed_files: processed,
            failed_files: failed,
            status,
            file_metadata: vec![],
            error_message: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            completed_at: None,
        }
    }

    #[test]
    fn status_terminality() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn status_round_trips_as_text() {
        for status in [
            JobStatus::Pending,
            JobStatus::Processing,
            JobStatus::Completed,
            JobStatus::Failed,
        ] {
            assert_eq!(status.to_string().parse::<JobStatus>().unwrap(), status);
        }
        assert!("cancelled".parse::<JobStatus>().is_err());
    }

    #[test]
    fn counter_invariant() {
        assert!(job(6, 4, 2, JobStatus::Processing).counters_consistent());
        assert!(job(6, 3, 2, JobStatus::Processing).counters_consistent());
        assert!(!job(6, 5, 2, JobStatus::Processing).counters_consistent());
    }

    #[test]
    fn snapshot_omits_null_fields() {
        let snapshot = job(3, 0, 0, JobStatus::Pending).snapshot();
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["status"], "pending");
        assert!(json.get("error_message").is_none());
        assert!(json.get("completed_at").is_none());
    }

    #[test]
    fn file_metadata_serde_shape() {
        let meta = FileMetadata {
            file_name: "beach.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            size: 1024,
            storage_key: "weddings/w/1_x.jpg".to_string(),
            temp_key: "temp/weddings/w/1_x.jpg".to_string(),
        };
        let json = serde_json::to_string(&meta).unwrap();
        let back: FileMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, meta);
    }
}
