use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;
use weddia_core::models::{FileMetadata, JobDescriptor, JobSnapshot, JobStatus, UploadJob};
use weddia_core::AppError;

/// Database row for `upload_jobs`; `file_metadata` stays JSONB until
/// converted into the typed model.
#[derive(Debug, sqlx::FromRow)]
struct UploadJobRow {
    id: Uuid,
    wedding_id: Uuid,
    user_id: Uuid,
    posted_user_name: String,
    total_files: i32,
    processed_files: i32,
    failed_files: i32,
    status: JobStatus,
    file_metadata: serde_json::Value,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl UploadJobRow {
    fn into_job(self) -> Result<UploadJob, AppError> {
        let file_metadata: Vec<FileMetadata> = serde_json::from_value(self.file_metadata)?;
        Ok(UploadJob {
            id: self.id,
            wedding_id: self.wedding_id,
            user_id: self.user_id,
            posted_user_name: self.posted_user_name,
            total_files: self.total_files,
            processed_files: self.processed_files,
            failed_files: self.failed_files,
            status: self.status,
            file_metadata,
            error_message: self.error_message,
            created_at: self.created_at,
            updated_at: self.updated_at,
            completed_at: self.completed_at,
        })
    }
}

const JOB_COLUMNS: &str = "id, wedding_id, user_id, posted_user_name, total_files, \
     processed_files, failed_files, status, file_metadata, error_message, \
     created_at, updated_at, completed_at";

/// Repository for upload job records.
///
/// Created once by the completion endpoint; mutated exclusively by the worker
/// (and by the dispatcher on publish failure). Jobs are never deleted here.
#[derive(Clone)]
pub struct UploadJobRepository {
    pool: PgPool,
}

impl UploadJobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a job in `pending` state and return the full descriptor.
    pub async fn create(
        &self,
        wedding_id: Uuid,
        user_id: Uuid,
        posted_user_name: &str,
        file_metadata: &[FileMetadata],
    ) -> Result<JobDescriptor, AppError> {
        if file_metadata.is_empty() {
            return Err(AppError::Validation(
                "Upload job must contain at least one file".to_string(),
            ));
        }
        if posted_user_name.trim().is_empty() {
            return Err(AppError::Validation(
                "Display name must not be empty".to_string(),
            ));
        }

        let id = Uuid::new_v4();
        let metadata_json = serde_json::to_value(file_metadata)?;

        sqlx::query(
            "INSERT INTO upload_jobs \
             (id, wedding_id, user_id, posted_user_name, total_files, file_metadata) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(id)
        .bind(wedding_id)
        .bind(user_id)
        .bind(posted_user_name.trim())
        .bind(file_metadata.len() as i32)
        .bind(&metadata_json)
        .execute(&self.pool)
        .await?;

        tracing::info!(
            job_id = %id,
            wedding_id = %wedding_id,
            total_files = file_metadata.len(),
            "Upload job created"
        );

        Ok(JobDescriptor {
            job_id: id,
            wedding_id,
            user_id,
            posted_user_name: posted_user_name.trim().to_string(),
            file_metadata: file_metadata.to_vec(),
        })
    }

    pub async fn get(&self, job_id: Uuid) -> Result<Option<UploadJob>, AppError> {
        let row: Option<UploadJobRow> = sqlx::query_as::<Postgres, UploadJobRow>(&format!(
            "SELECT {} FROM upload_jobs WHERE id = $1",
            JOB_COLUMNS
        ))
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(UploadJobRow::into_job).transpose()
    }

    /// Ownership-checked status read. Jobs are not shared across users, even
    /// within the same wedding.
    pub async fn get_status(
        &self,
        job_id: Uuid,
        requesting_user_id: Uuid,
    ) -> Result<JobSnapshot, AppError> {
        let job = self
            .get(job_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Upload job {} not found", job_id)))?;

        authorize_snapshot(&job, requesting_user_id)
    }

    pub async fn mark_processing(&self, job_id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE upload_jobs SET status = 'processing', updated_at = now() WHERE id = $1",
        )
        .bind(job_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Persist progress counters. Called after every file attempt so status
    /// is observable mid-run.
    pub async fn update_counters(
        &self,
        job_id: Uuid,
        processed_files: i32,
        failed_files: i32,
    ) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE upload_jobs \
             SET processed_files = $2, failed_files = $3, updated_at = now() \
             WHERE id = $1",
        )
        .bind(job_id)
        .bind(processed_files)
        .bind(failed_files)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Move the job to a terminal state, setting `completed_at` exactly once.
    pub async fn finalize(
        &self,
        job_id: Uuid,
        status: JobStatus,
        error_message: Option<&str>,
    ) -> Result<(), AppError> {
        if !status.is_terminal() {
            return Err(AppError::Internal(format!(
                "Cannot finalize job {} with non-terminal status {}",
                job_id, status
            )));
        }

        sqlx::query(
            "UPDATE upload_jobs \
             SET status = $2, error_message = $3, completed_at = now(), updated_at = now() \
             WHERE id = $1",
        )
        .bind(job_id)
        .bind(status)
        .bind(error_message)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// A requester may only read jobs they created themselves.
fn authorize_snapshot(job: &UploadJob, requesting_user_id: Uuid) -> Result<JobSnapshot, AppError> {
    if job.user_id != requesting_user_id {
        return Err(AppError::Forbidden(
            "Upload job belongs to a different user".to_string(),
        ));
    }
    Ok(job.snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_job(user_id: Uuid) -> UploadJob {
        UploadJob {
            id: Uuid::new_v4(),
            wedding_id: Uuid::new_v4(),
            user_id,
            posted_user_name: "Alice".to_string(),
            total_files: 3,
            processed_files: 1,
            failed_files: 0,
            status: JobStatus::Processing,
            file_metadata: vec![],
            error_message: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            completed_at: None,
        }
    }

    #[test]
    fn owner_reads_their_own_job() {
        let user_id = Uuid::new_v4();
        let job = pending_job(user_id);
        let snapshot = authorize_snapshot(&job, user_id).unwrap();
        assert_eq!(snapshot.job_id, job.id);
        assert_eq!(snapshot.processed_files, 1);
    }

    #[test]
    fn other_users_are_forbidden_even_in_the_same_wedding() {
        let job = pending_job(Uuid::new_v4());
        let err = authorize_snapshot(&job, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
