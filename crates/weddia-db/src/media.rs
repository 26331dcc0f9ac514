use sqlx::{PgPool, Postgres};
use uuid::Uuid;
use weddia_core::models::{Media, MediaType};
use weddia_core::AppError;

const MEDIA_COLUMNS: &str =
    "id, wedding_id, posted_user_name, url, media_type, posted_at, deleted_at";

/// Repository for published media rows.
///
/// Every read filters `deleted_at IS NULL`; soft-deleted rows stay in the
/// table for retention but never reach the gallery.
#[derive(Clone)]
pub struct MediaRepository {
    pool: PgPool,
}

impl MediaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(
        &self,
        wedding_id: Uuid,
        posted_user_name: &str,
        url: &str,
        media_type: MediaType,
    ) -> Result<Media, AppError> {
        let row: Media = sqlx::query_as::<Postgres, Media>(&format!(
            "INSERT INTO media (id, wedding_id, posted_user_name, url, media_type) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {}",
            MEDIA_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(wedding_id)
        .bind(posted_user_name)
        .bind(url)
        .bind(media_type)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(
            media_id = %row.id,
            wedding_id = %wedding_id,
            media_type = %media_type,
            "Media row created"
        );

        Ok(row)
    }

    /// True when a live media row already exists for the final URL. Used by
    /// the worker to make queue re-invocation idempotent.
    pub async fn exists_by_url(&self, url: &str) -> Result<bool, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM media WHERE url = $1 AND deleted_at IS NULL",
        )
        .bind(url)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    /// Gallery read: live media for one wedding, newest first.
    pub async fn list_for_wedding(&self, wedding_id: Uuid) -> Result<Vec<Media>, AppError> {
        let rows: Vec<Media> = sqlx::query_as::<Postgres, Media>(&format!(
            "SELECT {} FROM media \
             WHERE wedding_id = $1 AND deleted_at IS NULL \
             ORDER BY posted_at DESC",
            MEDIA_COLUMNS
        ))
        .bind(wedding_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn soft_delete(&self, id: Uuid, wedding_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE media SET deleted_at = now() \
             WHERE id = $1 AND wedding_id = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(wedding_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Media {} not found", id)));
        }
        Ok(())
    }
}
