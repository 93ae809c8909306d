use jobboard_core::error::AppError;
use jobboard_core::models::{Media, NewMedia};
use sqlx::PgPool;
use uuid::Uuid;

const MEDIA_COLUMNS: &str =
    "id, original, thumbnail, mobile, tablet, desktop, kind, created_at, updated_at";

/// Records of uploaded files. The files themselves live elsewhere.
#[derive(Clone)]
pub struct MediaRepository {
    pool: PgPool,
}

impl MediaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, media: &NewMedia) -> Result<Media, AppError> {
        let query = format!(
            "INSERT INTO media (original, thumbnail, mobile, tablet, desktop, kind) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            MEDIA_COLUMNS
        );
        sqlx::query_as::<_, Media>(&query)
            .bind(&media.original)
            .bind(&media.thumbnail)
            .bind(&media.mobile)
            .bind(&media.tablet)
            .bind(&media.desktop)
            .bind(media.kind)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from_db)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Media>, AppError> {
        let query = format!("SELECT {} FROM media WHERE id = $1", MEDIA_COLUMNS);
        sqlx::query_as::<_, Media>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }

    /// Returns the deleted record, if it existed.
    pub async fn delete(&self, id: Uuid) -> Result<Option<Media>, AppError> {
        let query = format!("DELETE FROM media WHERE id = $1 RETURNING {}", MEDIA_COLUMNS);
        sqlx::query_as::<_, Media>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }
}
