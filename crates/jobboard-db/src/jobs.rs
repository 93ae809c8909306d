//! Job persistence: the transactional [`JobStore`] and read-side queries.

use async_trait::async_trait;
use jobboard_core::error::AppError;
use jobboard_core::jobs::{JobStore, JobTransaction, Parent};
use jobboard_core::models::{Job, JobChanges, JobDetail, NewJob};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Column list for job SELECT/RETURNING clauses. Must remain a const literal
/// since `format!()` bypasses sqlx compile-time validation.
pub(crate) const JOB_COLUMNS: &str = "id, title, description, location, salary, category_id, company_id, job_type_id, created_by, created_at, updated_at";

/// Table holding the counter for a parent. Const literals only.
pub(crate) fn parent_table(parent: Parent) -> &'static str {
    match parent {
        Parent::Category => "categories",
        Parent::Company => "companies",
        Parent::JobType => "job_types",
    }
}

/// Moves a counter by `$1` for row `$2` in one statement. The row lock taken
/// by the UPDATE serializes concurrent writers, and the guard refuses to go
/// below zero, in which case no row is returned.
pub(crate) fn adjust_count_sql(table: &str) -> String {
    format!(
        "UPDATE {} SET job_count = job_count + $1 \
         WHERE id = $2 AND job_count + $1 >= 0 RETURNING job_count",
        table
    )
}

pub(crate) fn exists_sql(table: &str) -> String {
    format!("SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1)", table)
}

/// Opens job transactions on a PostgreSQL pool.
#[derive(Clone)]
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn begin(&self) -> Result<Box<dyn JobTransaction>, AppError> {
        let tx = self.pool.begin().await.map_err(AppError::DatabaseError)?;
        Ok(Box::new(PgJobTransaction { tx }))
    }
}

/// A READ COMMITTED transaction. Counter updates are single atomic
/// statements, so concurrent writers on the same parent serialize on its
/// row lock instead of overwriting each other.
pub struct PgJobTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl JobTransaction for PgJobTransaction {
    async fn insert_job(&mut self, job: &NewJob) -> Result<Job, AppError> {
        let query = format!(
            "INSERT INTO jobs (title, description, location, salary, category_id, company_id, job_type_id, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
            JOB_COLUMNS
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(&job.title)
            .bind(&job.description)
            .bind(&job.location)
            .bind(job.salary)
            .bind(job.category_id)
            .bind(job.company_id)
            .bind(job.job_type_id)
            .bind(job.created_by)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(AppError::from_db)
    }

    async fn lock_job(&mut self, id: Uuid) -> Result<Option<Job>, AppError> {
        let query = format!("SELECT {} FROM jobs WHERE id = $1 FOR UPDATE", JOB_COLUMNS);
        sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(AppError::DatabaseError)
    }

    async fn update_job(&mut self, id: Uuid, changes: &JobChanges) -> Result<Job, AppError> {
        let query = format!(
            r#"
            UPDATE jobs SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                location = COALESCE($4, location),
                salary = COALESCE($5, salary),
                category_id = COALESCE($6, category_id),
                company_id = COALESCE($7, company_id),
                job_type_id = COALESCE($8, job_type_id),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            JOB_COLUMNS
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .bind(&changes.title)
            .bind(&changes.description)
            .bind(&changes.location)
            .bind(changes.salary)
            .bind(changes.category_id)
            .bind(changes.company_id)
            .bind(changes.job_type_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(AppError::from_db)?
            .ok_or_else(|| AppError::NotFound(format!("Job {}", id)))
    }

    async fn delete_job(&mut self, id: Uuid) -> Result<Option<Job>, AppError> {
        let query = format!("DELETE FROM jobs WHERE id = $1 RETURNING {}", JOB_COLUMNS);
        sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(AppError::DatabaseError)
    }

    async fn adjust_job_count(
        &mut self,
        parent: Parent,
        id: Uuid,
        delta: i64,
    ) -> Result<i64, AppError> {
        let table = parent_table(parent);
        let updated: Option<i64> = sqlx::query_scalar(&adjust_count_sql(table))
            .bind(delta)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(AppError::DatabaseError)?;

        if let Some(count) = updated {
            return Ok(count);
        }

        let exists: bool = sqlx::query_scalar(&exists_sql(table))
            .bind(id)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(AppError::DatabaseError)?;

        if exists {
            Err(AppError::Conflict(format!(
                "{} {} job count would drop below zero",
                parent.label(),
                id
            )))
        } else {
            Err(AppError::NotFound(format!("{} {}", parent.label(), id)))
        }
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        self.tx.commit().await.map_err(AppError::DatabaseError)
    }

    async fn rollback(self: Box<Self>) -> Result<(), AppError> {
        self.tx.rollback().await.map_err(AppError::DatabaseError)
    }
}

/// Read-side job queries.
#[derive(Clone)]
pub struct JobRepository {
    pool: PgPool,
}

impl JobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A job with the names of its category, company, type and creator.
    pub async fn get_detail(&self, id: Uuid) -> Result<Option<JobDetail>, AppError> {
        let detail = sqlx::query_as::<_, JobDetail>(
            r#"
            SELECT
                j.id, j.title, j.description, j.location, j.salary,
                j.category_id, j.company_id, j.job_type_id, j.created_by,
                j.created_at, j.updated_at,
                c.name AS category_name,
                co.name AS company_name,
                co.website AS company_website,
                t.name AS job_type_name,
                u.name AS created_by_name,
                u.email AS created_by_email
            FROM jobs j
            JOIN categories c ON c.id = j.category_id
            JOIN companies co ON co.id = j.company_id
            JOIN job_types t ON t.id = j.job_type_id
            LEFT JOIN users u ON u.id = j.created_by
            WHERE j.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::DatabaseError)?;

        Ok(detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_tables() {
        assert_eq!(parent_table(Parent::Category), "categories");
        assert_eq!(parent_table(Parent::Company), "companies");
        assert_eq!(parent_table(Parent::JobType), "job_types");
    }

    #[test]
    fn test_adjust_count_sql() {
        let sql = adjust_count_sql(parent_table(Parent::Company));
        assert_eq!(
            sql,
            "UPDATE companies SET job_count = job_count + $1 \
             WHERE id = $2 AND job_count + $1 >= 0 RETURNING job_count"
        );
        // Relative update, never a read-modify-write of the stored value.
        assert!(sql.contains("job_count = job_count + $1"));
        assert!(!sql.contains("SELECT"));
    }

    #[test]
    fn test_exists_sql() {
        assert_eq!(
            exists_sql("job_types"),
            "SELECT EXISTS (SELECT 1 FROM job_types WHERE id = $1)"
        );
    }

    #[test]
    fn test_job_columns_cover_the_model() {
        for column in ["category_id", "company_id", "job_type_id", "created_by", "salary"] {
            assert!(JOB_COLUMNS.contains(column));
        }
    }
}
