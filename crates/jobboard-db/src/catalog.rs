//! Categories, companies and job types.
//!
//! These rows are never written by the job workflow except for their
//! `job_count`, which this module only reads.

use crate::jobs::parent_table;
use jobboard_core::error::AppError;
use jobboard_core::jobs::Parent;
use jobboard_core::models::{Category, Company, Creator, JobSummary, JobType, WithJobs};
use sqlx::PgPool;
use uuid::Uuid;

const CATEGORY_COLUMNS: &str =
    "id, name, description, created_by, job_count, created_at, updated_at";
const COMPANY_COLUMNS: &str =
    "id, name, description, website, logo, created_by, job_count, created_at, updated_at";
const JOB_TYPE_COLUMNS: &str =
    "id, name, description, created_by, job_count, created_at, updated_at";

/// Column on `jobs` that references the parent.
pub(crate) fn foreign_key(parent: Parent) -> &'static str {
    match parent {
        Parent::Category => "category_id",
        Parent::Company => "company_id",
        Parent::JobType => "job_type_id",
    }
}

async fn creator(pool: &PgPool, user_id: Uuid) -> Result<Option<Creator>, AppError> {
    sqlx::query_as::<_, Creator>("SELECT id, name, email FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::DatabaseError)
}

/// Jobs referencing a parent, newest first.
async fn job_summaries(
    pool: &PgPool,
    parent: Parent,
    id: Uuid,
) -> Result<Vec<JobSummary>, AppError> {
    let query = format!(
        r#"
        SELECT j.id, j.title, j.location, j.salary,
               c.name AS category_name, co.name AS company_name, t.name AS job_type_name,
               j.created_at
        FROM jobs j
        JOIN categories c ON c.id = j.category_id
        JOIN companies co ON co.id = j.company_id
        JOIN job_types t ON t.id = j.job_type_id
        WHERE j.{} = $1
        ORDER BY j.created_at DESC
        "#,
        foreign_key(parent)
    );
    sqlx::query_as::<_, JobSummary>(&query)
        .bind(id)
        .fetch_all(pool)
        .await
        .map_err(AppError::DatabaseError)
}

/// Deletes a parent row unless jobs still reference it.
async fn delete_unreferenced(pool: &PgPool, parent: Parent, id: Uuid) -> Result<(), AppError> {
    let table = parent_table(parent);
    let mut tx = pool.begin().await.map_err(AppError::DatabaseError)?;

    let lock_query = format!("SELECT id FROM {} WHERE id = $1 FOR UPDATE", table);
    let found: Option<Uuid> = sqlx::query_scalar(&lock_query)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::DatabaseError)?;
    if found.is_none() {
        return Err(AppError::NotFound(format!("{} {}", parent.label(), id)));
    }

    let count_query = format!("SELECT COUNT(*) FROM jobs WHERE {} = $1", foreign_key(parent));
    let jobs: i64 = sqlx::query_scalar(&count_query)
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::DatabaseError)?;
    if jobs > 0 {
        return Err(AppError::Conflict(format!(
            "{} {} still has {} job(s)",
            parent.label(),
            id,
            jobs
        )));
    }

    let delete_query = format!("DELETE FROM {} WHERE id = $1", table);
    sqlx::query(&delete_query)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| match AppError::from_db(e) {
            // A job slipped in after the check; the foreign key refused.
            AppError::NotFound(what) => AppError::Conflict(format!("{} is still referenced", what)),
            other => other,
        })?;

    tx.commit().await.map_err(AppError::DatabaseError)?;
    tracing::info!(entity = parent.label(), %id, "deleted");
    Ok(())
}

#[derive(Clone)]
pub struct CategoryRepository {
    pool: PgPool,
}

impl CategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        name: &str,
        description: &str,
        created_by: Uuid,
    ) -> Result<Category, AppError> {
        let query = format!(
            "INSERT INTO categories (name, description, created_by) VALUES ($1, $2, $3) RETURNING {}",
            CATEGORY_COLUMNS
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(name)
            .bind(description)
            .bind(created_by)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from_db)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Category>, AppError> {
        let query = format!("SELECT {} FROM categories WHERE id = $1", CATEGORY_COLUMNS);
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }

    /// The category with its creator and the jobs filed under it.
    pub async fn get_detail(&self, id: Uuid) -> Result<Option<WithJobs<Category>>, AppError> {
        let Some(category) = self.get(id).await? else {
            return Ok(None);
        };
        let created_by_user = creator(&self.pool, category.created_by).await?;
        let jobs = job_summaries(&self.pool, Parent::Category, id).await?;
        Ok(Some(WithJobs {
            entity: category,
            created_by_user,
            jobs,
        }))
    }

    /// `None` arguments keep the current value.
    pub async fn update(
        &self,
        id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<Category>, AppError> {
        let query = format!(
            "UPDATE categories SET name = COALESCE($2, name), description = COALESCE($3, description), \
             updated_at = NOW() WHERE id = $1 RETURNING {}",
            CATEGORY_COLUMNS
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .bind(name)
            .bind(description)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from_db)
    }

    /// Fails with `Conflict` while any job is filed under the category.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        delete_unreferenced(&self.pool, Parent::Category, id).await
    }
}

#[derive(Clone)]
pub struct CompanyRepository {
    pool: PgPool,
}

/// Company columns to change. `None` keeps the current value.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompanyFields<'a> {
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
    pub website: Option<&'a str>,
    pub logo: Option<&'a str>,
}

impl CompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        name: &str,
        description: &str,
        website: Option<&str>,
        logo: Option<&str>,
        created_by: Uuid,
    ) -> Result<Company, AppError> {
        let query = format!(
            "INSERT INTO companies (name, description, website, logo, created_by) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            COMPANY_COLUMNS
        );
        sqlx::query_as::<_, Company>(&query)
            .bind(name)
            .bind(description)
            .bind(website)
            .bind(logo)
            .bind(created_by)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from_db)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Company>, AppError> {
        let query = format!("SELECT {} FROM companies WHERE id = $1", COMPANY_COLUMNS);
        sqlx::query_as::<_, Company>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }

    pub async fn get_detail(&self, id: Uuid) -> Result<Option<WithJobs<Company>>, AppError> {
        let Some(company) = self.get(id).await? else {
            return Ok(None);
        };
        let created_by_user = creator(&self.pool, company.created_by).await?;
        let jobs = job_summaries(&self.pool, Parent::Company, id).await?;
        Ok(Some(WithJobs {
            entity: company,
            created_by_user,
            jobs,
        }))
    }

    pub async fn update(
        &self,
        id: Uuid,
        fields: CompanyFields<'_>,
    ) -> Result<Option<Company>, AppError> {
        let query = format!(
            r#"
            UPDATE companies SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                website = COALESCE($4, website),
                logo = COALESCE($5, logo),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            COMPANY_COLUMNS
        );
        sqlx::query_as::<_, Company>(&query)
            .bind(id)
            .bind(fields.name)
            .bind(fields.description)
            .bind(fields.website)
            .bind(fields.logo)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from_db)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        delete_unreferenced(&self.pool, Parent::Company, id).await
    }
}

#[derive(Clone)]
pub struct JobTypeRepository {
    pool: PgPool,
}

impl JobTypeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Names are unique; a duplicate fails with `Conflict`.
    pub async fn create(
        &self,
        name: &str,
        description: &str,
        created_by: Uuid,
    ) -> Result<JobType, AppError> {
        let query = format!(
            "INSERT INTO job_types (name, description, created_by) VALUES ($1, $2, $3) RETURNING {}",
            JOB_TYPE_COLUMNS
        );
        sqlx::query_as::<_, JobType>(&query)
            .bind(name)
            .bind(description)
            .bind(created_by)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from_db)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<JobType>, AppError> {
        let query = format!("SELECT {} FROM job_types WHERE id = $1", JOB_TYPE_COLUMNS);
        sqlx::query_as::<_, JobType>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }

    pub async fn get_detail(&self, id: Uuid) -> Result<Option<WithJobs<JobType>>, AppError> {
        let Some(job_type) = self.get(id).await? else {
            return Ok(None);
        };
        let created_by_user = creator(&self.pool, job_type.created_by).await?;
        let jobs = job_summaries(&self.pool, Parent::JobType, id).await?;
        Ok(Some(WithJobs {
            entity: job_type,
            created_by_user,
            jobs,
        }))
    }

    pub async fn update(
        &self,
        id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<JobType>, AppError> {
        let query = format!(
            "UPDATE job_types SET name = COALESCE($2, name), description = COALESCE($3, description), \
             updated_at = NOW() WHERE id = $1 RETURNING {}",
            JOB_TYPE_COLUMNS
        );
        sqlx::query_as::<_, JobType>(&query)
            .bind(id)
            .bind(name)
            .bind(description)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from_db)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        delete_unreferenced(&self.pool, Parent::JobType, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_foreign_keys_match_job_columns() {
        for parent in Parent::ALL {
            assert!(crate::jobs::JOB_COLUMNS.contains(foreign_key(parent)));
        }
    }

    #[test]
    fn test_column_lists_include_job_count() {
        for columns in [CATEGORY_COLUMNS, COMPANY_COLUMNS, JOB_TYPE_COLUMNS] {
            assert!(columns.contains("job_count"));
            assert!(columns.starts_with("id, name, description"));
        }
    }
}
