//! Maintenance queries: row counts and counter drift.

use crate::catalog::foreign_key;
use crate::jobs::parent_table;
use chrono::{DateTime, Utc};
use jobboard_core::counters::{CounterReport, CounterSample};
use jobboard_core::error::AppError;
use jobboard_core::jobs::Parent;
use jobboard_core::models::DatabaseStats;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct StatsRepository {
    pool: PgPool,
}

impl StatsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns aggregated database statistics.
    pub async fn get_stats(&self) -> Result<DatabaseStats, AppError> {
        let row: StatsRow = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM jobs) AS jobs,
                (SELECT COUNT(*) FROM categories) AS categories,
                (SELECT COUNT(*) FROM companies) AS companies,
                (SELECT COUNT(*) FROM job_types) AS job_types,
                (SELECT COUNT(*) FROM users) AS users,
                (SELECT COUNT(*) FROM users WHERE is_active) AS active_users,
                (SELECT COUNT(*) FROM media) AS media,
                (SELECT MAX(created_at) FROM jobs) AS last_job_created
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::DatabaseError)?;

        Ok(DatabaseStats {
            jobs: row.jobs.unwrap_or(0),
            categories: row.categories.unwrap_or(0),
            companies: row.companies.unwrap_or(0),
            job_types: row.job_types.unwrap_or(0),
            users: row.users.unwrap_or(0),
            active_users: row.active_users.unwrap_or(0),
            media: row.media.unwrap_or(0),
            last_job_created: row.last_job_created,
        })
    }

    /// Compares every stored `job_count` against a fresh count of jobs.
    pub async fn check_counters(&self) -> Result<CounterReport, AppError> {
        let mut report = CounterReport::new();
        for parent in Parent::ALL {
            let query = format!(
                "SELECT p.id, p.name, p.job_count AS stored, COUNT(j.id) AS actual \
                 FROM {} p LEFT JOIN jobs j ON j.{} = p.id GROUP BY p.id ORDER BY p.name",
                parent_table(parent),
                foreign_key(parent)
            );
            let rows: Vec<CounterRow> = sqlx::query_as(&query)
                .fetch_all(&self.pool)
                .await
                .map_err(AppError::DatabaseError)?;

            for row in rows {
                report.record(CounterSample {
                    parent,
                    id: row.id,
                    name: row.name,
                    stored: row.stored,
                    actual: row.actual,
                });
            }
        }

        if !report.is_consistent() {
            tracing::warn!(drifted = report.drifted.len(), "job counters out of sync");
        }
        Ok(report)
    }
}

/// Helper struct for deserializing stats query results
#[derive(sqlx::FromRow)]
struct StatsRow {
    jobs: Option<i64>,
    categories: Option<i64>,
    companies: Option<i64>,
    job_types: Option<i64>,
    users: Option<i64>,
    active_users: Option<i64>,
    media: Option<i64>,
    last_job_created: Option<DateTime<Utc>>,
}

#[derive(sqlx::FromRow)]
struct CounterRow {
    id: Uuid,
    name: String,
    stored: i64,
    actual: i64,
}
