//! Jobboard DB - PostgreSQL repositories and the pagination source.

pub mod catalog;
pub mod collections;
pub mod jobs;
pub mod media;
pub mod stats;
pub mod users;

pub use catalog::{CategoryRepository, CompanyFields, CompanyRepository, JobTypeRepository};
pub use collections::{Collection, PgCollection};
pub use jobs::{JobRepository, PgJobStore, PgJobTransaction};
pub use media::MediaRepository;
pub use stats::StatsRepository;
pub use users::UserRepository;

use jobboard_core::config::DbConfig;
use jobboard_core::error::AppError;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Embedded schema migrations.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Opens a connection pool sized by `config`.
pub async fn connect(database_url: &str, config: &DbConfig) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(database_url)
        .await
        .map_err(AppError::DatabaseError)?;
    tracing::debug!(max_connections = config.max_connections, "database pool ready");
    Ok(pool)
}

/// Applies pending migrations.
pub async fn migrate(pool: &PgPool) -> Result<(), AppError> {
    MIGRATOR
        .run(pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.into()))
}
