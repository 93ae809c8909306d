use crate::auth::TokenKeys;
use jobboard_core::config::{PaginationConfig, Settings};
use jobboard_core::describe::DescriptionGenerator;
use jobboard_core::jobs::JobService;
use jobboard_db::{
    CategoryRepository, CompanyRepository, JobRepository, JobTypeRepository, MediaRepository,
    PgJobStore, UserRepository,
};
use sqlx::PgPool;
use std::sync::Arc;

/// Shared by every handler. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub jobs: JobService,
    pub job_reads: JobRepository,
    pub categories: CategoryRepository,
    pub companies: CompanyRepository,
    pub job_types: JobTypeRepository,
    pub users: UserRepository,
    pub media: MediaRepository,
    pub generator: Arc<dyn DescriptionGenerator>,
    pub tokens: Arc<TokenKeys>,
    pub pagination: PaginationConfig,
}

impl AppState {
    pub fn new(
        pool: PgPool,
        generator: Arc<dyn DescriptionGenerator>,
        jwt_secret: &str,
        settings: &Settings,
    ) -> Self {
        let store = Arc::new(PgJobStore::new(pool.clone()));
        Self {
            jobs: JobService::new(store, generator.clone()),
            job_reads: JobRepository::new(pool.clone()),
            categories: CategoryRepository::new(pool.clone()),
            companies: CompanyRepository::new(pool.clone()),
            job_types: JobTypeRepository::new(pool.clone()),
            users: UserRepository::new(pool.clone()),
            media: MediaRepository::new(pool.clone()),
            generator,
            tokens: Arc::new(TokenKeys::new(jwt_secret, settings.auth.token_ttl_hours)),
            pagination: settings.pagination,
            pool,
        }
    }
}
