//! Jobboard Core - Domain types, error handling, configuration, and the
//! workflows that keep the catalogue consistent.

pub mod config;
pub mod counters;
pub mod describe;
pub mod error;
pub mod jobs;
pub mod models;
pub mod pagination;

pub use config::{
    default_config_path, load_settings, AuthConfig, DbConfig, HttpConfig, PaginationConfig,
    Settings,
};
pub use counters::{CounterDrift, CounterReport, CounterSample};
pub use describe::{resolve_description, DescriptionGenerator, DisabledGenerator, EntityKind};
pub use error::AppError;
pub use jobs::{
    CreateJobInput, JobService, JobStore, JobTransaction, Parent, UpdateJobInput,
};
pub use models::{
    Caller, Category, CategoryInput, Company, CompanyInput, Creator, DatabaseStats, Job,
    JobChanges, JobDetail, JobSummary, JobType, JobTypeInput, Media, MediaKind, NewJob,
    NewMedia, NewUser, Role, User, UserChanges, UserDetail, WithJobs,
};
pub use pagination::{
    paginate, FieldKind, FieldSpec, Filter, FilterValue, JoinCount, ListQuery, Page,
    PageRequest, PageSource, SortDirection, SortSpec,
};
