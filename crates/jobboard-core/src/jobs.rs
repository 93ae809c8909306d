//! The job workflow.
//!
//! `job_count` on categories, companies and job types is a materialized
//! count of the jobs pointing at them. It only moves here, inside the same
//! transaction as the job insert, update or delete that changes it, so a
//! failure at any step leaves neither an orphan job nor a half-applied
//! counter.

use crate::describe::{resolve_description, DescriptionGenerator, EntityKind};
use crate::error::AppError;
use crate::models::{non_blank, Caller, Job, JobChanges, NewJob};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

/// Entities that carry a denormalized `job_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Parent {
    Category,
    Company,
    JobType,
}

impl Parent {
    pub const ALL: [Parent; 3] = [Parent::Category, Parent::Company, Parent::JobType];

    pub fn label(self) -> &'static str {
        match self {
            Parent::Category => "Category",
            Parent::Company => "Company",
            Parent::JobType => "JobType",
        }
    }

    /// The reference a job holds to this parent.
    pub fn of_job(self, job: &Job) -> Uuid {
        match self {
            Parent::Category => job.category_id,
            Parent::Company => job.company_id,
            Parent::JobType => job.job_type_id,
        }
    }

    fn in_changes(self, changes: &JobChanges) -> Option<Uuid> {
        match self {
            Parent::Category => changes.category_id,
            Parent::Company => changes.company_id,
            Parent::JobType => changes.job_type_id,
        }
    }

    fn increment_step(self) -> &'static str {
        match self {
            Parent::Category => "incrementing category job count",
            Parent::Company => "incrementing company job count",
            Parent::JobType => "incrementing job type job count",
        }
    }

    fn decrement_step(self) -> &'static str {
        match self {
            Parent::Category => "decrementing category job count",
            Parent::Company => "decrementing company job count",
            Parent::JobType => "decrementing job type job count",
        }
    }
}

/// Opens job transactions.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn JobTransaction>, AppError>;
}

/// One open transaction. Nothing it writes is visible to other readers
/// until [`commit`](JobTransaction::commit); dropping it without committing
/// discards every write.
#[async_trait]
pub trait JobTransaction: Send {
    async fn insert_job(&mut self, job: &NewJob) -> Result<Job, AppError>;

    /// Loads a job and locks it until the transaction ends.
    async fn lock_job(&mut self, id: Uuid) -> Result<Option<Job>, AppError>;

    async fn update_job(&mut self, id: Uuid, changes: &JobChanges) -> Result<Job, AppError>;

    /// Deletes a job, returning it if it existed.
    async fn delete_job(&mut self, id: Uuid) -> Result<Option<Job>, AppError>;

    /// Adds `delta` to the parent's `job_count` and returns the new value.
    ///
    /// Fails with `NotFound` when the parent does not exist and with
    /// `Conflict` when the count would drop below zero.
    async fn adjust_job_count(
        &mut self,
        parent: Parent,
        id: Uuid,
        delta: i64,
    ) -> Result<i64, AppError>;

    async fn commit(self: Box<Self>) -> Result<(), AppError>;

    async fn rollback(self: Box<Self>) -> Result<(), AppError>;
}

/// Create payload as it arrives over the wire. Everything is optional so
/// missing fields are reported together instead of as a parse error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobInput {
    pub title: Option<String>,
    pub company: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    /// A JSON number or a numeric string.
    pub salary: Option<Value>,
    pub job_type: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJobInput {
    pub title: Option<String>,
    pub company: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub salary: Option<Value>,
    pub job_type: Option<String>,
    pub description: Option<String>,
}

/// A create payload that passed validation; only the description may still
/// be missing.
#[derive(Debug, Clone, PartialEq)]
pub struct JobDraft {
    pub title: String,
    pub location: String,
    pub salary: f64,
    pub category_id: Uuid,
    pub company_id: Uuid,
    pub job_type_id: Uuid,
    pub description: Option<String>,
}

impl JobDraft {
    fn details(&self) -> Value {
        json!({
            "title": self.title,
            "location": self.location,
            "salary": self.salary,
            "category": self.category_id,
            "company": self.company_id,
            "jobType": self.job_type_id,
        })
    }
}

/// Salary must be a positive, finite number. Numeric strings are accepted.
pub fn parse_salary(raw: &Value) -> Result<f64, AppError> {
    let salary = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    salary
        .filter(|s| s.is_finite() && *s > 0.0)
        .ok_or_else(|| AppError::Validation("Salary must be a positive number".to_string()))
}

fn parse_reference(field: &str, raw: &str) -> Result<Uuid, AppError> {
    raw.trim()
        .parse::<Uuid>()
        .map_err(|_| AppError::Validation(format!("Invalid {} id: {}", field, raw)))
}

impl CreateJobInput {
    /// Checks required fields, the salary and the reference ids.
    pub fn validate(&self) -> Result<JobDraft, AppError> {
        let required = [
            ("title", self.title.as_deref()),
            ("company", self.company.as_deref()),
            ("category", self.category.as_deref()),
            ("location", self.location.as_deref()),
            ("jobType", self.job_type.as_deref()),
        ];
        let mut missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| non_blank(*value).is_none())
            .map(|(name, _)| *name)
            .collect();
        if self.salary.as_ref().is_none_or(Value::is_null) {
            missing.push("salary");
        }
        if !missing.is_empty() {
            return Err(AppError::Validation(format!(
                "All fields are required (missing: {})",
                missing.join(", ")
            )));
        }

        // All of these were checked above.
        let field = |v: &Option<String>| v.as_deref().unwrap_or_default().trim().to_string();
        let salary = parse_salary(self.salary.as_ref().unwrap_or(&Value::Null))?;

        Ok(JobDraft {
            title: field(&self.title),
            location: field(&self.location),
            salary,
            category_id: parse_reference("category", &field(&self.category))?,
            company_id: parse_reference("company", &field(&self.company))?,
            job_type_id: parse_reference("jobType", &field(&self.job_type))?,
            description: non_blank(self.description.as_deref()).map(str::to_string),
        })
    }
}

impl UpdateJobInput {
    pub fn validate(&self) -> Result<JobChanges, AppError> {
        fn text(field: &str, value: &Option<String>) -> Result<Option<String>, AppError> {
            match value {
                None => Ok(None),
                Some(v) => non_blank(Some(v))
                    .map(|v| Some(v.to_string()))
                    .ok_or_else(|| AppError::Validation(format!("{} cannot be empty", field))),
            }
        }
        fn reference(field: &str, value: &Option<String>) -> Result<Option<Uuid>, AppError> {
            value.as_deref().map(|v| parse_reference(field, v)).transpose()
        }

        let changes = JobChanges {
            title: text("title", &self.title)?,
            description: text("description", &self.description)?,
            location: text("location", &self.location)?,
            salary: self.salary.as_ref().map(parse_salary).transpose()?,
            category_id: reference("category", &self.category)?,
            company_id: reference("company", &self.company)?,
            job_type_id: reference("jobType", &self.job_type)?,
        };

        if changes.is_empty() {
            return Err(AppError::Validation("No changes supplied".to_string()));
        }
        Ok(changes)
    }
}

/// Runs job writes against a [`JobStore`].
#[derive(Clone)]
pub struct JobService {
    store: Arc<dyn JobStore>,
    generator: Arc<dyn DescriptionGenerator>,
}

impl JobService {
    pub fn new(store: Arc<dyn JobStore>, generator: Arc<dyn DescriptionGenerator>) -> Self {
        Self { store, generator }
    }

    /// Creates a job and increments the job count of its category, company
    /// and job type, all or nothing.
    ///
    /// Validation and description generation happen before the transaction
    /// opens, so their failures never touch the store.
    pub async fn create_job(&self, caller: &Caller, input: &CreateJobInput) -> Result<Job, AppError> {
        caller.require_manager()?;
        let draft = input.validate()?;

        let description = resolve_description(
            draft.description.as_deref(),
            self.generator.as_ref(),
            &draft.details(),
            EntityKind::Job,
        )
        .await?;

        let new_job = NewJob {
            title: draft.title,
            description,
            location: draft.location,
            salary: draft.salary,
            category_id: draft.category_id,
            company_id: draft.company_id,
            job_type_id: draft.job_type_id,
            created_by: caller.id,
        };

        let mut tx = self.store.begin().await?;
        let outcome = insert_and_count(tx.as_mut(), &new_job).await;
        let job = finish(tx, outcome).await?;

        tracing::info!(job_id = %job.id, title = %job.title, "job created");
        Ok(job)
    }

    /// Applies a partial update. Changed references move the job counts
    /// from the old parent to the new one in the same transaction.
    pub async fn update_job(
        &self,
        caller: &Caller,
        id: Uuid,
        input: &UpdateJobInput,
    ) -> Result<Job, AppError> {
        caller.require_manager()?;
        let changes = input.validate()?;

        let mut tx = self.store.begin().await?;
        let outcome = update_and_recount(tx.as_mut(), id, &changes).await;
        let job = finish(tx, outcome).await?;

        tracing::info!(job_id = %job.id, "job updated");
        Ok(job)
    }

    /// Deletes a job and decrements the job count of its three parents.
    pub async fn delete_job(&self, caller: &Caller, id: Uuid) -> Result<Job, AppError> {
        caller.require_manager()?;

        let mut tx = self.store.begin().await?;
        let outcome = delete_and_uncount(tx.as_mut(), id).await;
        let job = finish(tx, outcome).await?;

        tracing::info!(job_id = %job.id, "job deleted");
        Ok(job)
    }
}

async fn insert_and_count(tx: &mut dyn JobTransaction, new_job: &NewJob) -> Result<Job, AppError> {
    let job = tx
        .insert_job(new_job)
        .await
        .map_err(|e| AppError::transaction("inserting job", e))?;

    for parent in Parent::ALL {
        let count = tx
            .adjust_job_count(parent, parent.of_job(&job), 1)
            .await
            .map_err(|e| AppError::transaction(parent.increment_step(), e))?;
        tracing::debug!(parent = parent.label(), job_count = count, "job count incremented");
    }

    Ok(job)
}

async fn update_and_recount(
    tx: &mut dyn JobTransaction,
    id: Uuid,
    changes: &JobChanges,
) -> Result<Job, AppError> {
    let before = tx
        .lock_job(id)
        .await
        .and_then(|job| job.ok_or_else(|| AppError::NotFound(format!("Job {}", id))))
        .map_err(|e| AppError::transaction("loading job", e))?;

    let after = tx
        .update_job(id, changes)
        .await
        .map_err(|e| AppError::transaction("updating job", e))?;

    for (parent, parent_id, delta) in counter_moves(&before, changes) {
        let step = if delta < 0 {
            parent.decrement_step()
        } else {
            parent.increment_step()
        };
        tx.adjust_job_count(parent, parent_id, delta)
            .await
            .map_err(|e| AppError::transaction(step, e))?;
    }

    Ok(after)
}

/// Counter adjustments implied by an update, sorted by `(parent, id)` so
/// that concurrent moves lock parent rows in the same order.
fn counter_moves(before: &Job, changes: &JobChanges) -> Vec<(Parent, Uuid, i64)> {
    let mut moves = Vec::new();
    for parent in Parent::ALL {
        let old = parent.of_job(before);
        if let Some(new) = parent.in_changes(changes).filter(|new| *new != old) {
            moves.push((parent, old, -1));
            moves.push((parent, new, 1));
        }
    }
    moves.sort_by_key(|&(parent, id, _)| (parent, id));
    moves
}

async fn delete_and_uncount(tx: &mut dyn JobTransaction, id: Uuid) -> Result<Job, AppError> {
    let job = tx
        .delete_job(id)
        .await
        .and_then(|job| job.ok_or_else(|| AppError::NotFound(format!("Job {}", id))))
        .map_err(|e| AppError::transaction("deleting job", e))?;

    for parent in Parent::ALL {
        tx.adjust_job_count(parent, parent.of_job(&job), -1)
            .await
            .map_err(|e| AppError::transaction(parent.decrement_step(), e))?;
    }

    Ok(job)
}

/// Commits on success, rolls back on failure.
async fn finish<T>(tx: Box<dyn JobTransaction>, outcome: Result<T, AppError>) -> Result<T, AppError> {
    match outcome {
        Ok(value) => {
            tx.commit()
                .await
                .map_err(|e| AppError::transaction("committing", e))?;
            Ok(value)
        }
        Err(err) => {
            tracing::warn!("rolling back job transaction: {}", err);
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!("rollback failed: {}", rollback_err);
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Debug, Clone, Default)]
    struct Snapshot {
        jobs: HashMap<Uuid, Job>,
        counts: HashMap<(Parent, Uuid), i64>,
    }

    #[derive(Default)]
    struct MemoryStore {
        committed: Arc<Mutex<Snapshot>>,
        fail_increment_on: Option<Parent>,
        begun: AtomicUsize,
    }

    impl MemoryStore {
        fn with_parents(category: Uuid, company: Uuid, job_type: Uuid) -> Self {
            let store = MemoryStore::default();
            {
                let mut snap = store.committed.lock().unwrap();
                snap.counts.insert((Parent::Category, category), 0);
                snap.counts.insert((Parent::Company, company), 0);
                snap.counts.insert((Parent::JobType, job_type), 0);
            }
            store
        }

        fn count(&self, parent: Parent, id: Uuid) -> i64 {
            self.committed.lock().unwrap().counts[&(parent, id)]
        }

        fn job_total(&self) -> usize {
            self.committed.lock().unwrap().jobs.len()
        }

        fn add_parent(&self, parent: Parent, id: Uuid) {
            self.committed.lock().unwrap().counts.insert((parent, id), 0);
        }
    }

    struct MemoryTx {
        working: Snapshot,
        committed: Arc<Mutex<Snapshot>>,
        fail_increment_on: Option<Parent>,
    }

    #[async_trait]
    impl JobStore for MemoryStore {
        async fn begin(&self) -> Result<Box<dyn JobTransaction>, AppError> {
            self.begun.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(MemoryTx {
                working: self.committed.lock().unwrap().clone(),
                committed: Arc::clone(&self.committed),
                fail_increment_on: self.fail_increment_on,
            }))
        }
    }

    #[async_trait]
    impl JobTransaction for MemoryTx {
        async fn insert_job(&mut self, job: &NewJob) -> Result<Job, AppError> {
            for parent in Parent::ALL {
                let id = match parent {
                    Parent::Category => job.category_id,
                    Parent::Company => job.company_id,
                    Parent::JobType => job.job_type_id,
                };
                if !self.working.counts.contains_key(&(parent, id)) {
                    return Err(AppError::NotFound(format!("{} {}", parent.label(), id)));
                }
            }
            let now = Utc::now();
            let row = Job {
                id: Uuid::new_v4(),
                title: job.title.clone(),
                description: job.description.clone(),
                location: job.location.clone(),
                salary: job.salary,
                category_id: job.category_id,
                company_id: job.company_id,
                job_type_id: job.job_type_id,
                created_by: job.created_by,
                created_at: now,
                updated_at: now,
            };
            self.working.jobs.insert(row.id, row.clone());
            Ok(row)
        }

        async fn lock_job(&mut self, id: Uuid) -> Result<Option<Job>, AppError> {
            Ok(self.working.jobs.get(&id).cloned())
        }

        async fn update_job(&mut self, id: Uuid, changes: &JobChanges) -> Result<Job, AppError> {
            let job = self
                .working
                .jobs
                .get_mut(&id)
                .ok_or_else(|| AppError::NotFound(format!("Job {}", id)))?;
            if let Some(v) = &changes.title {
                job.title = v.clone();
            }
            if let Some(v) = changes.salary {
                job.salary = v;
            }
            if let Some(v) = changes.category_id {
                job.category_id = v;
            }
            if let Some(v) = changes.company_id {
                job.company_id = v;
            }
            if let Some(v) = changes.job_type_id {
                job.job_type_id = v;
            }
            job.updated_at = Utc::now();
            Ok(job.clone())
        }

        async fn delete_job(&mut self, id: Uuid) -> Result<Option<Job>, AppError> {
            Ok(self.working.jobs.remove(&id))
        }

        async fn adjust_job_count(
            &mut self,
            parent: Parent,
            id: Uuid,
            delta: i64,
        ) -> Result<i64, AppError> {
            if delta > 0 && self.fail_increment_on == Some(parent) {
                return Err(AppError::DatabaseError(sqlx::Error::PoolTimedOut));
            }
            let count = self
                .working
                .counts
                .get_mut(&(parent, id))
                .ok_or_else(|| AppError::NotFound(format!("{} {}", parent.label(), id)))?;
            if *count + delta < 0 {
                return Err(AppError::Conflict(format!(
                    "{} {} job count would drop below zero",
                    parent.label(),
                    id
                )));
            }
            *count += delta;
            Ok(*count)
        }

        async fn commit(self: Box<Self>) -> Result<(), AppError> {
            let MemoryTx {
                working, committed, ..
            } = *self;
            *committed.lock().unwrap() = working;
            Ok(())
        }

        async fn rollback(self: Box<Self>) -> Result<(), AppError> {
            Ok(())
        }
    }

    struct FixedGenerator {
        calls: AtomicUsize,
        result: Result<&'static str, fn() -> AppError>,
    }

    impl FixedGenerator {
        fn ok(text: &'static str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                result: Ok(text),
            }
        }

        fn quota() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                result: Err(|| AppError::QuotaExceeded),
            }
        }
    }

    #[async_trait]
    impl DescriptionGenerator for FixedGenerator {
        async fn generate(&self, _details: &Value, _kind: EntityKind) -> Result<String, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.result {
                Ok(text) => Ok(text.to_string()),
                Err(make) => Err(make()),
            }
        }
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        generator: Arc<FixedGenerator>,
        service: JobService,
        category: Uuid,
        company: Uuid,
        job_type: Uuid,
    }

    fn fixture_with(store: MemoryStore, generator: FixedGenerator, ids: (Uuid, Uuid, Uuid)) -> Fixture {
        let store = Arc::new(store);
        let generator = Arc::new(generator);
        let service = JobService::new(store.clone(), generator.clone());
        Fixture {
            store,
            generator,
            service,
            category: ids.0,
            company: ids.1,
            job_type: ids.2,
        }
    }

    fn fixture() -> Fixture {
        let ids = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        fixture_with(
            MemoryStore::with_parents(ids.0, ids.1, ids.2),
            FixedGenerator::ok("A generated description."),
            ids,
        )
    }

    fn admin() -> Caller {
        Caller {
            id: Uuid::new_v4(),
            role: Role::Admin,
        }
    }

    fn input(f: &Fixture, salary: Value) -> CreateJobInput {
        CreateJobInput {
            title: Some("Backend Engineer".to_string()),
            company: Some(f.company.to_string()),
            category: Some(f.category.to_string()),
            location: Some("Remote".to_string()),
            salary: Some(salary),
            job_type: Some(f.job_type.to_string()),
            description: None,
        }
    }

    fn assert_counts(f: &Fixture, expected: i64) {
        assert_eq!(f.store.count(Parent::Category, f.category), expected);
        assert_eq!(f.store.count(Parent::Company, f.company), expected);
        assert_eq!(f.store.count(Parent::JobType, f.job_type), expected);
    }

    #[tokio::test]
    async fn test_create_increments_all_three_counters() {
        let f = fixture();
        let job = f
            .service
            .create_job(&admin(), &input(&f, json!(50000)))
            .await
            .unwrap();

        assert_eq!(job.location, "Remote");
        assert_eq!(job.salary, 50000.0);
        assert_eq!(job.description, "A generated description.");
        assert_eq!(f.store.job_total(), 1);
        assert_counts(&f, 1);
    }

    #[tokio::test]
    async fn test_numeric_string_salary_is_accepted() {
        let f = fixture();
        let job = f
            .service
            .create_job(&admin(), &input(&f, json!("72000.50")))
            .await
            .unwrap();
        assert_eq!(job.salary, 72000.5);
    }

    #[tokio::test]
    async fn test_non_positive_salary_is_rejected_before_the_store() {
        let f = fixture();
        for salary in [json!(0), json!(-10), json!("abc"), json!(true), Value::Null] {
            let err = f
                .service
                .create_job(&admin(), &input(&f, salary))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
        assert_eq!(f.store.begun.load(Ordering::SeqCst), 0);
        assert_eq!(f.store.job_total(), 0);
        assert_counts(&f, 0);
    }

    #[tokio::test]
    async fn test_missing_fields_are_listed() {
        let f = fixture();
        let mut payload = input(&f, json!(100));
        payload.title = Some("  ".to_string());
        payload.job_type = None;
        let err = f.service.create_job(&admin(), &payload).await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("All fields are required"));
        assert!(msg.contains("title"));
        assert!(msg.contains("jobType"));
        assert_eq!(f.store.begun.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_category_increment_rolls_everything_back() {
        let ids = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut store = MemoryStore::with_parents(ids.0, ids.1, ids.2);
        store.fail_increment_on = Some(Parent::Category);
        let f = fixture_with(store, FixedGenerator::ok("desc"), ids);

        let err = f
            .service
            .create_job(&admin(), &input(&f, json!(50000)))
            .await
            .unwrap_err();

        match &err {
            AppError::TransactionFailure { step, .. } => {
                assert_eq!(*step, "incrementing category job count")
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(f.store.job_total(), 0);
        assert_counts(&f, 0);
    }

    #[tokio::test]
    async fn test_missing_reference_aborts_the_transaction() {
        let f = fixture();
        let mut payload = input(&f, json!(50000));
        payload.company = Some(Uuid::new_v4().to_string());

        let err = f.service.create_job(&admin(), &payload).await.unwrap_err();
        assert!(matches!(err, AppError::TransactionFailure { .. }));
        assert!(matches!(err.root_cause(), AppError::NotFound(_)));
        assert_eq!(f.store.job_total(), 0);
        assert_counts(&f, 0);
    }

    #[tokio::test]
    async fn test_generation_failure_opens_no_transaction() {
        let ids = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let f = fixture_with(
            MemoryStore::with_parents(ids.0, ids.1, ids.2),
            FixedGenerator::quota(),
            ids,
        );

        let err = f
            .service
            .create_job(&admin(), &input(&f, json!(50000)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::QuotaExceeded));
        assert_eq!(f.store.begun.load(Ordering::SeqCst), 0);
        assert_counts(&f, 0);
    }

    #[tokio::test]
    async fn test_supplied_description_skips_generation() {
        let f = fixture();
        let mut payload = input(&f, json!(50000));
        payload.description = Some("Written by hand".to_string());

        let job = f.service.create_job(&admin(), &payload).await.unwrap();
        assert_eq!(job.description, "Written by hand");
        assert_eq!(f.generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_standard_users_may_not_create_jobs() {
        let f = fixture();
        let caller = Caller {
            id: Uuid::new_v4(),
            role: Role::Standard,
        };
        let err = f
            .service
            .create_job(&caller, &input(&f, json!(50000)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert_eq!(f.store.begun.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_delete_decrements_all_three_counters() {
        let f = fixture();
        let caller = admin();
        let first = f.service.create_job(&caller, &input(&f, json!(1000))).await.unwrap();
        f.service.create_job(&caller, &input(&f, json!(2000))).await.unwrap();
        assert_counts(&f, 2);

        let deleted = f.service.delete_job(&caller, first.id).await.unwrap();
        assert_eq!(deleted.id, first.id);
        assert_eq!(f.store.job_total(), 1);
        assert_counts(&f, 1);
    }

    #[tokio::test]
    async fn test_delete_missing_job_is_not_found() {
        let f = fixture();
        let err = f.service.delete_job(&admin(), Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err.root_cause(), AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_moves_category_counter() {
        let f = fixture();
        let caller = admin();
        let other_category = Uuid::new_v4();
        f.store.add_parent(Parent::Category, other_category);

        let job = f.service.create_job(&caller, &input(&f, json!(1000))).await.unwrap();
        let update = UpdateJobInput {
            category: Some(other_category.to_string()),
            salary: Some(json!(1500)),
            ..Default::default()
        };
        let updated = f.service.update_job(&caller, job.id, &update).await.unwrap();

        assert_eq!(updated.category_id, other_category);
        assert_eq!(updated.salary, 1500.0);
        assert_eq!(f.store.count(Parent::Category, f.category), 0);
        assert_eq!(f.store.count(Parent::Category, other_category), 1);
        assert_eq!(f.store.count(Parent::Company, f.company), 1);
    }

    #[tokio::test]
    async fn test_update_to_missing_parent_leaves_job_untouched() {
        let f = fixture();
        let caller = admin();
        let job = f.service.create_job(&caller, &input(&f, json!(1000))).await.unwrap();

        let update = UpdateJobInput {
            company: Some(Uuid::new_v4().to_string()),
            title: Some("Renamed".to_string()),
            ..Default::default()
        };
        let err = f.service.update_job(&caller, job.id, &update).await.unwrap_err();
        assert!(matches!(err.root_cause(), AppError::NotFound(_)));

        let snap = f.store.committed.lock().unwrap();
        assert_eq!(snap.jobs[&job.id].title, "Backend Engineer");
        assert_eq!(snap.counts[&(Parent::Company, f.company)], 1);
    }

    #[tokio::test]
    async fn test_opposite_moves_touch_parents_in_the_same_order() {
        let f = fixture();
        let caller = admin();
        let (x, y) = (Uuid::new_v4(), Uuid::new_v4());
        f.store.add_parent(Parent::Category, x);
        f.store.add_parent(Parent::Category, y);

        let mut a = f.service.create_job(&caller, &input(&f, json!(1000))).await.unwrap();
        let mut b = a.clone();
        a.category_id = x;
        b.category_id = y;

        let to_y = JobChanges {
            category_id: Some(y),
            company_id: Some(a.company_id),
            ..Default::default()
        };
        let to_x = JobChanges {
            category_id: Some(x),
            ..Default::default()
        };

        let order = |moves: Vec<(Parent, Uuid, i64)>| -> Vec<(Parent, Uuid)> {
            moves.into_iter().map(|(p, id, _)| (p, id)).collect()
        };
        let a_moves = counter_moves(&a, &to_y);
        let b_moves = counter_moves(&b, &to_x);
        assert_eq!(a_moves.len(), 2);
        assert_eq!(order(a_moves.clone()), order(b_moves.clone()));
        assert!(a_moves.contains(&(Parent::Category, x, -1)));
        assert!(b_moves.contains(&(Parent::Category, x, 1)));
    }

    #[test]
    fn test_update_validation() {
        assert!(UpdateJobInput::default().validate().is_err());

        let bad_salary = UpdateJobInput {
            salary: Some(json!(-1)),
            ..Default::default()
        };
        assert!(bad_salary.validate().is_err());

        let blank_title = UpdateJobInput {
            title: Some(" ".to_string()),
            ..Default::default()
        };
        assert!(blank_title.validate().is_err());
    }

    #[test]
    fn test_parse_salary() {
        assert_eq!(parse_salary(&json!(50000)).unwrap(), 50000.0);
        assert_eq!(parse_salary(&json!(" 12.5 ")).unwrap(), 12.5);
        assert!(parse_salary(&json!(0)).is_err());
        assert!(parse_salary(&json!("NaN")).is_err());
        assert!(parse_salary(&json!("inf")).is_err());
        assert!(parse_salary(&json!([1])).is_err());
    }
}
