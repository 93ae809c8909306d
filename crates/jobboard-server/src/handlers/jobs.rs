use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use jobboard_core::error::AppError;
use jobboard_core::jobs::{CreateJobInput, UpdateJobInput};
use jobboard_core::models::{Caller, Job, JobDetail};
use jobboard_core::pagination::Page;
use jobboard_db::collections::JOBS;
use serde_json::{json, Value};
use std::collections::HashMap;
use uuid::Uuid;

use super::list_collection;
use crate::error::Result;
use crate::extract::{Json, Path, Query};
use crate::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Page<Value>>> {
    list_collection(&state, &JOBS, &params).await
}

pub async fn get(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<JobDetail>> {
    let job = state
        .job_reads
        .get_detail(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {}", id)))?;
    Ok(Json(job))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(input): Json<CreateJobInput>,
) -> Result<(StatusCode, Json<Job>)> {
    let job = state.jobs.create_job(&caller, &input).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateJobInput>,
) -> Result<Json<Job>> {
    let job = state.jobs.update_job(&caller, id, &input).await?;
    Ok(Json(job))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>> {
    let job = state.jobs.delete_job(&caller, id).await?;
    Ok(Json(json!({ "message": "Job deleted successfully", "job": job })))
}
