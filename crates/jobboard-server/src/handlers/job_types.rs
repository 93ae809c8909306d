use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use jobboard_core::describe::{resolve_description, EntityKind};
use jobboard_core::error::AppError;
use jobboard_core::models::{non_blank, Caller, JobType, JobTypeInput, WithJobs};
use jobboard_core::pagination::Page;
use jobboard_db::collections::JOB_TYPES;
use serde_json::{json, Value};
use std::collections::HashMap;
use uuid::Uuid;

use super::{list_collection, required};
use crate::error::Result;
use crate::extract::{Json, Path, Query};
use crate::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Page<Value>>> {
    list_collection(&state, &JOB_TYPES, &params).await
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WithJobs<JobType>>> {
    let job_type = state
        .job_types
        .get_detail(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("JobType {}", id)))?;
    Ok(Json(job_type))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(input): Json<JobTypeInput>,
) -> Result<(StatusCode, Json<JobType>)> {
    let name = required("Name", input.name.as_deref())?;
    let description = resolve_description(
        input.description.as_deref(),
        state.generator.as_ref(),
        &json!({ "name": name }),
        EntityKind::JobType,
    )
    .await?;

    let job_type = state.job_types.create(&name, &description, caller.id).await?;
    tracing::info!(job_type_id = %job_type.id, name = %job_type.name, "job type created");
    Ok((StatusCode::CREATED, Json(job_type)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<JobTypeInput>,
) -> Result<Json<JobType>> {
    let job_type = state
        .job_types
        .update(
            id,
            non_blank(input.name.as_deref()),
            non_blank(input.description.as_deref()),
        )
        .await?
        .ok_or_else(|| AppError::NotFound(format!("JobType {}", id)))?;
    Ok(Json(job_type))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Value>> {
    state.job_types.delete(id).await?;
    Ok(Json(json!({ "message": "Job type deleted successfully" })))
}
