use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use jobboard_core::describe::{resolve_description, EntityKind};
use jobboard_core::error::AppError;
use jobboard_core::models::{non_blank, Caller, Category, CategoryInput, WithJobs};
use jobboard_core::pagination::Page;
use jobboard_db::collections::CATEGORIES;
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
    list_collection(&state, &CATEGORIES, &params).await
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WithJobs<Category>>> {
    let category = state
        .categories
        .get_detail(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Category {}", id)))?;
    Ok(Json(category))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(input): Json<CategoryInput>,
) -> Result<(StatusCode, Json<Category>)> {
    let name = required("Name", input.name.as_deref())?;
    let description = resolve_description(
        input.description.as_deref(),
        state.generator.as_ref(),
        &json!({ "name": name }),
        EntityKind::Category,
    )
    .await?;

    let category = state.categories.create(&name, &description, caller.id).await?;
    tracing::info!(category_id = %category.id, name = %category.name, "category created");
    Ok((StatusCode::CREATED, Json(category)))
}

/// Blank fields keep their current value.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<CategoryInput>,
) -> Result<Json<Category>> {
    let category = state
        .categories
        .update(
            id,
            non_blank(input.name.as_deref()),
            non_blank(input.description.as_deref()),
        )
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Category {}", id)))?;
    Ok(Json(category))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Value>> {
    state.categories.delete(id).await?;
    Ok(Json(json!({ "message": "Category deleted successfully" })))
}
