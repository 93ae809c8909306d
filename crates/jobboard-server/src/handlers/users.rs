use axum::extract::State;
use axum::Extension;
use jobboard_core::error::AppError;
use jobboard_core::models::{Caller, UserChanges, UserDetail};
use jobboard_core::pagination::Page;
use jobboard_db::collections::USERS;
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
    list_collection(&state, &USERS, &params).await
}

pub async fn get(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<UserDetail>> {
    let user = state
        .users
        .get_detail(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {}", id)))?;
    Ok(Json(user))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(changes): Json<UserChanges>,
) -> Result<Json<Value>> {
    changes.authorize(&caller, id)?;
    changes.validate()?;

    let user = state
        .users
        .update(id, &changes)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {}", id)))?;
    tracing::info!(user_id = %user.id, by = %caller.id, "user updated");
    Ok(Json(json!({ "message": "User updated successfully", "user": user })))
}

/// Soft delete: the account stays but can no longer log in.
pub async fn terminate(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>> {
    if caller.id == id {
        return Err(AppError::Validation("You cannot terminate your own account".to_string()).into());
    }
    let user = state
        .users
        .terminate(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {}", id)))?;
    Ok(Json(json!({ "message": "User terminated successfully", "user": user })))
}
