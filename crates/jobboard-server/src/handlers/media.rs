use axum::extract::State;
use axum::http::StatusCode;
use jobboard_core::error::AppError;
use jobboard_core::models::{Media, NewMedia};
use jobboard_core::pagination::Page;
use jobboard_db::collections::MEDIA;
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
    list_collection(&state, &MEDIA, &params).await
}

pub async fn get(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Media>> {
    let media = state
        .media
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Media {}", id)))?;
    Ok(Json(media))
}

/// Records an already processed upload.
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<NewMedia>,
) -> Result<(StatusCode, Json<Media>)> {
    let locations = [
        ("original", &input.original),
        ("thumbnail", &input.thumbnail),
        ("mobile", &input.mobile),
        ("tablet", &input.tablet),
        ("desktop", &input.desktop),
    ];
    if let Some((field, _)) = locations.iter().find(|(_, v)| v.trim().is_empty()) {
        return Err(AppError::Validation(format!("{} is required", field)).into());
    }

    let media = state.media.create(&input).await?;
    Ok((StatusCode::CREATED, Json(media)))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Value>> {
    let media = state
        .media
        .delete(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Media {}", id)))?;
    Ok(Json(json!({ "message": "Media deleted successfully", "media": media })))
}
