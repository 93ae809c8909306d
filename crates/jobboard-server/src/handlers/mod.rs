pub mod auth;
pub mod categories;
pub mod companies;
pub mod describe;
pub mod job_types;
pub mod jobs;
pub mod media;
pub mod probes;
pub mod users;

use jobboard_core::error::AppError;
use jobboard_core::models::non_blank;
use jobboard_core::pagination::{paginate, Page};
use jobboard_db::{Collection, PgCollection};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::Result;
use crate::extract::Json;
use crate::params::list_request;
use crate::state::AppState;

/// Shared body of every `GET /<collection>` handler.
pub(crate) async fn list_collection(
    state: &AppState,
    collection: &'static Collection,
    params: &HashMap<String, String>,
) -> Result<Json<Page<Value>>> {
    let (query, page) = list_request(collection, params, &state.pagination)?;
    let source = PgCollection::new(state.pool.clone(), collection);
    Ok(Json(paginate(&source, &query, page).await?))
}

/// Trimmed value of a required text field.
pub(crate) fn required(field: &str, value: Option<&str>) -> std::result::Result<String, AppError> {
    non_blank(value)
        .map(str::to_string)
        .ok_or_else(|| AppError::Validation(format!("{} is required", field)))
}
