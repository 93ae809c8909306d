use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use jobboard_core::describe::{resolve_description, EntityKind};
use jobboard_core::error::AppError;
use jobboard_core::models::{non_blank, Caller, Company, CompanyInput, WithJobs};
use jobboard_core::pagination::Page;
use jobboard_db::collections::COMPANIES;
use jobboard_db::CompanyFields;
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
    list_collection(&state, &COMPANIES, &params).await
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WithJobs<Company>>> {
    let company = state
        .companies
        .get_detail(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Company {}", id)))?;
    Ok(Json(company))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(input): Json<CompanyInput>,
) -> Result<(StatusCode, Json<Company>)> {
    let name = required("Name", input.name.as_deref())?;
    let website = non_blank(input.website.as_deref());
    let logo = non_blank(input.logo.as_deref());

    let description = resolve_description(
        input.description.as_deref(),
        state.generator.as_ref(),
        &json!({ "name": name, "website": website }),
        EntityKind::Company,
    )
    .await?;

    let company = state
        .companies
        .create(&name, &description, website, logo, caller.id)
        .await?;
    tracing::info!(company_id = %company.id, name = %company.name, "company created");
    Ok((StatusCode::CREATED, Json(company)))
}

/// Blank fields keep their current value.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<CompanyInput>,
) -> Result<Json<Company>> {
    let fields = CompanyFields {
        name: non_blank(input.name.as_deref()),
        description: non_blank(input.description.as_deref()),
        website: non_blank(input.website.as_deref()),
        logo: non_blank(input.logo.as_deref()),
    };
    let company = state
        .companies
        .update(id, fields)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Company {}", id)))?;
    Ok(Json(company))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Value>> {
    state.companies.delete(id).await?;
    Ok(Json(json!({ "message": "Company deleted successfully" })))
}
