use axum::extract::State;
use jobboard_core::describe::{resolve_description, EntityKind};
use jobboard_core::error::AppError;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::Result;
use crate::extract::Json;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeInput {
    pub entity_details: Option<Value>,
    pub entity_type: Option<EntityKind>,
}

impl DescribeInput {
    fn validate(self) -> std::result::Result<(Value, EntityKind), AppError> {
        let missing = || AppError::Validation("Entity details and type are required".to_string());
        let details = self
            .entity_details
            .filter(|d| d.as_object().is_some_and(|o| !o.is_empty()))
            .ok_or_else(missing)?;
        let kind = self.entity_type.ok_or_else(missing)?;
        Ok((details, kind))
    }
}

/// Generates a description on demand, e.g. to preview it in a form.
pub async fn generate(
    State(state): State<AppState>,
    Json(input): Json<DescribeInput>,
) -> Result<Json<Value>> {
    let (details, kind) = input.validate()?;
    let description =
        resolve_description(None, state.generator.as_ref(), &details, kind).await?;
    Ok(Json(json!({ "description": description })))
}
