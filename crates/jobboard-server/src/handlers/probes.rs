use axum::extract::State;
use jobboard_core::error::AppError;

use crate::error::Result;
use crate::state::AppState;

pub async fn livez() -> Result<()> {
    tracing::debug!("service is live");
    Ok(())
}

pub async fn healthz(State(state): State<AppState>) -> Result<()> {
    sqlx::query("select 1")
        .execute(&state.pool)
        .await
        .map_err(AppError::DatabaseError)?;
    tracing::debug!("service is healthy");
    Ok(())
}
