use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use jobboard_core::error::AppError;
use jobboard_core::models::Caller;

use crate::auth::bearer_token;
use crate::error::Result;
use crate::state::AppState;

/// Guards mutating routes: requires a valid bearer token for an active
/// admin or super-admin, and makes the [`Caller`] available to the handler.
///
/// The role is read from the user row, not the token, so demotions apply
/// immediately.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let token = bearer_token(header)?;
    let claims = state.tokens.verify(token)?;

    let user = state
        .users
        .get(claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("user no longer exists".to_string()))?;
    if !user.is_active {
        tracing::warn!(user_id = %user.id, "inactive user presented a token");
        return Err(AppError::Unauthorized("account is deactivated".to_string()).into());
    }

    let caller = Caller {
        id: user.id,
        role: user.role,
    };
    caller.require_manager()?;

    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}
