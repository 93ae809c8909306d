use axum::extract::State;
use axum::http::StatusCode;
use jobboard_core::error::AppError;
use jobboard_core::models::{looks_like_email, non_blank, NewUser, Role, User};
use serde::{Deserialize, Serialize};

use crate::auth::{hash_password, verify_password};
use crate::error::Result;
use crate::extract::Json;
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 8;

/// Any `role` in the body is ignored; self-registered accounts are
/// always standard users.
#[derive(Debug, Deserialize)]
pub struct RegisterInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

impl RegisterInput {
    /// Returns the trimmed name, email and the raw password.
    pub fn validate(&self) -> std::result::Result<(String, String, String), AppError> {
        let name = non_blank(self.name.as_deref())
            .ok_or_else(|| AppError::Validation("Name is required".to_string()))?;
        let email = non_blank(self.email.as_deref())
            .ok_or_else(|| AppError::Validation("Email is required".to_string()))?;
        if !looks_like_email(email) {
            return Err(AppError::Validation(format!("Invalid email: {}", email)));
        }
        let password = self.password.as_deref().unwrap_or_default();
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        Ok((name.to_string(), email.to_lowercase(), password.to_string()))
    }
}

pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let (name, email, password) = input.validate()?;

    let user = state
        .users
        .create(&NewUser {
            name,
            email,
            password_hash: hash_password(&password)?,
            role: Role::Standard,
        })
        .await?;
    let token = state.tokens.issue(&user)?;

    tracing::info!(user_id = %user.id, "user registered");
    Ok((StatusCode::CREATED, Json(AuthResponse { user, token })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> Result<Json<AuthResponse>> {
    let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

    let email = non_blank(input.email.as_deref()).ok_or_else(invalid)?;
    let password = input.password.as_deref().unwrap_or_default();

    let user = state.users.find_by_email(email).await?.ok_or_else(invalid)?;
    if !verify_password(password, &user.password_hash) {
        return Err(invalid().into());
    }
    if !user.is_active {
        return Err(AppError::Unauthorized("account is deactivated".to_string()).into());
    }

    let token = state.tokens.issue(&user)?;
    tracing::debug!(user_id = %user.id, "user logged in");
    Ok(Json(AuthResponse { user, token }))
}
