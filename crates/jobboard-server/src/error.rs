//! Maps [`AppError`] to HTTP responses of the form `{"error": "<message>"}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use jobboard_core::error::AppError;
use serde_json::json;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

/// Status code for an error. Transaction failures take the status of their
/// cause when the caller is to blame.
pub fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::Validation(_) => StatusCode::BAD_REQUEST,
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::Conflict(_) => StatusCode::CONFLICT,
        AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        AppError::Forbidden(_) => StatusCode::FORBIDDEN,
        AppError::TransactionFailure { .. } if err.is_client_error() => {
            status_for(err.root_cause())
        }
        AppError::DatabaseError(
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_),
        ) => StatusCode::SERVICE_UNAVAILABLE,
        AppError::QuotaExceeded => StatusCode::TOO_MANY_REQUESTS,
        AppError::GenerationFailed(_)
        | AppError::ClientError(_)
        | AppError::NetworkError(_)
        | AppError::Timeout(_)
        | AppError::EmptyResponse => StatusCode::BAD_GATEWAY,
        AppError::TransactionFailure { .. }
        | AppError::QueryFailure(_)
        | AppError::DatabaseError(_)
        | AppError::SerializationError(_)
        | AppError::Config(_)
        | AppError::Generic(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "request failed: {}", self.0);
        } else {
            tracing::debug!(status = status.as_u16(), "request rejected: {}", self.0);
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors() {
        assert_eq!(status_for(&AppError::Validation("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&AppError::NotFound("Job 1".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&AppError::Conflict("dup".into())), StatusCode::CONFLICT);
        assert_eq!(
            status_for(&AppError::Unauthorized("no token".into())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(status_for(&AppError::Forbidden("role".into())), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_transaction_failure_uses_cause() {
        let missing = AppError::transaction(
            "incrementing company job count",
            AppError::NotFound("Company 9".into()),
        );
        assert_eq!(status_for(&missing), StatusCode::NOT_FOUND);

        let broken = AppError::transaction(
            "inserting job",
            AppError::DatabaseError(sqlx::Error::RowNotFound),
        );
        assert_eq!(status_for(&broken), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_infrastructure_errors() {
        assert_eq!(
            status_for(&AppError::QueryFailure("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(&AppError::DatabaseError(sqlx::Error::PoolTimedOut)),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(status_for(&AppError::QuotaExceeded), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(status_for(&AppError::Timeout(30)), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_response_status() {
        let response = ApiError(AppError::Validation("Name is required".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
