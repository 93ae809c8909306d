use thiserror::Error;

/// Application-wide error types.
///
/// Every failure in jobboard ends up as one of these variants and travels
/// unchanged to the request boundary, where the server maps it to a status
/// code. Nothing here is retried automatically.
///
/// # Error Conversion
///
/// - `sqlx::Error` → `AppError::DatabaseError`
/// - `serde_json::Error` → `AppError::SerializationError`
///
/// Repositories should prefer [`AppError::from_db`], which also recognises
/// unique and foreign-key violations.
///
/// # Examples
///
/// ```no_run
/// use jobboard_core::error::AppError;
///
/// fn example() -> Result<(), AppError> {
///     Err(AppError::Validation("Name is required".to_string()))
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// Database operation failed.
    ///
    /// Connection failures, pool exhaustion and query errors. Treated as
    /// a server-side fault.
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// A required field is missing or a value is out of range.
    ///
    /// Raised before any store mutation is attempted.
    #[error("{0}")]
    Validation(String),

    /// The target entity, or an entity it references, does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The operation would break a uniqueness or dependency rule.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Missing, malformed or expired credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The caller is authenticated but its role does not allow the operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A step of a multi-row job transaction failed and the transaction was
    /// rolled back.
    #[error("Transaction aborted at {step}: {source}")]
    TransactionFailure {
        step: &'static str,
        #[source]
        source: Box<AppError>,
    },

    /// The pagination engine could not read the page slice or the total count.
    #[error("Pagination error: {0}")]
    QueryFailure(String),

    /// The description service rejected or failed the request.
    #[error("Description generation failed: {0}")]
    GenerationFailed(String),

    /// The description service quota or rate limit is exhausted.
    #[error("Description generation quota exceeded. Please check your API usage and billing.")]
    QuotaExceeded,

    /// HTTP client request failed.
    #[error("API Client error: {0}")]
    ClientError(String),

    /// Network or connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Request timeout.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// API response contained no data.
    #[error("Empty response from API")]
    EmptyResponse,

    /// JSON serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Configuration file could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic application error for cases not covered by specific variants.
    ///
    /// Use this sparingly - prefer creating specific error variants.
    #[error("Error: {0}")]
    Generic(String),
}

impl AppError {
    /// Converts a sqlx error, classifying constraint violations.
    ///
    /// SQLSTATE 23505 (unique violation) becomes `Conflict` and 23503
    /// (foreign key violation) becomes `NotFound`, since in this schema it
    /// always means a referenced row is missing or still referenced.
    pub fn from_db(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                Some("23505") => {
                    let what = db_err.constraint().unwrap_or("unique constraint");
                    return AppError::Conflict(format!("duplicate value violates {}", what));
                }
                Some("23503") => {
                    let what = db_err.constraint().unwrap_or("foreign key");
                    return AppError::NotFound(format!("Referenced entity ({})", what));
                }
                _ => {}
            }
        }
        AppError::DatabaseError(err)
    }

    /// Wraps an error raised inside a job transaction.
    pub fn transaction(step: &'static str, source: AppError) -> Self {
        AppError::TransactionFailure {
            step,
            source: Box::new(source),
        }
    }

    /// Returns the innermost error, looking through transaction wrappers.
    pub fn root_cause(&self) -> &AppError {
        match self {
            AppError::TransactionFailure { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Returns true for errors caused by the caller's input rather than by
    /// the service or its dependencies.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self.root_cause(),
            AppError::Validation(_)
                | AppError::NotFound(_)
                | AppError::Conflict(_)
                | AppError::Unauthorized(_)
                | AppError::Forbidden(_)
        )
    }

    /// Returns a user-friendly error message suitable for CLI output.
    pub fn user_message(&self) -> String {
        match self {
            AppError::DatabaseError(e) => {
                if e.to_string().contains("connection") || matches!(e, sqlx::Error::PoolTimedOut) {
                    "Cannot connect to database. Is PostgreSQL running?\n   Try: docker-compose up -d".to_string()
                } else {
                    format!("Database error: {}", e)
                }
            }
            AppError::GenerationFailed(msg) => {
                if msg.contains("401") || msg.contains("Unauthorized") {
                    "Invalid OpenAI API key.\n   Check your OPENAI_API_KEY environment variable."
                        .to_string()
                } else {
                    format!("Description generation failed: {}", msg)
                }
            }
            AppError::QuotaExceeded => {
                "Description service quota exceeded.\n   Check your OpenAI account billing or write the description yourself.".to_string()
            }
            AppError::NetworkError(msg) => {
                format!("Network error: {}\n   Check your internet connection.", msg)
            }
            AppError::Timeout(secs) => {
                format!("Request timed out after {} seconds.\n   The server may be overloaded. Try again later.", secs)
            }
            AppError::TransactionFailure { step, source } => {
                format!(
                    "Nothing was saved: {} (failed while {}).",
                    source.user_message(),
                    step
                )
            }
            _ => self.to_string(),
        }
    }

    /// Returns true if this error is retryable.
    ///
    /// The service itself never retries; this is a hint for operators and
    /// API consumers.
    ///
    /// # Examples
    ///
    /// ```
    /// use jobboard_core::error::AppError;
    ///
    /// let err = AppError::NetworkError("connection reset".to_string());
    /// assert!(err.is_retryable());
    ///
    /// let err = AppError::Validation("Salary must be a positive number".to_string());
    /// assert!(!err.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::NetworkError(_)
            | AppError::Timeout(_)
            | AppError::QuotaExceeded
            | AppError::ClientError(_) => true,
            AppError::DatabaseError(e) => {
                matches!(e, sqlx::Error::PoolTimedOut | sqlx::Error::Io(_))
            }
            AppError::TransactionFailure { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AppError::NotFound("Category 42".to_string());
        assert_eq!(err.to_string(), "Category 42 not found");
    }

    #[test]
    fn test_validation_message_is_verbatim() {
        let err = AppError::Validation("Salary must be a positive number".to_string());
        assert_eq!(err.to_string(), "Salary must be a positive number");
    }

    #[test]
    fn test_transaction_failure_carries_cause() {
        let err = AppError::transaction(
            "incrementing category job count",
            AppError::NotFound("Category 7".to_string()),
        );
        let msg = err.to_string();
        assert!(msg.contains("incrementing category job count"));
        assert!(msg.contains("Category 7 not found"));
        assert!(matches!(err.root_cause(), AppError::NotFound(_)));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_query_failure_prefix() {
        let err = AppError::QueryFailure("connection refused".to_string());
        assert_eq!(err.to_string(), "Pagination error: connection refused");
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_error_from_serde() {
        let result: Result<serde_json::Value, _> = serde_json::from_str("{ invalid json }");
        let app_err: AppError = result.unwrap_err().into();
        assert!(matches!(app_err, AppError::SerializationError(_)));
    }

    #[test]
    fn test_from_db_passes_through_non_constraint_errors() {
        let err = AppError::from_db(sqlx::Error::RowNotFound);
        assert!(matches!(err, AppError::DatabaseError(sqlx::Error::RowNotFound)));
    }

    #[test]
    fn test_user_message_database_connection() {
        let err = AppError::DatabaseError(sqlx::Error::PoolTimedOut);
        assert!(err.user_message().contains("Cannot connect to database"));
    }

    #[test]
    fn test_user_message_quota() {
        assert!(AppError::QuotaExceeded.user_message().contains("quota exceeded"));
    }

    #[test]
    fn test_is_retryable() {
        assert!(AppError::NetworkError("timeout".to_string()).is_retryable());
        assert!(AppError::Timeout(30).is_retryable());
        assert!(AppError::DatabaseError(sqlx::Error::PoolTimedOut).is_retryable());
        assert!(!AppError::Conflict("dup".to_string()).is_retryable());
        assert!(!AppError::transaction("inserting job", AppError::Validation("x".into()))
            .is_retryable());
    }
}
