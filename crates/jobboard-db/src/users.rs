use jobboard_core::error::AppError;
use jobboard_core::models::{NewUser, User, UserChanges, UserDetail};
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str =
    "id, name, email, password_hash, role, is_active, created_at, updated_at";

/// Users are never deleted, only deactivated.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Emails are unique ignoring case; a duplicate fails with `Conflict`.
    pub async fn create(&self, user: &NewUser) -> Result<User, AppError> {
        let query = format!(
            "INSERT INTO users (name, email, password_hash, role) VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match AppError::from_db(e) {
                AppError::Conflict(_) => {
                    AppError::Conflict("User already exists in this email.".to_string())
                }
                other => other,
            })
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let query = format!(
            "SELECT {} FROM users WHERE lower(email) = lower($1)",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&query)
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }

    /// The user with counts of the jobs, categories and companies they created.
    pub async fn get_detail(&self, id: Uuid) -> Result<Option<UserDetail>, AppError> {
        sqlx::query_as::<_, UserDetail>(
            r#"
            SELECT
                u.id, u.name, u.email, u.password_hash, u.role, u.is_active,
                u.created_at, u.updated_at,
                (SELECT COUNT(*) FROM jobs WHERE created_by = u.id) AS jobs_created,
                (SELECT COUNT(*) FROM categories WHERE created_by = u.id) AS categories_created,
                (SELECT COUNT(*) FROM companies WHERE created_by = u.id) AS companies_created
            FROM users u
            WHERE u.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::DatabaseError)
    }

    /// `None` fields keep the current value.
    pub async fn update(&self, id: Uuid, changes: &UserChanges) -> Result<Option<User>, AppError> {
        let query = format!(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                role = COALESCE($4, role),
                is_active = COALESCE($5, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(changes.name.as_deref().map(str::trim))
            .bind(changes.email.as_deref().map(str::trim))
            .bind(changes.role)
            .bind(changes.is_active)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from_db)
    }

    /// Marks the user inactive. Their tokens stop working immediately.
    pub async fn terminate(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let query = format!(
            "UPDATE users SET is_active = FALSE, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;

        if user.is_some() {
            tracing::info!(user_id = %id, "user terminated");
        }
        Ok(user)
    }
}
