//! Persisted entities and the request payloads that create or change them.
//!
//! Field names serialize as camelCase so the JSON matches what the admin
//! console already consumes (`jobCount`, `createdAt`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Caller role. Mutating routes require `Admin` or `SuperAdmin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    #[sqlx(rename = "user")]
    #[serde(rename = "user")]
    Standard,
    Admin,
    SuperAdmin,
}

impl Role {
    /// Admins and super-admins may manage the catalogue.
    pub fn can_manage(self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Standard => "user",
            Role::Admin => "admin",
            Role::SuperAdmin => "super-admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated identity behind a request, as resolved by the auth
/// middleware. The core trusts it without re-checking credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub id: Uuid,
    pub role: Role,
}

impl Caller {
    /// Fails with `Forbidden` unless the caller may manage the catalogue.
    pub fn require_manager(&self) -> Result<(), crate::error::AppError> {
        if self.role.can_manage() {
            Ok(())
        } else {
            Err(crate::error::AppError::Forbidden(format!(
                "role '{}' may not modify the catalogue",
                self.role
            )))
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub salary: f64,
    #[serde(rename = "category")]
    pub category_id: Uuid,
    #[serde(rename = "company")]
    pub company_id: Uuid,
    #[serde(rename = "jobType")]
    pub job_type_id: Uuid,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A job with the names of everything it points at.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JobDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub job: Job,
    pub category_name: String,
    pub company_name: String,
    pub company_website: Option<String>,
    pub job_type_name: String,
    pub created_by_name: Option<String>,
    pub created_by_email: Option<String>,
}

/// Row shape used for the back-reference lists on parent entities.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    pub id: Uuid,
    pub title: String,
    pub location: String,
    pub salary: f64,
    pub category_name: String,
    pub company_name: String,
    pub job_type_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created_by: Uuid,
    pub job_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub website: Option<String>,
    pub logo: Option<String>,
    pub created_by: Uuid,
    pub job_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JobType {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created_by: Uuid,
    pub job_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Name and email of whoever created a record.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Creator {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// A parent entity together with its creator and the jobs pointing at it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithJobs<T> {
    #[serde(flatten)]
    pub entity: T,
    pub created_by_user: Option<Creator>,
    pub jobs: Vec<JobSummary>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user with counts of what they created.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub user: User,
    pub jobs_created: i64,
    pub categories_created: i64,
    pub companies_created: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "media_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    File,
}

/// An uploaded file and its pre-rendered size variants.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub id: Uuid,
    pub original: String,
    pub thumbnail: String,
    pub mobile: String,
    pub tablet: String,
    pub desktop: String,
    pub kind: MediaKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Write payloads
// =============================================================================

/// A validated job ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewJob {
    pub title: String,
    pub description: String,
    pub location: String,
    pub salary: f64,
    pub category_id: Uuid,
    pub company_id: Uuid,
    pub job_type_id: Uuid,
    pub created_by: Uuid,
}

/// A validated partial job update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub salary: Option<f64>,
    pub category_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
    pub job_type_id: Option<Uuid>,
}

impl JobChanges {
    pub fn is_empty(&self) -> bool {
        *self == JobChanges::default()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryInput {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompanyInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub logo: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobTypeInput {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

impl UserChanges {
    /// Only a super-admin may change a role or (re)activate an account, and
    /// nobody may deactivate or demote themselves.
    pub fn authorize(&self, caller: &Caller, target: Uuid) -> Result<(), crate::error::AppError> {
        use crate::error::AppError;

        if (self.role.is_some() || self.is_active.is_some()) && caller.role != Role::SuperAdmin {
            return Err(AppError::Forbidden(
                "only a super-admin may change roles or account status".to_string(),
            ));
        }
        if caller.id == target {
            if self.is_active == Some(false) {
                return Err(AppError::Validation(
                    "You cannot deactivate your own account".to_string(),
                ));
            }
            if self.role.is_some_and(|role| role != caller.role) {
                return Err(AppError::Validation(
                    "You cannot change your own role".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), crate::error::AppError> {
        use crate::error::AppError;

        if self.name.is_some() && non_blank(self.name.as_deref()).is_none() {
            return Err(AppError::Validation("Name cannot be empty".to_string()));
        }
        if let Some(email) = &self.email {
            if !looks_like_email(email) {
                return Err(AppError::Validation(format!("Invalid email: {}", email)));
            }
        }
        Ok(())
    }
}

/// A minimal shape check: something before and after a single `@`.
pub fn looks_like_email(email: &str) -> bool {
    match email.trim().split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.contains('@') && !domain.starts_with('.')
        }
        None => false,
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMedia {
    pub original: String,
    pub thumbnail: String,
    pub mobile: String,
    pub tablet: String,
    pub desktop: String,
    pub kind: MediaKind,
}

/// Row counts across the catalogue.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseStats {
    pub jobs: i64,
    pub categories: i64,
    pub companies: i64,
    pub job_types: i64,
    pub users: i64,
    pub active_users: i64,
    pub media: i64,
    pub last_job_created: Option<DateTime<Utc>>,
}

/// Returns `Some(trimmed)` for non-blank input.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_value(Role::Standard).unwrap(), json!("user"));
        assert_eq!(serde_json::to_value(Role::SuperAdmin).unwrap(), json!("super-admin"));
        let role: Role = serde_json::from_value(json!("admin")).unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn test_role_can_manage() {
        assert!(!Role::Standard.can_manage());
        assert!(Role::Admin.can_manage());
        assert!(Role::SuperAdmin.can_manage());
    }

    #[test]
    fn test_password_hash_is_never_serialized() {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            role: Role::Admin,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("passwordHash").is_none());
        assert_eq!(value["isActive"], json!(true));
        assert_eq!(value["role"], json!("admin"));
    }

    #[test]
    fn test_job_reference_field_names() {
        let now = Utc::now();
        let job = Job {
            id: Uuid::new_v4(),
            title: "Backend Engineer".to_string(),
            description: "Build APIs".to_string(),
            location: "Remote".to_string(),
            salary: 50000.0,
            category_id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            job_type_id: Uuid::new_v4(),
            created_by: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        };
        let value = serde_json::to_value(&job).unwrap();
        assert!(value.get("category").is_some());
        assert!(value.get("company").is_some());
        assert!(value.get("jobType").is_some());
        assert!(value.get("createdBy").is_some());
    }

    #[test]
    fn test_job_changes_is_empty() {
        assert!(JobChanges::default().is_empty());
        let changes = JobChanges {
            salary: Some(1.0),
            ..Default::default()
        };
        assert!(!changes.is_empty());
    }

    #[test]
    fn test_only_super_admin_changes_roles() {
        let admin = Caller {
            id: Uuid::new_v4(),
            role: Role::Admin,
        };
        let super_admin = Caller {
            id: Uuid::new_v4(),
            role: Role::SuperAdmin,
        };

        let rename = UserChanges {
            name: Some("Grace".to_string()),
            ..Default::default()
        };
        assert!(rename.authorize(&admin, Uuid::new_v4()).is_ok());

        let promote = UserChanges {
            role: Some(Role::Admin),
            ..Default::default()
        };
        assert!(matches!(
            promote.authorize(&admin, Uuid::new_v4()),
            Err(crate::error::AppError::Forbidden(_))
        ));
        assert!(promote.authorize(&super_admin, Uuid::new_v4()).is_ok());
    }

    #[test]
    fn test_super_admin_cannot_lock_themselves_out() {
        let me = Caller {
            id: Uuid::new_v4(),
            role: Role::SuperAdmin,
        };

        let deactivate = UserChanges {
            is_active: Some(false),
            ..Default::default()
        };
        assert!(matches!(
            deactivate.authorize(&me, me.id),
            Err(crate::error::AppError::Validation(_))
        ));
        assert!(deactivate.authorize(&me, Uuid::new_v4()).is_ok());

        let demote = UserChanges {
            role: Some(Role::Standard),
            ..Default::default()
        };
        assert!(matches!(
            demote.authorize(&me, me.id),
            Err(crate::error::AppError::Validation(_))
        ));
        assert!(demote.authorize(&me, Uuid::new_v4()).is_ok());

        let unchanged = UserChanges {
            name: Some("Grace".to_string()),
            role: Some(Role::SuperAdmin),
            is_active: Some(true),
            ..Default::default()
        };
        assert!(unchanged.authorize(&me, me.id).is_ok());
    }

    #[test]
    fn test_user_changes_validation() {
        let blank = UserChanges {
            name: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(blank.validate().is_err());

        let bad_email = UserChanges {
            email: Some("nobody".to_string()),
            ..Default::default()
        };
        assert!(bad_email.validate().is_err());
    }

    #[test]
    fn test_looks_like_email() {
        assert!(looks_like_email("ada@example.com"));
        assert!(!looks_like_email("ada@localhost"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("a@b@c.com"));
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  hi ")), Some("hi"));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }
}
