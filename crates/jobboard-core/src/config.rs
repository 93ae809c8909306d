//! Configuration types for jobboard components.
//!
//! Every component has a `Default` that is good enough for local use. An
//! optional TOML file overrides individual values:
//!
//! ```toml
//! [database]
//! max_connections = 10
//!
//! [http]
//! timeout_secs = 20
//!
//! [pagination]
//! default_limit = 25
//! max_limit = 200
//!
//! [auth]
//! token_ttl_hours = 12
//! ```
//!
//! The default location is `~/.config/jobboard/config.toml`. Environment
//! variables and CLI flags are handled by the binary and win over the file.

use crate::error::AppError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Database connection pool configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub max_connections: u32,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self { max_connections: 5 }
    }
}

/// HTTP client configuration for the description service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

/// Page size bounds for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationConfig {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
        }
    }
}

/// Bearer token settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    pub token_ttl_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { token_ttl_hours: 24 }
    }
}

/// Fully resolved component configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub db: DbConfig,
    pub http: HttpConfig,
    pub pagination: PaginationConfig,
    pub auth: AuthConfig,
}

/// On-disk representation. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub database: DatabaseSection,
    #[serde(default)]
    pub http: HttpSection,
    #[serde(default)]
    pub pagination: PaginationSection,
    #[serde(default)]
    pub auth: AuthSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseSection {
    pub max_connections: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpSection {
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaginationSection {
    pub default_limit: Option<u32>,
    pub max_limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthSection {
    pub token_ttl_hours: Option<i64>,
}

impl Settings {
    /// Applies file overrides on top of the defaults and checks the result.
    pub fn from_file_config(file: FileConfig) -> Result<Self, AppError> {
        let mut settings = Settings::default();

        if let Some(max) = file.database.max_connections {
            settings.db.max_connections = max;
        }
        if let Some(secs) = file.http.timeout_secs {
            settings.http.timeout = Duration::from_secs(secs);
        }
        if let Some(limit) = file.pagination.default_limit {
            settings.pagination.default_limit = limit;
        }
        if let Some(limit) = file.pagination.max_limit {
            settings.pagination.max_limit = limit;
        }
        if let Some(ttl) = file.auth.token_ttl_hours {
            settings.auth.token_ttl_hours = ttl;
        }

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.db.max_connections == 0 {
            return Err(AppError::Config(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        if self.pagination.default_limit == 0 || self.pagination.max_limit == 0 {
            return Err(AppError::Config(
                "pagination limits must be at least 1".to_string(),
            ));
        }
        if self.pagination.default_limit > self.pagination.max_limit {
            return Err(AppError::Config(format!(
                "pagination.default_limit ({}) exceeds pagination.max_limit ({})",
                self.pagination.default_limit, self.pagination.max_limit
            )));
        }
        if self.auth.token_ttl_hours <= 0 {
            return Err(AppError::Config(
                "auth.token_ttl_hours must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Returns `~/.config/jobboard/config.toml` (platform equivalent), if a
/// config directory exists for the current user.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("jobboard").join("config.toml"))
}

/// Loads settings from `path`, or from [`default_config_path`] when `path`
/// is `None`.
///
/// A missing default file is not an error and yields the defaults. A missing
/// explicitly requested file is.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, AppError> {
    let (path, explicit) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => match default_config_path() {
            Some(p) => (p, false),
            None => return Ok(Settings::default()),
        },
    };

    if !path.exists() {
        if explicit {
            return Err(AppError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        tracing::debug!("no config file at {}, using defaults", path.display());
        return Ok(Settings::default());
    }

    let raw = std::fs::read_to_string(&path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {}", path.display(), e)))?;
    let file: FileConfig = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("invalid {}: {}", path.display(), e)))?;

    tracing::info!("loaded configuration from {}", path.display());
    Settings::from_file_config(file)
}
