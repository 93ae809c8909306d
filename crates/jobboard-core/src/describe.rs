//! Port for the external description-generation service.

use crate::error::AppError;
use crate::models::non_blank;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What a generated description is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Job,
    Company,
    Category,
    #[serde(alias = "type", alias = "job-type")]
    JobType,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Job => "job",
            EntityKind::Company => "company",
            EntityKind::Category => "category",
            EntityKind::JobType => "job type",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generates free text describing an entity from its details.
///
/// Implementations report quota exhaustion as [`AppError::QuotaExceeded`]
/// and everything else as [`AppError::GenerationFailed`] or one of the
/// transport errors.
#[async_trait]
pub trait DescriptionGenerator: Send + Sync {
    async fn generate(&self, details: &Value, kind: EntityKind) -> Result<String, AppError>;
}

/// Chat prompt sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    pub fn for_entity(details: &Value, kind: EntityKind) -> Self {
        Self {
            system: format!(
                "You are a helpful AI that generates descriptions for {}s. \
                 You should provide a clear, concise, and informative description.",
                kind
            ),
            user: format!(
                "Generate a detailed description for the following {}:\n{}",
                kind, details
            ),
        }
    }
}

/// Returns the caller's description when it is not blank, otherwise asks
/// the generator for one.
pub async fn resolve_description(
    provided: Option<&str>,
    generator: &dyn DescriptionGenerator,
    details: &Value,
    kind: EntityKind,
) -> Result<String, AppError> {
    if let Some(text) = non_blank(provided) {
        return Ok(text.to_string());
    }

    tracing::debug!(%kind, "no description supplied, generating one");
    let generated = generator.generate(details, kind).await?;
    let generated = generated.trim();
    if generated.is_empty() {
        return Err(AppError::EmptyResponse);
    }
    Ok(generated.to_string())
}

/// Generator used when no API key is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledGenerator;

#[async_trait]
impl DescriptionGenerator for DisabledGenerator {
    async fn generate(&self, _details: &Value, _kind: EntityKind) -> Result<String, AppError> {
        Err(AppError::GenerationFailed(
            "description generation is not configured".to_string(),
        ))
    }
}
