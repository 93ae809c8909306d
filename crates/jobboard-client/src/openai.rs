use async_trait::async_trait;
use jobboard_core::config::HttpConfig;
use jobboard_core::describe::{DescriptionGenerator, EntityKind, Prompt};
use jobboard_core::error::AppError;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

/// Default API root. Any OpenAI-compatible server works.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const MODEL: &str = "gpt-3.5-turbo";

/// HTTP client for an OpenAI-compatible chat completions API.
///
/// Used as the [`DescriptionGenerator`] behind job, company, category and
/// job type descriptions.
///
/// # Examples
///
/// ```no_run
/// use jobboard_client::OpenAiClient;
/// use jobboard_core::config::HttpConfig;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = OpenAiClient::new("sk-...", None, &HttpConfig::default())?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    endpoint: Url,
    timeout_secs: u64,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Error body returned by the API.
#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

impl OpenAiClient {
    /// Creates a client. `base_url` defaults to [`DEFAULT_BASE_URL`].
    pub fn new(api_key: &str, base_url: Option<&str>, config: &HttpConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::ClientError(e.to_string()))?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            endpoint: completions_url(base_url.unwrap_or(DEFAULT_BASE_URL))?,
            timeout_secs: config.timeout.as_secs(),
        })
    }

    /// Sends one chat completion and returns the first choice's text.
    pub async fn complete(&self, prompt: &Prompt) -> Result<String, AppError> {
        let request_body = ChatRequest {
            model: MODEL,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Timeout(self.timeout_secs)
                } else if e.is_connect() {
                    AppError::NetworkError(format!("Connection failed: {}", e))
                } else {
                    AppError::ClientError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(classify_error(status, &error_text));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::ClientError(format!("Failed to parse response: {}", e)))?;

        first_choice(chat)
    }
}

#[async_trait]
impl DescriptionGenerator for OpenAiClient {
    async fn generate(&self, details: &Value, kind: EntityKind) -> Result<String, AppError> {
        tracing::debug!(%kind, "requesting description");
        self.complete(&Prompt::for_entity(details, kind)).await
    }
}

fn completions_url(base: &str) -> Result<Url, AppError> {
    let mut base = base.trim().to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    Url::parse(&base)
        .and_then(|u| u.join("chat/completions"))
        .map_err(|e| AppError::Config(format!("invalid OpenAI base URL '{}': {}", base, e)))
}

/// Maps a non-success response to an error. Quota exhaustion is reported
/// both as HTTP 429 and as `insufficient_quota` on other statuses.
fn classify_error(status: StatusCode, body: &str) -> AppError {
    let detail = serde_json::from_str::<ApiError>(body).ok().map(|e| e.error);

    let quota = detail.as_ref().is_some_and(|d| {
        d.code.as_deref() == Some("insufficient_quota")
            || d.kind.as_deref() == Some("insufficient_quota")
    });
    if status == StatusCode::TOO_MANY_REQUESTS || quota {
        return AppError::QuotaExceeded;
    }

    if status == StatusCode::UNAUTHORIZED {
        return AppError::GenerationFailed("401 Unauthorized - Invalid API key".to_string());
    }

    match detail {
        Some(d) => AppError::GenerationFailed(format!("OpenAI API error: {}", d.message)),
        None => AppError::GenerationFailed(format!("OpenAI API error: HTTP {}", status)),
    }
}

fn first_choice(chat: ChatResponse) -> Result<String, AppError> {
    chat.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or(AppError::EmptyResponse)
}
