use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::ai::error::AiError;
use crate::config::OpenAiConfig;

const REQUEST_TIMEOUT_SECS: u64 = 60;
const CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: serde_json::Value,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// Chat-completion backend. The production implementation talks to OpenAI;
/// tests substitute a canned client.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Submit a prompt and return the assistant message content.
    async fn complete(&self, req: CompletionRequest) -> Result<String, AiError>;
}

pub struct OpenAiClient {
    http: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { http, config }
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, req: CompletionRequest) -> Result<String, AiError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(AiError::MissingApiKey)?;

        let body = serde_json::json!({
            "model": req.model,
            "messages": req.messages,
            "temperature": req.temperature,
            "max_tokens": req.max_tokens,
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(AiError::Network)?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(AiError::InvalidApiKey);
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AiError::RateLimited);
        }
        if !status.is_success() {
            return Err(AiError::Upstream(status.as_u16()));
        }

        let payload: ChatResponse = response.json().await.map_err(|_| AiError::Unparsable)?;
        payload
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(AiError::EmptyResponse)
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Parse model output that is supposed to be a JSON object. Models wrap
/// answers in prose or code fences often enough that a failed parse falls
/// back to the substring from the first `{` through the last `}`.
pub fn extract_json<T: DeserializeOwned>(content: &str) -> Result<T, AiError> {
    if let Ok(parsed) = serde_json::from_str(content) {
        return Ok(parsed);
    }
    let start = content.find('{').ok_or(AiError::Unparsable)?;
    let end = content.rfind('}').ok_or(AiError::Unparsable)?;
    if end < start {
        return Err(AiError::Unparsable);
    }
    serde_json::from_str(&content[start..=end]).map_err(|_| AiError::Unparsable)
}
