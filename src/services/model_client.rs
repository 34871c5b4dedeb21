use async_openai::{config::OpenAIConfig, error::OpenAIError, Client};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use std::{sync::Arc, time::Duration};
use thiserror::Error;

use crate::config::PipelineConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityTier {
    Standard,
    Extended,
}

/// Which model to call and what it may use. Passed explicitly on every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelProfile {
    pub name: String,
    pub tier: CapabilityTier,
    pub web_search: bool,
}

impl ModelProfile {
    pub fn new(name: &str, tier: CapabilityTier) -> Self {
        Self {
            name: name.to_string(),
            tier,
            web_search: false,
        }
    }

    pub fn with_web_search(mut self) -> Self {
        self.web_search = true;
        self
    }
}

/// Transport-level failures from the completion endpoint.
#[derive(Debug, Clone, Error)]
pub enum CompletionError {
    #[error("network error: {0}")]
    Network(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("server error: {0}")]
    Server(String),

    #[error("api error: {0}")]
    Api(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl CompletionError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CompletionError::Network(_)
                | CompletionError::RateLimited(_)
                | CompletionError::Timeout(_)
                | CompletionError::Server(_)
        )
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Sends one prompt and returns the raw completion text.
    async fn complete(&self, prompt: &str, profile: &ModelProfile) -> Result<String, CompletionError>;
}

/// Chat-completion client for any OpenAI-compatible endpoint (OpenRouter by default).
pub struct OpenAiCompletionModel {
    client: Client<OpenAIConfig>,
}

impl OpenAiCompletionModel {
    pub fn new(api_base: &str, api_key: &SecretString) -> Self {
        let config = OpenAIConfig::new()
            .with_api_base(api_base)
            .with_api_key(api_key.expose_secret());
        Self {
            client: Client::with_config(config),
        }
    }

    fn request_body(prompt: &str, profile: &ModelProfile) -> Value {
        let mut body = json!({
            "model": profile.name,
            "messages": [{ "role": "user", "content": prompt }],
        });
        if profile.web_search {
            body["tools"] = json!([{ "type": "web_search_preview" }]);
        }
        body
    }
}

fn map_openai_error(err: OpenAIError) -> CompletionError {
    match err {
        OpenAIError::Reqwest(e) => CompletionError::Network(e.to_string()),
        OpenAIError::ApiError(api) => {
            let code = api.code.clone().unwrap_or_default();
            let kind = api.r#type.clone().unwrap_or_default();
            if code.contains("rate_limit") || kind.contains("rate_limit") || code == "429" {
                CompletionError::RateLimited(api.message)
            } else if kind == "server_error" || code.starts_with('5') {
                CompletionError::Server(api.message)
            } else {
                CompletionError::Api(api.message)
            }
        }
        other => CompletionError::Api(other.to_string()),
    }
}

/// Pulls the assistant text out of a chat-completion response body.
fn extract_completion_text(response: &Value) -> Result<String, CompletionError> {
    response["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| {
            CompletionError::MalformedResponse("response has no message content".to_string())
        })
}

#[async_trait]
impl CompletionModel for OpenAiCompletionModel {
    async fn complete(&self, prompt: &str, profile: &ModelProfile) -> Result<String, CompletionError> {
        let body = Self::request_body(prompt, profile);
        let response: Value = self
            .client
            .chat()
            .create_byot(body)
            .await
            .map_err(map_openai_error)?;
        extract_completion_text(&response)
    }
}

/// Wraps a model with a per-call timeout and bounded retries with exponential backoff.
pub struct RetryingCompletionModel {
    inner: Arc<dyn CompletionModel>,
    max_attempts: u32,
    base_delay: Duration,
    timeout: Duration,
}

impl RetryingCompletionModel {
    pub fn new(inner: Arc<dyn CompletionModel>, config: &PipelineConfig) -> Self {
        Self {
            inner,
            max_attempts: config.max_transport_attempts.max(1),
            base_delay: config.retry_base_delay,
            timeout: config.request_timeout,
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

#[async_trait]
impl CompletionModel for RetryingCompletionModel {
    async fn complete(&self, prompt: &str, profile: &ModelProfile) -> Result<String, CompletionError> {
        let mut attempt = 0;

        loop {
            attempt += 1;

            let result = match tokio::time::timeout(self.timeout, self.inner.complete(prompt, profile)).await {
                Ok(result) => result,
                Err(_) => Err(CompletionError::Timeout(self.timeout)),
            };

            match result {
                Ok(text) => {
                    if attempt > 1 {
                        log::info!(
                            "Model {} succeeded on attempt {}/{}",
                            profile.name,
                            attempt,
                            self.max_attempts
                        );
                    }
                    return Ok(text);
                }
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.backoff(attempt);
                    log::warn!(
                        "Model {} failed (attempt {}/{}): {}. Retrying in {:?}",
                        profile.name,
                        attempt,
                        self.max_attempts,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    log::error!(
                        "Model {} failed after {} attempt(s): {}",
                        profile.name,
                        attempt,
                        e
                    );
                    return Err(e);
                }
            }
        }
    }
}
