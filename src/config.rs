use secrecy::SecretString;
use std::{env, str::FromStr, time::Duration};

use crate::services::model_client::{CapabilityTier, ModelProfile};

const DEFAULT_API_KEY: &str = "llm_api_key";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackend::Mongo => "mongo",
            StoreBackend::Memory => "memory",
        }
    }
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StoreBackend::Mongo),
            "memory" | "in-memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

/// Settings the structured-output pipeline needs from the environment.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub max_transport_attempts: u32,
    pub retry_base_delay: Duration,
    pub request_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_transport_attempts: 3,
            retry_base_delay: Duration::from_millis(500),
            request_timeout: Duration::from_secs(120),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub mongo_conn_string: String,
    pub mongo_db_name: String,
    pub store_backend: StoreBackend,
    pub web_server_host: String,
    pub web_server_port: u16,
    pub llm_api_base: String,
    pub llm_api_key: SecretString,
    pub standard_model_name: String,
    pub extended_model_name: String,
    pub llm_max_attempts: u32,
    pub llm_retry_base_delay_ms: u64,
    pub llm_request_timeout_secs: u64,
    pub default_assign_count: usize,
    pub fallback_categories: Vec<String>,
    pub articles_per_category: usize,
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        Self {
            mongo_conn_string: env::var("MONGO_CONN_STRING")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            mongo_db_name: env::var("MONGO_DB_NAME")
                .unwrap_or_else(|_| "lingua-feed-local".to_string()),
            store_backend: parse_or("STORE_BACKEND", StoreBackend::Mongo),
            web_server_host: env::var("WEB_SERVER_HOST")
                .unwrap_or_else(|_| "localhost".to_string()),
            web_server_port: parse_or("WEB_SERVER_PORT", 8080),
            llm_api_base: env::var("LLM_API_BASE")
                .unwrap_or_else(|_| "https://openrouter.ai/api/v1".to_string()),
            llm_api_key: SecretString::from(
                env::var("LLM_API_KEY").unwrap_or_else(|_| DEFAULT_API_KEY.to_string()),
            ),
            standard_model_name: env::var("LLM_MODEL_NAME")
                .unwrap_or_else(|_| "openai/gpt-4o-mini".to_string()),
            extended_model_name: env::var("LLM_EXTENDED_MODEL_NAME")
                .unwrap_or_else(|_| "openai/gpt-4.1-mini".to_string()),
            llm_max_attempts: parse_or("LLM_MAX_ATTEMPTS", 3),
            llm_retry_base_delay_ms: parse_or("LLM_RETRY_BASE_DELAY_MS", 500),
            llm_request_timeout_secs: parse_or("LLM_REQUEST_TIMEOUT_SECS", 120),
            default_assign_count: parse_or("DEFAULT_ASSIGN_COUNT", 3),
            fallback_categories: env::var("FALLBACK_CATEGORIES")
                .map(|raw| parse_list(&raw))
                .unwrap_or_else(|_| vec!["world news".to_string()]),
            articles_per_category: parse_or("ARTICLES_PER_CATEGORY", 3),
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            max_transport_attempts: self.llm_max_attempts.max(1),
            retry_base_delay: Duration::from_millis(self.llm_retry_base_delay_ms),
            request_timeout: Duration::from_secs(self.llm_request_timeout_secs),
        }
    }

    pub fn standard_profile(&self) -> ModelProfile {
        ModelProfile::new(&self.standard_model_name, CapabilityTier::Standard)
    }

    /// The extended profile always carries the web-search tool.
    pub fn extended_profile(&self) -> ModelProfile {
        ModelProfile::new(&self.extended_model_name, CapabilityTier::Extended).with_web_search()
    }

    /// Validate that production-critical configuration is set
    /// Panics if required secrets are using default values
    pub fn validate_for_production(&self) {
        use secrecy::ExposeSecret;

        if self.llm_api_key.expose_secret() == DEFAULT_API_KEY {
            panic!(
                "FATAL: LLM_API_KEY is using default value! Set LLM_API_KEY environment variable."
            );
        }

        if self.fallback_categories.is_empty() {
            panic!("FATAL: FALLBACK_CATEGORIES must name at least one category.");
        }
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            mongo_conn_string: "mongodb://localhost:27017".to_string(),
            mongo_db_name: "lingua-feed-test".to_string(),
            store_backend: StoreBackend::Memory,
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 8080,
            llm_api_base: "http://localhost:9999/v1".to_string(),
            llm_api_key: SecretString::from("test_api_key".to_string()),
            standard_model_name: "test-standard".to_string(),
            extended_model_name: "test-extended".to_string(),
            llm_max_attempts: 3,
            llm_retry_base_delay_ms: 0,
            llm_request_timeout_secs: 5,
            default_assign_count: 3,
            fallback_categories: vec!["world news".to_string()],
            articles_per_category: 2,
        }
    }
}
