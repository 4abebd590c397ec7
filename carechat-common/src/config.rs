use crate::error::ConfigError;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Model access shared by every role.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
}

impl ModelConfig {
    pub fn chat_completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'))
    }

    pub fn api_token(&self) -> &str {
        &self.api_key
    }

    /// Apply command-line overrides on top of the environment.
    pub fn with_overrides(mut self, model: Option<String>, base_url: Option<String>) -> Self {
        if let Some(model) = model.filter(|m| !m.trim().is_empty()) {
            self.model = model;
        }
        if let Some(base_url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.base_url = base_url;
        }
        self
    }
}

pub fn load_config() -> Result<ModelConfig, ConfigError> {
    load_config_from(|key| std::env::var(key).ok())
}

/// Same as [`load_config`] but reads variables through `lookup`.
pub fn load_config_from<F>(lookup: F) -> Result<ModelConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let api_key = lookup("OPENAI_API_KEY")
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .ok_or(ConfigError::MissingApiKey)?;

    let model = lookup("MODEL_ID")
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    let base_url = lookup("OPENAI_BASE_URL")
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ConfigError::InvalidValue {
            key: "OPENAI_BASE_URL".to_string(),
            value: base_url,
        });
    }

    Ok(ModelConfig {
        base_url,
        model,
        api_key,
    })
}

/// HTTP client for model calls. No overall timeout; the SSE idle timeout handles hangs.
pub fn build_http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
}
