use thiserror::Error;

/// Start-up configuration problems.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("OPENAI_API_KEY is not set. Export it before starting carechat.")]
    MissingApiKey,

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Failures of a single model call.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("model API error HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("model stream error: {0}")]
    Stream(String),

    #[error("model stream idle timeout ({0}s)")]
    IdleTimeout(u64),
}
