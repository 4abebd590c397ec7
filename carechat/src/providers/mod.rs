pub mod openai;

use async_trait::async_trait;
use carechat_common::error::ModelError;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: MessageRole::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: MessageRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: MessageRole::Assistant, content: content.into() }
    }
}

/// One model invocation: role instructions plus conversation so far in, reply text out.
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn model_id(&self) -> &str;

    async fn complete(
        &self,
        instructions: &str,
        history: &[ChatMessage],
    ) -> Result<String, ModelError>;
}
