use super::{ChatMessage, ChatModel};
use async_trait::async_trait;
use carechat_common::config::ModelConfig;
use carechat_common::error::ModelError;
use carechat_common::sse::{streaming, StopReason};
use serde_json::{json, Value};

/// Chat Completions backend shared by every role.
pub struct OpenAiChatModel {
    client: reqwest::Client,
    config: ModelConfig,
}

impl OpenAiChatModel {
    pub fn new(client: reqwest::Client, config: ModelConfig) -> Self {
        Self { client, config }
    }

    fn build_payload(&self, instructions: &str, history: &[ChatMessage]) -> Value {
        let system = ChatMessage::system(instructions);
        let messages: Vec<&ChatMessage> = std::iter::once(&system).chain(history).collect();

        json!({
            "model": self.config.model,
            "messages": messages,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    fn model_id(&self) -> &str {
        &self.config.model
    }

    async fn complete(
        &self,
        instructions: &str,
        history: &[ChatMessage],
    ) -> Result<String, ModelError> {
        let url = self.config.chat_completions_url();
        tracing::debug!(url = %url, model = %self.config.model, messages = history.len() as u64 + 1, "POST chat completion");

        let payload = self.build_payload(instructions, history);
        let result =
            streaming::stream_openai_chat(&self.client, &url, self.config.api_token(), payload)
                .await?;
        if matches!(result.stop_reason, StopReason::MaxTokens | StopReason::ContentFilter) {
            tracing::warn!(
                model = %self.config.model,
                stop_reason = ?result.stop_reason,
                "reply cut short, keeping partial text"
            );
        }
        Ok(result.text)
    }
}
