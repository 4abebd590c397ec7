//! Streaming call to the Chat Completions API.
//!
//! POST → status check → SSE loop with idle timeout → accumulate into StreamResult.
//! Callers never touch raw bytes or SSE events.

use futures_util::StreamExt;
use reqwest::Client;
use serde_json::Value;
use tokio::time::timeout;

use super::openai::parse_openai_chat_sse;
use super::{SseParser, StopReason, StreamAction, IDLE_TIMEOUT};
use crate::error::ModelError;

#[derive(Debug, Clone)]
pub struct StreamResult {
    pub text: String,
    pub stop_reason: StopReason,
}

/// Converts a sequence of StreamActions into a StreamResult.
pub struct StreamAccumulator {
    pub text: String,
    pub stop_reason: StopReason,
    error: Option<String>,
}

impl Default for StreamAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            stop_reason: StopReason::Unknown,
            error: None,
        }
    }

    pub fn process(&mut self, action: StreamAction) {
        match action {
            StreamAction::TextDelta { text } => {
                self.text.push_str(&text);
            }
            StreamAction::MessageComplete { stop_reason } => {
                // `[DONE]` follows the real finish_reason; keep the first one.
                if self.stop_reason == StopReason::Unknown {
                    self.stop_reason = stop_reason;
                }
            }
            StreamAction::Error(msg) => {
                if self.error.is_none() {
                    self.error = Some(msg);
                }
            }
        }
    }

    pub fn had_error(&self) -> bool {
        self.error.is_some()
    }

    /// SSE-level errors fail the call even when some text already arrived.
    pub fn into_result(self) -> Result<StreamResult, ModelError> {
        if let Some(msg) = self.error {
            return Err(ModelError::Stream(msg));
        }

        let stop_reason = if self.stop_reason == StopReason::Unknown && !self.text.is_empty() {
            StopReason::EndTurn
        } else {
            self.stop_reason
        };

        Ok(StreamResult {
            text: self.text,
            stop_reason,
        })
    }
}

/// Stream OpenAI Chat Completions API (`/v1/chat/completions`).
///
/// Text-only streaming with `[DONE]` termination.
pub async fn stream_openai_chat(
    client: &Client,
    url: &str,
    auth_token: &str,
    mut payload: Value,
) -> Result<StreamResult, ModelError> {
    payload["stream"] = Value::Bool(true);

    let response = client
        .post(url)
        .bearer_auth(auth_token)
        .json(&payload)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ModelError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let mut parser = SseParser::new();
    let mut byte_stream = response.bytes_stream();
    let mut acc = StreamAccumulator::new();

    loop {
        match timeout(IDLE_TIMEOUT, byte_stream.next()).await {
            Ok(Some(Ok(chunk))) => {
                for event in parser.feed(&chunk) {
                    if let Some(action) = parse_openai_chat_sse(&event) {
                        acc.process(action);
                    }
                }
            }
            Ok(Some(Err(e))) => {
                return Err(ModelError::Stream(e.to_string()));
            }
            Ok(None) => break,
            Err(_) => {
                if !acc.text.is_empty() && !acc.had_error() {
                    tracing::warn!(
                        chars = acc.text.len() as u64,
                        "chat stream went idle, keeping partial reply"
                    );
                    break;
                }
                return Err(ModelError::IdleTimeout(IDLE_TIMEOUT.as_secs()));
            }
        }
    }

    for event in parser.flush() {
        if let Some(action) = parse_openai_chat_sse(&event) {
            acc.process(action);
        }
    }

    acc.into_result()
}
