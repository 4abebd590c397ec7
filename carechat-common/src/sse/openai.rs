use super::{SseEvent, StopReason, StreamAction};
use serde_json::Value;

/// Parse one OpenAI Chat Completions SSE event into a StreamAction.
///
/// Chat Completions SSE uses no event type, only `data:` lines, and ends with `[DONE]`.
pub fn parse_openai_chat_sse(event: &SseEvent) -> Option<StreamAction> {
    if event.data == "[DONE]" {
        return Some(StreamAction::MessageComplete { stop_reason: StopReason::EndTurn });
    }

    let data: Value = serde_json::from_str(&event.data).ok()?;

    if let Some(error) = data.get("error") {
        let msg = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown OpenAI chat SSE error");
        return Some(StreamAction::Error(msg.to_string()));
    }

    let choice = data.get("choices")?.get(0)?;

    if let Some(content) = choice
        .get("delta")
        .and_then(|d| d.get("content"))
        .and_then(|c| c.as_str())
    {
        if !content.is_empty() {
            return Some(StreamAction::TextDelta { text: content.to_string() });
        }
    }

    let finish = choice.get("finish_reason").and_then(|f| f.as_str())?;
    let stop_reason = match finish {
        "stop" => StopReason::EndTurn,
        "length" => StopReason::MaxTokens,
        "content_filter" => StopReason::ContentFilter,
        _ => StopReason::Unknown,
    };
    Some(StreamAction::MessageComplete { stop_reason })
}
