pub mod openai;
pub mod streaming;

use std::time::Duration;

/// Idle timeout for SSE streams — if no data received for this duration, consider the stream dead.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

// ============================================================================
// SSE Parser — byte-to-event parser
// ============================================================================

#[derive(Default)]
pub struct SseParser {
    buffer: String,
    /// Trailing bytes of a UTF-8 character split across chunks.
    partial: Vec<u8>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a byte chunk and return any complete SSE events.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.partial.extend_from_slice(chunk);
        let complete = match std::str::from_utf8(&self.partial) {
            Ok(_) => self.partial.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(_) => self.partial.len(),
        };
        let bytes: Vec<u8> = self.partial.drain(..complete).collect();
        let text = String::from_utf8_lossy(&bytes);
        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        self.buffer.push_str(&normalized);

        let mut events = Vec::new();

        while let Some(pos) = self.buffer.find("\n\n") {
            let raw_event: String = self.buffer.drain(..pos + 2).collect();

            if let Some(event) = Self::parse_raw_event(raw_event.trim_end_matches('\n')) {
                events.push(event);
            }
        }

        events
    }

    /// Flush remaining buffer after stream ends (handles missing trailing \n\n).
    pub fn flush(&mut self) -> Vec<SseEvent> {
        if !self.partial.is_empty() {
            let tail = std::mem::take(&mut self.partial);
            self.buffer.push_str(&String::from_utf8_lossy(&tail));
        }
        let remaining = std::mem::take(&mut self.buffer);
        let trimmed = remaining.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }
        Self::parse_raw_event(trimmed).into_iter().collect()
    }

    fn parse_raw_event(raw: &str) -> Option<SseEvent> {
        let mut event_type = String::new();
        let mut data_lines: Vec<&str> = Vec::new();

        for line in raw.lines() {
            if line.starts_with(':') {
                continue; // comment / keep-alive
            }
            if let Some(value) = line.strip_prefix("event:") {
                event_type = value.trim().to_string();
            } else if let Some(value) = line.strip_prefix("data:") {
                data_lines.push(value.strip_prefix(' ').unwrap_or(value));
            }
        }

        if event_type.is_empty() && data_lines.is_empty() {
            return None;
        }

        Some(SseEvent {
            event_type,
            data: data_lines.join("\n"),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SseEvent {
    pub event_type: String,
    pub data: String,
}

// ============================================================================
// StreamAction — normalized actions produced by the chat parser
// ============================================================================

#[derive(Debug, PartialEq)]
pub enum StreamAction {
    TextDelta { text: String },
    MessageComplete { stop_reason: StopReason },
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    ContentFilter,
    Unknown,
}
