//! Progress events for one request, emitted through `tracing`.
//!
//! User input and model replies are previewed only at `debug`.

use carechat_common::session::summarize;

const PREVIEW_CHARS: usize = 80;

pub fn emit_request_started(request_id: &str, user_input: &str) {
    tracing::info!(request_id, input_chars = user_input.chars().count() as u64, "request started");
    tracing::debug!(request_id, input = %summarize(user_input, PREVIEW_CHARS), "request input");
}

pub fn emit_turn_started(request_id: &str, round: usize, max_rounds: usize, speaker: &str) {
    tracing::info!(
        request_id,
        speaker,
        round = round as u64,
        "round {}/{}: {} thinking...",
        round,
        max_rounds,
        speaker
    );
}

pub fn emit_turn_completed(request_id: &str, speaker: &str, round: usize, elapsed_ms: u64, reply: &str) {
    tracing::info!(
        request_id,
        speaker,
        round = round as u64,
        elapsed_ms,
        "{} replied ({:.1}s)",
        speaker,
        elapsed_ms as f64 / 1000.0
    );
    tracing::debug!(request_id, speaker, reply = %summarize(reply, PREVIEW_CHARS), "reply preview");
}

pub fn emit_turn_failed(request_id: &str, speaker: &str, round: usize, error: &str) {
    tracing::error!(request_id, speaker, round = round as u64, error, "{} failed in round {}", speaker, round);
}

pub fn emit_conversation_terminated(request_id: &str, speaker: &str, round: usize) {
    tracing::info!(
        request_id,
        speaker,
        round = round as u64,
        "termination marker from {} in round {}, ending early",
        speaker,
        round
    );
}

pub fn emit_request_completed(request_id: &str, elapsed_ms: u64, rounds: usize) {
    tracing::info!(
        request_id,
        elapsed_ms,
        rounds = rounds as u64,
        "request completed ({:.1}s, {} round{})",
        elapsed_ms as f64 / 1000.0,
        rounds,
        if rounds == 1 { "" } else { "s" }
    );
}

pub fn emit_request_failed(request_id: &str, elapsed_ms: u64, error: &str) {
    tracing::warn!(request_id, elapsed_ms, error, "request failed");
}
