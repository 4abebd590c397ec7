//! Picks the single message returned to the caller from a finished transcript.

use carechat_common::transcript::{Speaker, TranscriptEntry};

pub const NO_MESSAGES: &str = "no messages captured";
pub const NO_AI_RESPONSE: &str = "no AI response found";

/// Latest recommender message; otherwise the latest non-patient message.
///
/// Both passes scan newest to oldest. An empty recommender reply still wins
/// the first pass. Absence is reported as one of the two literal strings,
/// never as an error.
pub fn select(transcript: &[TranscriptEntry]) -> String {
    if transcript.is_empty() {
        return NO_MESSAGES.to_string();
    }

    if let Some(entry) = transcript
        .iter()
        .rev()
        .find(|e| e.speaker == Speaker::Recommender)
    {
        return entry.content.clone();
    }

    // Keep this a separate pass: it covers runs that stopped before the recommender spoke.
    transcript
        .iter()
        .rev()
        .find(|e| e.speaker != Speaker::Patient)
        .map(|e| e.content.clone())
        .unwrap_or_else(|| NO_AI_RESPONSE.to_string())
}
