//! Round-robin group chat: the opener, then one model call per turn.

use crate::error::{ChatError, ChatResult};
use crate::events;
use crate::providers::{ChatMessage, ChatModel};
use crate::roles::Role;
use carechat_common::session::JsonlLogger;
use carechat_common::transcript::{Transcript, TranscriptEntry};
use serde_json::json;
use std::time::Instant;

/// A reply containing this marker ends the conversation after it is recorded.
pub const TERMINATION_MARKER: &str = "TERMINATE";

pub const DEFAULT_MAX_ROUNDS: usize = 3;

pub struct GroupChat<'a> {
    pub initiator: &'a Role,
    pub participants: &'a [&'a Role],
    /// Counts every entry, the opener included.
    pub max_rounds: usize,
}

/// Run one exchange and return the filled transcript.
///
/// The opener is recorded under the initiator as round 1. Participants then
/// speak in order, cycling, until `max_rounds` entries exist or a reply
/// carries [`TERMINATION_MARKER`]. The first failed model call aborts the run.
pub async fn run_group_chat(
    chat: &GroupChat<'_>,
    mut transcript: Transcript,
    opener: String,
    model: &dyn ChatModel,
    request_id: &str,
    logger: &JsonlLogger,
) -> ChatResult<Transcript> {
    let max_rounds = chat.max_rounds.max(1);

    // Rounds are numbered from 1; the opener is round 1.
    logger.log(
        request_id,
        "turn",
        1,
        Some(json!({ "speaker": chat.initiator.name, "content": &opener })),
    );
    transcript.push(TranscriptEntry::new(chat.initiator.speaker(), opener));

    let next_round = transcript.entries().len() + 1;
    for (round, role) in (next_round..=max_rounds).zip(chat.participants.iter().cycle()) {
        events::emit_turn_started(request_id, round, max_rounds, &role.name);

        let history = build_history(&transcript, role);
        let turn_start = Instant::now();

        let reply = match model.complete(&role.instructions, &history).await {
            Ok(reply) => reply,
            Err(source) => {
                events::emit_turn_failed(request_id, &role.name, round, &source.to_string());
                logger.log(
                    request_id,
                    "turn_error",
                    round,
                    Some(json!({ "speaker": role.name, "error": source.to_string() })),
                );
                return Err(ChatError::Turn {
                    speaker: role.name.clone(),
                    round,
                    source,
                });
            }
        };

        let elapsed_ms = turn_start.elapsed().as_millis() as u64;
        events::emit_turn_completed(request_id, &role.name, round, elapsed_ms, &reply);
        logger.log(
            request_id,
            "turn",
            round,
            Some(json!({ "speaker": role.name, "elapsed_ms": elapsed_ms, "content": &reply })),
        );

        let terminate = reply.contains(TERMINATION_MARKER);
        transcript.push(TranscriptEntry::new(role.speaker(), reply));

        if terminate {
            events::emit_conversation_terminated(request_id, &role.name, round);
            break;
        }
    }

    Ok(transcript)
}

/// Conversation as seen by `role`: its own turns as assistant messages,
/// everyone else's as user messages tagged with the speaker.
pub fn build_history(transcript: &Transcript, role: &Role) -> Vec<ChatMessage> {
    let own = role.speaker();
    transcript
        .entries()
        .iter()
        .map(|entry| {
            if entry.speaker == own {
                ChatMessage::assistant(entry.content.clone())
            } else {
                ChatMessage::user(format!("[{}]: {}", entry.speaker, entry.content))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::testing::ScriptedModel;
    use crate::providers::MessageRole;
    use crate::roles::RoleRegistry;
    use carechat_common::error::ModelError;
    use carechat_common::transcript::Speaker;

    async fn run(
        roles: &RoleRegistry,
        model: &ScriptedModel,
        max_rounds: usize,
    ) -> ChatResult<Transcript> {
        let participants = roles.responders();
        let chat = GroupChat {
            initiator: &roles.patient,
            participants: &participants,
            max_rounds,
        };
        run_group_chat(
            &chat,
            Transcript::new(),
            "I have been feeling anxious. Can you help?".to_string(),
            model,
            "test",
            &JsonlLogger::disabled(),
        )
        .await
    }

    fn speakers(transcript: &Transcript) -> Vec<Speaker> {
        transcript.entries().iter().map(|e| e.speaker.clone()).collect()
    }

    #[tokio::test]
    async fn default_rounds_give_patient_analyzer_recommender() {
        let roles = RoleRegistry::default();
        let model = ScriptedModel::replying(&["dominant emotion: anxiety", "try deep breathing"]);

        let transcript = run(&roles, &model, DEFAULT_MAX_ROUNDS).await.unwrap();

        assert_eq!(
            speakers(&transcript),
            [Speaker::Patient, Speaker::Analyzer, Speaker::Recommender]
        );
        assert_eq!(transcript.entries()[0].content, "I have been feeling anxious. Can you help?");
        assert_eq!(transcript.entries()[2].content, "try deep breathing");
        assert_eq!(model.call_count(), 2);
    }

    #[tokio::test]
    async fn each_turn_uses_its_role_instructions() {
        let roles = RoleRegistry::default();
        let model = ScriptedModel::replying(&["a", "b"]);

        run(&roles, &model, 3).await.unwrap();

        let calls = model.calls.lock().unwrap();
        assert_eq!(calls[0].0, roles.analyzer.instructions);
        assert_eq!(calls[1].0, roles.recommender.instructions);
    }

    #[tokio::test]
    async fn context_grows_with_each_turn() {
        let roles = RoleRegistry::default();
        let model = ScriptedModel::replying(&["sadness", "journal daily"]);

        run(&roles, &model, 3).await.unwrap();

        let calls = model.calls.lock().unwrap();
        assert_eq!(calls[0].1.len(), 1);
        assert_eq!(calls[1].1.len(), 2);
        assert_eq!(calls[1].1[1], ChatMessage::user("[analyzer]: sadness"));
    }

    #[tokio::test]
    async fn rounds_cycle_through_participants() {
        let roles = RoleRegistry::default();
        let model = ScriptedModel::replying(&["a1", "r1", "a2", "r2"]);

        let transcript = run(&roles, &model, 5).await.unwrap();

        assert_eq!(
            speakers(&transcript),
            [
                Speaker::Patient,
                Speaker::Analyzer,
                Speaker::Recommender,
                Speaker::Analyzer,
                Speaker::Recommender
            ]
        );
        // analyzer sees its own first reply as an assistant message
        let calls = model.calls.lock().unwrap();
        assert_eq!(calls[2].1[1].role, MessageRole::Assistant);
        assert_eq!(calls[2].1[1].content, "a1");
    }

    #[tokio::test]
    async fn termination_marker_stops_early() {
        let roles = RoleRegistry::default();
        let model = ScriptedModel::replying(&["dominant emotion: sadness TERMINATE", "unused"]);

        let transcript = run(&roles, &model, 3).await.unwrap();

        assert_eq!(speakers(&transcript), [Speaker::Patient, Speaker::Analyzer]);
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn zero_rounds_records_only_the_opener() {
        let roles = RoleRegistry::default();
        let model = ScriptedModel::replying(&[]);

        let transcript = run(&roles, &model, 0).await.unwrap();

        assert_eq!(speakers(&transcript), [Speaker::Patient]);
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn no_participants_records_only_the_opener() {
        let roles = RoleRegistry::default();
        let model = ScriptedModel::replying(&["unused"]);
        let chat = GroupChat {
            initiator: &roles.patient,
            participants: &[],
            max_rounds: 3,
        };

        let transcript = run_group_chat(
            &chat,
            Transcript::new(),
            "hello".to_string(),
            &model,
            "test",
            &JsonlLogger::disabled(),
        )
        .await
        .unwrap();

        assert_eq!(transcript.entries().len(), 1);
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn model_failure_aborts_with_round_context() {
        let roles = RoleRegistry::default();
        let model = ScriptedModel::new(vec![
            Ok("anxiety".to_string()),
            Err(ModelError::Status { status: 500, body: "upstream down".into() }),
        ]);

        let err = run(&roles, &model, 3).await.unwrap_err();

        let ChatError::Turn { speaker, round, .. } = &err;
        assert_eq!(speaker, "recommender");
        assert_eq!(*round, 3);
        assert!(err.to_string().contains("round 3"), "got: {err}");
        assert!(err.to_string().contains("upstream down"), "got: {err}");
    }

    #[test]
    fn history_tags_other_speakers() {
        let roles = RoleRegistry::default();
        let transcript = Transcript::from(vec![
            TranscriptEntry::new(Speaker::Patient, "I feel sad"),
            TranscriptEntry::new(Speaker::Analyzer, "sadness"),
        ]);

        let history = build_history(&transcript, &roles.analyzer);

        assert_eq!(
            history,
            vec![
                ChatMessage::user("[patient]: I feel sad"),
                ChatMessage::assistant("sadness"),
            ]
        );
    }
}
