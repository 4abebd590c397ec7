use crate::error::ChatResult;
use crate::events;
use crate::orchestrator::{self, GroupChat};
use crate::providers::ChatModel;
use crate::roles::RoleRegistry;
use crate::selector;
use carechat_common::session::JsonlLogger;
use carechat_common::transcript::Transcript;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;

/// Prefix of every upstream-failure reply.
pub const ERROR_MARKER: &str = "\u{26a0}\u{fe0f} Error: ";

pub fn opening_message(user_input: &str) -> String {
    format!("I have been feeling {}. Can you help?", user_input)
}

/// Runs one full exchange per call. Shared by every HTTP request; holds no per-request state.
pub struct RequestHandler {
    roles: RoleRegistry,
    model: Arc<dyn ChatModel>,
    max_rounds: usize,
    logger: JsonlLogger,
}

impl RequestHandler {
    pub fn new(
        roles: RoleRegistry,
        model: Arc<dyn ChatModel>,
        max_rounds: usize,
        logger: JsonlLogger,
    ) -> Self {
        Self {
            roles,
            model,
            max_rounds,
            logger,
        }
    }

    pub fn model_id(&self) -> &str {
        self.model.model_id()
    }

    /// Never fails: upstream errors come back as `ERROR_MARKER` + description.
    pub async fn handle(&self, user_input: &str) -> String {
        let request_id = uuid::Uuid::new_v4().to_string();
        let start = Instant::now();

        events::emit_request_started(&request_id, user_input);
        self.logger.log(
            &request_id,
            "request_start",
            0,
            Some(json!({ "input": user_input, "model": self.model.model_id() })),
        );

        let outcome = self.run(&request_id, user_input).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok((reply, rounds)) => {
                events::emit_request_completed(&request_id, elapsed_ms, rounds);
                self.logger.log(
                    &request_id,
                    "request_end",
                    rounds,
                    Some(json!({ "status": "ok", "elapsed_ms": elapsed_ms })),
                );
                reply
            }
            Err(e) => {
                events::emit_request_failed(&request_id, elapsed_ms, &e.to_string());
                self.logger.log(
                    &request_id,
                    "request_end",
                    0,
                    Some(json!({ "status": "error", "error": e.to_string(), "elapsed_ms": elapsed_ms })),
                );
                format!("{}{}", ERROR_MARKER, e)
            }
        }
    }

    async fn run(&self, request_id: &str, user_input: &str) -> ChatResult<(String, usize)> {
        let participants = self.roles.responders();
        let chat = GroupChat {
            initiator: &self.roles.patient,
            participants: &participants,
            max_rounds: self.max_rounds,
        };

        // Fresh per request; moved into the scheduler and back.
        let transcript = orchestrator::run_group_chat(
            &chat,
            Transcript::new(),
            opening_message(user_input),
            self.model.as_ref(),
            request_id,
            &self.logger,
        )
        .await?;

        Ok((selector::select(transcript.entries()), transcript.entries().len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::DEFAULT_MAX_ROUNDS;
    use crate::providers::testing::ScriptedModel;
    use carechat_common::error::ModelError;

    fn handler_with_model(model: Arc<dyn ChatModel>) -> RequestHandler {
        RequestHandler::new(
            RoleRegistry::default(),
            model,
            DEFAULT_MAX_ROUNDS,
            JsonlLogger::disabled(),
        )
    }

    fn handler_with(model: Arc<ScriptedModel>, max_rounds: usize) -> RequestHandler {
        RequestHandler::new(
            RoleRegistry::default(),
            model,
            max_rounds,
            JsonlLogger::disabled(),
        )
    }

    #[test]
    fn opener_embeds_input_verbatim() {
        assert_eq!(
            opening_message("anxious and tired"),
            "I have been feeling anxious and tired. Can you help?"
        );
        assert_eq!(opening_message(""), "I have been feeling . Can you help?");
    }

    #[tokio::test]
    async fn returns_recommender_reply() {
        let model = Arc::new(ScriptedModel::replying(&[
            "dominant emotion: anxiety",
            "try deep breathing",
        ]));
        let handler = handler_with(model.clone(), DEFAULT_MAX_ROUNDS);

        let reply = handler.handle("anxious").await;

        assert_eq!(reply, "try deep breathing");
        let calls = model.calls.lock().unwrap();
        assert_eq!(
            calls[0].1[0].content,
            "[patient]: I have been feeling anxious. Can you help?"
        );
    }

    #[tokio::test]
    async fn early_stop_returns_analyzer_reply() {
        let model = Arc::new(ScriptedModel::replying(&["dominant emotion: sadness TERMINATE"]));
        let handler = handler_with(model, DEFAULT_MAX_ROUNDS);

        assert_eq!(handler.handle("sad").await, "dominant emotion: sadness TERMINATE");
    }

    #[tokio::test]
    async fn single_round_yields_no_ai_response() {
        let model = Arc::new(ScriptedModel::replying(&[]));
        let handler = handler_with(model, 1);

        assert_eq!(handler.handle("fine").await, selector::NO_AI_RESPONSE);
    }

    #[tokio::test]
    async fn upstream_failure_becomes_error_string() {
        let model = Arc::new(ScriptedModel::new(vec![Err(ModelError::Status {
            status: 401,
            body: "invalid api key".into(),
        })]));
        let handler = handler_with(model, DEFAULT_MAX_ROUNDS);

        let reply = handler.handle("anxious").await;

        assert!(reply.starts_with(ERROR_MARKER), "got: {reply}");
        assert!(reply.contains("invalid api key"), "got: {reply}");
        assert!(reply.contains("analyzer"), "got: {reply}");
    }

    #[tokio::test]
    async fn requests_do_not_share_transcripts() {
        let model = Arc::new(ScriptedModel::replying(&["a1", "r1", "a2", "r2"]));
        let handler = handler_with(model.clone(), DEFAULT_MAX_ROUNDS);

        assert_eq!(handler.handle("first").await, "r1");
        assert_eq!(handler.handle("second").await, "r2");

        // Second request's analyzer saw only its own opener.
        let calls = model.calls.lock().unwrap();
        assert_eq!(calls[2].1.len(), 1);
        assert!(calls[2].1[0].content.contains("second"));
    }

    /// Echoes the opener it was shown, yielding first so concurrent requests interleave.
    struct EchoModel;

    #[async_trait::async_trait]
    impl ChatModel for EchoModel {
        fn model_id(&self) -> &str {
            "echo"
        }

        async fn complete(
            &self,
            _instructions: &str,
            history: &[crate::providers::ChatMessage],
        ) -> Result<String, ModelError> {
            tokio::task::yield_now().await;
            Ok(format!("{} messages, first: {}", history.len(), history[0].content))
        }
    }

    #[tokio::test]
    async fn concurrent_requests_keep_separate_transcripts() {
        let handler = Arc::new(handler_with_model(Arc::new(EchoModel)));

        let (first, second) = tokio::join!(
            {
                let handler = handler.clone();
                async move { handler.handle("lonely").await }
            },
            {
                let handler = handler.clone();
                async move { handler.handle("restless").await }
            }
        );

        assert_eq!(first, "2 messages, first: [patient]: I have been feeling lonely. Can you help?");
        assert_eq!(second, "2 messages, first: [patient]: I have been feeling restless. Can you help?");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_requests_on_worker_threads() {
        let handler = Arc::new(handler_with_model(Arc::new(EchoModel)));

        let tasks: Vec<_> = ["calm", "angry", "numb", "hopeful"]
            .into_iter()
            .map(|feeling| {
                let handler = handler.clone();
                tokio::spawn(async move { (feeling, handler.handle(feeling).await) })
            })
            .collect();

        for task in tasks {
            let (feeling, reply) = task.await.unwrap();
            assert_eq!(
                reply,
                format!("2 messages, first: [patient]: I have been feeling {feeling}. Can you help?")
            );
        }
    }

    #[tokio::test]
    async fn transcript_log_records_turns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("turns.jsonl");
        let model = Arc::new(ScriptedModel::replying(&["anxiety", "breathe"]));
        let handler = RequestHandler::new(
            RoleRegistry::default(),
            model,
            DEFAULT_MAX_ROUNDS,
            JsonlLogger::new(&path),
        );

        handler.handle("anxious").await;

        let content = std::fs::read_to_string(&path).unwrap();
        let entries: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        let events: Vec<&str> = entries.iter().map(|e| e["event"].as_str().unwrap()).collect();
        assert_eq!(events, ["request_start", "turn", "turn", "turn", "request_end"]);
        let rounds: Vec<u64> = entries.iter().map(|e| e["turn"].as_u64().unwrap()).collect();
        assert_eq!(rounds, [0, 1, 2, 3, 3]);
        assert_eq!(entries[2]["data"]["speaker"], "analyzer");
    }
}
