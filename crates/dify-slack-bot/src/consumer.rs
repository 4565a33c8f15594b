//! Answer consumer: turns one queued work item into exactly one edit of its
//! placeholder message.

use axum::http::StatusCode;
use bridge_types::{MentionWorkItem, PostedPlaceholder, ResolvedPlaceholder, Resolution};
use tracing::{error, info, instrument, warn};

use crate::format::{answer_text, apology_text};
use crate::response::HandlerResponse;
use crate::slack_api::{ChatApi, SlackApiError};
use crate::workflow::{WorkflowApi, WorkflowRun};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// The payload was not a work item. Redelivering it cannot help.
    Rejected,
    /// The placeholder was resolved, or resolving it failed and was logged.
    Completed(Resolution),
}

impl ConsumeOutcome {
    pub fn response(&self) -> HandlerResponse {
        match self {
            Self::Rejected => HandlerResponse::text(StatusCode::BAD_REQUEST, "Invalid message body."),
            Self::Completed(_) => HandlerResponse::text(StatusCode::OK, "Processing complete."),
        }
    }
}

pub struct AnswerConsumer<C, W> {
    chat: C,
    workflow: W,
}

impl<C: ChatApi, W: WorkflowApi> AnswerConsumer<C, W> {
    pub fn new(chat: C, workflow: W) -> Self {
        Self { chat, workflow }
    }

    pub async fn process(&self, payload: &[u8]) -> ConsumeOutcome {
        match serde_json::from_slice::<MentionWorkItem>(payload) {
            Ok(item) => ConsumeOutcome::Completed(self.answer(&item).await),
            Err(e) => {
                warn!(error = %e, "Rejecting malformed work item");
                ConsumeOutcome::Rejected
            }
        }
    }

    /// Returns the resolution that ended up applied (or attempted last).
    #[instrument(
        name = "dify.answer",
        skip_all,
        fields(channel = %item.channel_id, user = %item.user_id, ts = %item.message_ts)
    )]
    pub async fn answer(&self, item: &MentionWorkItem) -> Resolution {
        let placeholder = PostedPlaceholder::from(item);
        let run = WorkflowRun::for_question(&item.question, &item.user_id);
        let resolution = match self.workflow.run(&run).await {
            Ok(reply) => Resolution::from_answer(reply.answer),
            Err(e) => {
                warn!(error = %e, "Workflow call failed");
                Resolution::Apologized
            }
        };

        let resolved = placeholder.resolve(resolution);
        let Err(e) = self.apply(&resolved).await else {
            info!(resolution = kind(&resolved.resolution), "Placeholder resolved");
            return resolved.resolution;
        };
        warn!(error = %e, resolution = kind(&resolved.resolution), "Failed to resolve placeholder");

        let Some(apology) = resolved.into_apology() else {
            error!(error = %e, "Failed to post apology");
            return Resolution::Apologized;
        };
        if let Err(e) = self.apply(&apology).await {
            error!(error = %e, "Failed to post apology");
        }
        apology.resolution
    }

    async fn apply(&self, placeholder: &ResolvedPlaceholder) -> Result<(), SlackApiError> {
        let ResolvedPlaceholder {
            channel,
            ts,
            user,
            resolution,
        } = placeholder;
        match resolution {
            Resolution::Answered(answer) => {
                self.chat
                    .update_message(channel, ts, &answer_text(user, answer))
                    .await
            }
            Resolution::Cleared => self.chat.delete_message(channel, ts).await,
            Resolution::Apologized => {
                self.chat
                    .update_message(channel, ts, &apology_text(user))
                    .await
            }
        }
    }
}

fn kind(resolution: &Resolution) -> &'static str {
    match resolution {
        Resolution::Answered(_) => "answered",
        Resolution::Cleared => "cleared",
        Resolution::Apologized => "apologized",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::ResponseBody;
    use crate::test_support::{ChatCall, MockChat, MockWorkflow};
    use crate::workflow::{WorkflowError, WorkflowReply};
    use serde_json::json;

    fn payload() -> Vec<u8> {
        serde_json::to_vec(&json!({
            "question": "what is the deploy status",
            "channel_id": "C1",
            "user_id": "U1",
            "message_ts": "1700000000.000100"
        }))
        .unwrap()
    }

    fn update(text: &str) -> ChatCall {
        ChatCall::Update {
            channel: "C1".into(),
            ts: "1700000000.000100".into(),
            text: text.into(),
        }
    }

    #[tokio::test]
    async fn answer_replaces_placeholder() {
        let chat = MockChat::new();
        let workflow = MockWorkflow::answering("all green");
        let consumer = AnswerConsumer::new(chat.clone(), workflow.clone());

        let outcome = consumer.process(&payload()).await;

        assert_eq!(outcome, ConsumeOutcome::Completed(Resolution::Answered("all green".into())));
        assert_eq!(chat.calls(), vec![update("<@U1> all green")]);
        assert_eq!(
            workflow.runs(),
            vec![WorkflowRun::for_question("what is the deploy status", "U1")]
        );
        assert_eq!(workflow.runs()[0].user, "slack-U1");
        assert_eq!(
            outcome.response(),
            HandlerResponse::text(StatusCode::OK, "Processing complete.")
        );
    }

    #[tokio::test]
    async fn empty_answer_deletes_placeholder() {
        let chat = MockChat::new();
        let consumer = AnswerConsumer::new(chat.clone(), MockWorkflow::answering(""));

        let outcome = consumer.process(&payload()).await;

        assert_eq!(outcome, ConsumeOutcome::Completed(Resolution::Cleared));
        assert_eq!(
            chat.calls(),
            vec![ChatCall::Delete {
                channel: "C1".into(),
                ts: "1700000000.000100".into()
            }]
        );
    }

    #[tokio::test]
    async fn error_status_deletes_placeholder() {
        let chat = MockChat::new();
        let workflow = MockWorkflow::replying(Ok(WorkflowReply {
            status: 503,
            answer: String::new(),
        }));
        let consumer = AnswerConsumer::new(chat.clone(), workflow);

        consumer.process(&payload()).await;

        assert!(matches!(chat.calls().as_slice(), [ChatCall::Delete { .. }]));
    }

    #[tokio::test]
    async fn workflow_failure_posts_apology() {
        let chat = MockChat::new();
        let workflow = MockWorkflow::replying(Err(WorkflowError::Transport("connection refused".into())));
        let consumer = AnswerConsumer::new(chat.clone(), workflow);

        let outcome = consumer.process(&payload()).await;

        assert_eq!(outcome, ConsumeOutcome::Completed(Resolution::Apologized));
        assert_eq!(
            chat.calls(),
            vec![update("<@U1> Sorry, something went wrong while preparing an answer.")]
        );
    }

    #[tokio::test]
    async fn failed_answer_edit_falls_back_to_apology() {
        let chat = MockChat::new();
        chat.fail_edits(1);
        let consumer = AnswerConsumer::new(chat.clone(), MockWorkflow::answering("all green"));

        let outcome = consumer.process(&payload()).await;

        assert_eq!(outcome, ConsumeOutcome::Completed(Resolution::Apologized));
        assert_eq!(
            chat.calls(),
            vec![
                update("<@U1> all green"),
                update("<@U1> Sorry, something went wrong while preparing an answer."),
            ]
        );
    }

    #[tokio::test]
    async fn failed_apology_is_not_retried() {
        let chat = MockChat::new();
        chat.fail_edits(2);
        let workflow = MockWorkflow::replying(Err(WorkflowError::Stream("reset".into())));
        let consumer = AnswerConsumer::new(chat.clone(), workflow);

        let outcome = consumer.process(&payload()).await;

        assert_eq!(outcome, ConsumeOutcome::Completed(Resolution::Apologized));
        assert_eq!(chat.calls().len(), 1);
    }

    #[tokio::test]
    async fn malformed_payload_is_rejected_without_calls() {
        let chat = MockChat::new();
        let workflow = MockWorkflow::answering("x");
        let consumer = AnswerConsumer::new(chat.clone(), workflow.clone());

        for body in [&b"not json"[..], br#"{"question":"q"}"#] {
            let outcome = consumer.process(body).await;
            assert_eq!(outcome, ConsumeOutcome::Rejected);
            let response = outcome.response();
            assert_eq!(response.status, StatusCode::BAD_REQUEST);
            assert_eq!(response.body, ResponseBody::Text("Invalid message body.".into()));
        }
        assert!(chat.calls().is_empty());
        assert!(workflow.runs().is_empty());
    }
}
