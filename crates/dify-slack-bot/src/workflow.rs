//! Client for the Dify workflow run API in streaming mode.

use serde::Serialize;
use serde_json::{Map, Value};
use std::future::Future;
use tracing::{info, warn};

use crate::answer_stream::{answer_fragments, collect_answer};

/// One workflow invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowRun {
    pub inputs: Map<String, Value>,
    /// End-user identifier reported to the workflow backend.
    pub user: String,
}

impl WorkflowRun {
    /// Run for a Slack user's question, attributed as `slack-<user_id>`.
    pub fn for_question(question: &str, user_id: &str) -> Self {
        let mut inputs = Map::new();
        inputs.insert("question".to_string(), Value::String(question.to_string()));
        Self {
            inputs,
            user: format!("slack-{user_id}"),
        }
    }

    pub fn without_inputs(user: impl Into<String>) -> Self {
        Self {
            inputs: Map::new(),
            user: user.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowReply {
    pub status: u16,
    /// Empty when the status was not a success.
    pub answer: String,
}

impl WorkflowReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    #[error("workflow request failed: {0}")]
    Transport(String),
    #[error("workflow response stream failed: {0}")]
    Stream(String),
}

pub trait WorkflowApi: Send + Sync + Clone + 'static {
    fn run(
        &self,
        run: &WorkflowRun,
    ) -> impl Future<Output = Result<WorkflowReply, WorkflowError>> + Send;
}

#[derive(Serialize)]
struct RunRequest<'a> {
    inputs: &'a Map<String, Value>,
    response_mode: &'static str,
    user: &'a str,
}

#[derive(Clone)]
pub struct DifyClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl DifyClient {
    /// `api_url` is the full run endpoint, e.g. `https://api.dify.ai/v1/workflows/run`.
    pub fn new(http: reqwest::Client, api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_url: api_url.into(),
            api_key: api_key.into(),
        }
    }
}

impl WorkflowApi for DifyClient {
    async fn run(&self, run: &WorkflowRun) -> Result<WorkflowReply, WorkflowError> {
        let body = RunRequest {
            inputs: &run.inputs,
            response_mode: "streaming",
            user: &run.user,
        };
        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| WorkflowError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), user = %run.user, "Workflow API returned an error status");
            return Ok(WorkflowReply {
                status: status.as_u16(),
                answer: String::new(),
            });
        }

        let answer = collect_answer(answer_fragments(Box::pin(response.bytes_stream())))
            .await
            .map_err(|e| WorkflowError::Stream(e.to_string()))?;
        info!(status = status.as_u16(), answer_len = answer.len(), "Workflow run finished");
        Ok(WorkflowReply {
            status: status.as_u16(),
            answer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client(server: &MockServer) -> DifyClient {
        DifyClient::new(reqwest::Client::new(), server.url("/v1/workflows/run"), "app-key")
    }

    #[tokio::test]
    async fn sends_streaming_run_and_collects_answer() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/workflows/run")
                    .header("authorization", "Bearer app-key")
                    .json_body(json!({
                        "inputs": {"question": "what is the deploy status"},
                        "response_mode": "streaming",
                        "user": "slack-U1"
                    }));
                then.status(200)
                    .header("content-type", "text/event-stream")
                    .body(
                        "data: {\"event\":\"workflow_started\"}\n\n\
                         data: {\"event\":\"text_chunk\",\"answer\":\"all \"}\n\n\
                         data: {\"event\":\"text_chunk\",\"answer\":\"green\"}\n\n",
                    );
            })
            .await;

        let reply = client(&server)
            .run(&WorkflowRun::for_question("what is the deploy status", "U1"))
            .await
            .unwrap();
        assert_eq!(
            reply,
            WorkflowReply {
                status: 200,
                answer: "all green".into()
            }
        );
        assert!(reply.is_success());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn error_status_yields_empty_answer() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/workflows/run");
                then.status(500).body("data: {\"answer\":\"ignored\"}\n");
            })
            .await;

        let reply = client(&server)
            .run(&WorkflowRun::for_question("q", "U1"))
            .await
            .unwrap();
        assert_eq!(reply.status, 500);
        assert_eq!(reply.answer, "");
        assert!(!reply.is_success());
    }

    #[tokio::test]
    async fn empty_inputs_serialize_as_object() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/workflows/run").json_body(json!({
                    "inputs": {},
                    "response_mode": "streaming",
                    "user": "dify-slack-bridge"
                }));
                then.status(200).body("");
            })
            .await;

        client(&server)
            .run(&WorkflowRun::without_inputs("dify-slack-bridge"))
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unreachable_backend_is_transport_error() {
        let client = DifyClient::new(reqwest::Client::new(), "http://127.0.0.1:1/v1/workflows/run", "k");
        let err = client
            .run(&WorkflowRun::for_question("q", "U1"))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Transport(_)));
    }
}
