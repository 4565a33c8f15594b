//! Recording doubles for [`ChatApi`] and [`WorkflowApi`].

use std::sync::{Arc, Mutex};

use crate::slack_api::{ChatApi, SlackApiError};
use crate::workflow::{WorkflowApi, WorkflowError, WorkflowReply, WorkflowRun};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCall {
    Post { channel: String, text: String },
    Update { channel: String, ts: String, text: String },
    Delete { channel: String, ts: String },
}

/// Posts succeed with `ts` unless configured otherwise.
#[derive(Clone)]
pub struct MockChat {
    calls: Arc<Mutex<Vec<ChatCall>>>,
    post_result: Arc<Mutex<Result<String, SlackApiError>>>,
    failing_edits: Arc<Mutex<u32>>,
}

impl MockChat {
    pub fn new() -> Self {
        Self {
            calls: Arc::default(),
            post_result: Arc::new(Mutex::new(Ok("1700000000.000100".to_string()))),
            failing_edits: Arc::default(),
        }
    }

    pub fn post_returns(&self, result: Result<String, SlackApiError>) {
        *self.post_result.lock().unwrap() = result;
    }

    /// The next `n` updates or deletes fail.
    pub fn fail_edits(&self, n: u32) {
        *self.failing_edits.lock().unwrap() = n;
    }

    pub fn calls(&self) -> Vec<ChatCall> {
        self.calls.lock().unwrap().clone()
    }

    fn edit(&self, call: ChatCall) -> Result<(), SlackApiError> {
        self.calls.lock().unwrap().push(call);
        let mut failing = self.failing_edits.lock().unwrap();
        if *failing > 0 {
            *failing -= 1;
            return Err(SlackApiError::Transport("simulated edit failure".into()));
        }
        Ok(())
    }
}

impl ChatApi for MockChat {
    async fn post_message(&self, channel: &str, text: &str) -> Result<String, SlackApiError> {
        self.calls.lock().unwrap().push(ChatCall::Post {
            channel: channel.into(),
            text: text.into(),
        });
        self.post_result.lock().unwrap().clone()
    }

    async fn update_message(&self, channel: &str, ts: &str, text: &str) -> Result<(), SlackApiError> {
        self.edit(ChatCall::Update {
            channel: channel.into(),
            ts: ts.into(),
            text: text.into(),
        })
    }

    async fn delete_message(&self, channel: &str, ts: &str) -> Result<(), SlackApiError> {
        self.edit(ChatCall::Delete {
            channel: channel.into(),
            ts: ts.into(),
        })
    }
}

/// Answers every run with the configured reply.
#[derive(Clone)]
pub struct MockWorkflow {
    runs: Arc<Mutex<Vec<WorkflowRun>>>,
    reply: Arc<Mutex<Result<WorkflowReply, WorkflowError>>>,
}

impl MockWorkflow {
    pub fn answering(answer: &str) -> Self {
        Self::replying(Ok(WorkflowReply {
            status: 200,
            answer: answer.to_string(),
        }))
    }

    pub fn replying(reply: Result<WorkflowReply, WorkflowError>) -> Self {
        Self {
            runs: Arc::default(),
            reply: Arc::new(Mutex::new(reply)),
        }
    }

    pub fn runs(&self) -> Vec<WorkflowRun> {
        self.runs.lock().unwrap().clone()
    }
}

impl WorkflowApi for MockWorkflow {
    async fn run(&self, run: &WorkflowRun) -> Result<WorkflowReply, WorkflowError> {
        self.runs.lock().unwrap().push(run.clone());
        self.reply.lock().unwrap().clone()
    }
}
