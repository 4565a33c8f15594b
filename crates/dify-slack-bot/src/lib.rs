//! # dify-slack-bot
//!
//! Bridges Slack mentions and slash commands to a Dify workflow.
//!
//! ## How it works
//!
//! 1. Slack posts an `app_mention` to `POST /slack/events`. The bot answers
//!    `200 ok` right away, posts a "Thinking..." placeholder and publishes a
//!    [`MentionWorkItem`](bridge_types::MentionWorkItem) to the JetStream work
//!    queue.
//! 2. `dify-answer-worker` pulls the item, runs the workflow in streaming mode
//!    and replaces the placeholder with the answer. An empty answer deletes
//!    it, a failure replaces it with an apology.
//! 3. Slash commands hit `/slack/commands`. After signature verification the
//!    command is published on a core NATS subject for an external processor
//!    and Slack gets an immediate acknowledgement.
//! 4. With `SECRET_NAME` set, `POST /authorize` checks the
//!    `x-dify-secret-key` header against a secret in Vault, and
//!    `POST /workflows/trigger` runs the workflow behind that check.
//!    With `MAIN_CHANNEL_ID` also set, `POST /announce` posts a message to
//!    that channel behind the same check.
//!
//! ## Binaries
//!
//! | Binary | Role |
//! |---|---|
//! | `dify-slack-bot` | webhook server ([`config::WebhookConfig`]) |
//! | `dify-answer-worker` | queue consumer ([`config::WorkerConfig`]) |

pub mod announce;
pub mod answer_stream;
pub mod authorizer;
pub mod command;
pub mod config;
pub mod consumer;
pub mod format;
pub mod health;
pub mod mention;
pub mod response;
pub mod server;
pub mod signature;
pub mod slack_api;
pub mod trigger;
pub mod worker;
pub mod workflow;

#[cfg(test)]
mod test_support;

pub use command::CommandPipeline;
pub use consumer::{AnswerConsumer, ConsumeOutcome};
pub use mention::MentionReceiver;
pub use signature::SlackSignatureVerifier;
pub use slack_api::{ChatApi, SlackWebClient};
pub use workflow::{DifyClient, WorkflowApi};
