use std::time::Duration;

use bridge_nats::{NatsConfig, WorkQueueConfig};
use bridge_std::ReadEnv;
use bridge_types::subjects::DIFY_COMMAND_SUBJECT;

use crate::slack_api::DEFAULT_SLACK_API_BASE;
use crate::trigger::DEFAULT_TRIGGER_USER;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_HEALTH_PORT: u16 = 8080;
const DEFAULT_VAULT_MOUNT: &str = "secret";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 120;
const DEFAULT_WORKER_CONCURRENCY: usize = 4;
/// Slack expects the Events API answer within about 3 s.
const DEFAULT_WEBHOOK_SLACK_TIMEOUT_SECS: u64 = 2;
const DEFAULT_WORKER_SLACK_TIMEOUT_SECS: u64 = 10;
const ACK_WAIT_MARGIN: Duration = Duration::from_secs(30);
const MIN_PROGRESS_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_ANNOUNCE_MESSAGE: &str = "Hello from dify-slack-bot!";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
}

fn required<E: ReadEnv>(env: &E, key: &'static str) -> Result<String, ConfigError> {
    env.non_empty_var(key).ok_or(ConfigError::Missing(key))
}

fn parsed_or<E: ReadEnv, T: std::str::FromStr>(env: &E, key: &str, default: T) -> T {
    env.non_empty_var(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Bot-token access to the Slack Web API.
#[derive(Debug, Clone)]
pub struct SlackApiConfig {
    pub bot_token: String,
    pub api_base: String,
    /// Bound on each `chat.*` call (`SLACK_API_TIMEOUT_SECS`).
    pub timeout: Duration,
}

impl SlackApiConfig {
    fn from_env<E: ReadEnv>(env: &E, default_timeout_secs: u64) -> Result<Self, ConfigError> {
        Ok(Self {
            bot_token: required(env, "SLACK_BOT_TOKEN")?,
            api_base: env
                .non_empty_var("SLACK_API_BASE")
                .unwrap_or_else(|| DEFAULT_SLACK_API_BASE.to_string()),
            timeout: Duration::from_secs(parsed_or(
                env,
                "SLACK_API_TIMEOUT_SECS",
                default_timeout_secs,
            )),
        })
    }
}

/// Where the reference secret for the gate lives.
#[derive(Debug, Clone)]
pub struct SecretGateConfig {
    pub secret_name: String,
    pub vault_addr: String,
    pub vault_token: String,
    pub vault_mount: String,
}

/// Manual workflow trigger; needs its own run URL.
#[derive(Debug, Clone)]
pub struct TriggerConfig {
    pub api_url: String,
    pub api_key: String,
    pub user: String,
}

/// Announcement route posting to a fixed channel.
#[derive(Debug, Clone)]
pub struct AnnounceConfig {
    pub channel_id: String,
    pub default_message: String,
}

/// Time JetStream waits for an ack before redelivering: one workflow run
/// plus a placeholder edit and its apology fallback, with some margin.
pub fn answer_ack_wait(workflow_timeout: Duration, slack_timeout: Duration) -> Duration {
    workflow_timeout + slack_timeout * 2 + ACK_WAIT_MARGIN
}

/// Configuration of the `dify-slack-bot` webhook server.
///
/// - `SLACK_BOT_TOKEN` (required), `SLACK_API_BASE` (default `https://slack.com`)
/// - `SLACK_API_TIMEOUT_SECS` (default 2, inside Slack's webhook deadline)
/// - `SLACK_SIGNING_SECRET` (required)
/// - `SLACK_BOT_USER_ID`: mentions authored by this user are ignored
/// - `BRIDGE_PORT` (default 3000)
/// - `DIFY_COMMAND_SUBJECT` (default `dify.command.dispatch`)
/// - `SECRET_NAME`: enables `/authorize`; then `VAULT_ADDR` and `VAULT_TOKEN`
///   are required and `VAULT_MOUNT` defaults to `secret`
/// - `DIFY_TRIGGER_URL`: enables `/workflows/trigger` (needs the gate and
///   `DIFY_API_KEY`); `DIFY_TRIGGER_USER` defaults to `dify-slack-bridge`
/// - `MAIN_CHANNEL_ID`: enables `/announce` (needs the gate);
///   `ANNOUNCE_MESSAGE` is the text used when a request names none
/// - `DIFY_HTTP_TIMEOUT_SECS` (default 120)
/// - `DIFY_WORK_*` queue settings and `NATS_*` connection settings
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub slack: SlackApiConfig,
    pub signing_secret: String,
    pub bot_user_id: Option<String>,
    pub port: u16,
    pub command_subject: String,
    pub secret_gate: Option<SecretGateConfig>,
    pub trigger: Option<TriggerConfig>,
    pub announce: Option<AnnounceConfig>,
    pub http_timeout: Duration,
    pub queue: WorkQueueConfig,
    pub nats: NatsConfig,
}

impl WebhookConfig {
    pub fn from_env<E: ReadEnv>(env: &E) -> Result<Self, ConfigError> {
        let secret_gate = match env.non_empty_var("SECRET_NAME") {
            Some(secret_name) => Some(SecretGateConfig {
                secret_name,
                vault_addr: required(env, "VAULT_ADDR")?,
                vault_token: required(env, "VAULT_TOKEN")?,
                vault_mount: env
                    .non_empty_var("VAULT_MOUNT")
                    .unwrap_or_else(|| DEFAULT_VAULT_MOUNT.to_string()),
            }),
            None => None,
        };
        let trigger = match env.non_empty_var("DIFY_TRIGGER_URL") {
            Some(api_url) => Some(TriggerConfig {
                api_url,
                api_key: required(env, "DIFY_API_KEY")?,
                user: env
                    .non_empty_var("DIFY_TRIGGER_USER")
                    .unwrap_or_else(|| DEFAULT_TRIGGER_USER.to_string()),
            }),
            None => None,
        };
        let announce = env.non_empty_var("MAIN_CHANNEL_ID").map(|channel_id| AnnounceConfig {
            channel_id,
            default_message: env
                .non_empty_var("ANNOUNCE_MESSAGE")
                .unwrap_or_else(|| DEFAULT_ANNOUNCE_MESSAGE.to_string()),
        });

        Ok(Self {
            slack: SlackApiConfig::from_env(env, DEFAULT_WEBHOOK_SLACK_TIMEOUT_SECS)?,
            signing_secret: required(env, "SLACK_SIGNING_SECRET")?,
            bot_user_id: env.non_empty_var("SLACK_BOT_USER_ID"),
            port: parsed_or(env, "BRIDGE_PORT", DEFAULT_PORT),
            command_subject: env
                .non_empty_var("DIFY_COMMAND_SUBJECT")
                .unwrap_or_else(|| DIFY_COMMAND_SUBJECT.to_string()),
            secret_gate,
            trigger,
            announce,
            http_timeout: Duration::from_secs(parsed_or(
                env,
                "DIFY_HTTP_TIMEOUT_SECS",
                DEFAULT_HTTP_TIMEOUT_SECS,
            )),
            queue: WorkQueueConfig::from_env(env),
            nats: NatsConfig::from_env(env),
        })
    }
}

/// Configuration of the `dify-answer-worker`.
///
/// - `SLACK_BOT_TOKEN` (required), `SLACK_API_BASE`
/// - `SLACK_API_TIMEOUT_SECS` (default 10)
/// - `DIFY_API_URL`, `DIFY_API_KEY` (required)
/// - `DIFY_HTTP_TIMEOUT_SECS` (default 120)
/// - `DIFY_WORKER_CONCURRENCY` (default 4), also the pull batch size
/// - `HEALTH_PORT` (default 8080)
/// - `DIFY_WORK_*` queue settings and `NATS_*` connection settings. Without
///   `DIFY_WORK_ACK_WAIT_SECS` the ack wait is [`answer_ack_wait`] of the
///   two timeouts.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub slack: SlackApiConfig,
    pub dify_api_url: String,
    pub dify_api_key: String,
    pub http_timeout: Duration,
    pub concurrency: usize,
    /// How often an in-flight item is reported as still being worked on.
    pub progress_interval: Duration,
    pub health_port: u16,
    pub queue: WorkQueueConfig,
    pub nats: NatsConfig,
}

impl WorkerConfig {
    pub fn from_env<E: ReadEnv>(env: &E) -> Result<Self, ConfigError> {
        let slack = SlackApiConfig::from_env(env, DEFAULT_WORKER_SLACK_TIMEOUT_SECS)?;
        let http_timeout = Duration::from_secs(parsed_or(
            env,
            "DIFY_HTTP_TIMEOUT_SECS",
            DEFAULT_HTTP_TIMEOUT_SECS,
        ));

        let mut queue = WorkQueueConfig::from_env(env);
        let explicit_ack_wait = env
            .non_empty_var("DIFY_WORK_ACK_WAIT_SECS")
            .is_some_and(|v| v.trim().parse::<u64>().is_ok());
        if !explicit_ack_wait {
            queue.ack_wait = answer_ack_wait(http_timeout, slack.timeout);
        }

        Ok(Self {
            dify_api_url: required(env, "DIFY_API_URL")?,
            dify_api_key: required(env, "DIFY_API_KEY")?,
            concurrency: parsed_or(env, "DIFY_WORKER_CONCURRENCY", DEFAULT_WORKER_CONCURRENCY).max(1),
            progress_interval: (queue.ack_wait / 2).max(MIN_PROGRESS_INTERVAL),
            health_port: parsed_or(env, "HEALTH_PORT", DEFAULT_HEALTH_PORT),
            slack,
            http_timeout,
            queue,
            nats: NatsConfig::from_env(env),
        })
    }
}
