//! JetStream provisioning for the mention work queue.

use async_nats::jetstream::consumer::{AckPolicy, Consumer, pull};
use async_nats::jetstream::context::CreateStreamError;
use async_nats::jetstream::stream::{Config as StreamConfig, RetentionPolicy, StorageType, Stream};
use async_nats::jetstream;
use bridge_std::ReadEnv;
use bridge_types::subjects::{DIFY_WORK_CONSUMER, DIFY_WORK_STREAM, DIFY_WORK_SUBJECT};
use std::time::Duration;

const DEFAULT_MAX_AGE_SECS: u64 = 60 * 60;
const DEFAULT_ACK_WAIT_SECS: u64 = 120;
const MAX_DELIVER: i64 = 3;

/// Names and limits of the work queue.
///
/// - `DIFY_WORK_STREAM` (default `DIFY_MENTIONS`)
/// - `DIFY_WORK_SUBJECT` (default `dify.mention.work`)
/// - `DIFY_WORK_CONSUMER` (default `dify-answer-workers`)
/// - `DIFY_WORK_MAX_AGE_SECS`: unprocessed items are dropped after this (default 3600)
/// - `DIFY_WORK_ACK_WAIT_SECS`: redelivery timeout without a progress ack
///   (default 120)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkQueueConfig {
    pub stream: String,
    pub subject: String,
    pub consumer: String,
    pub max_age: Duration,
    pub ack_wait: Duration,
}

impl Default for WorkQueueConfig {
    fn default() -> Self {
        Self {
            stream: DIFY_WORK_STREAM.to_string(),
            subject: DIFY_WORK_SUBJECT.to_string(),
            consumer: DIFY_WORK_CONSUMER.to_string(),
            max_age: Duration::from_secs(DEFAULT_MAX_AGE_SECS),
            ack_wait: Duration::from_secs(DEFAULT_ACK_WAIT_SECS),
        }
    }
}

impl WorkQueueConfig {
    pub fn from_env<E: ReadEnv>(env: &E) -> Self {
        let defaults = Self::default();
        let secs = |key: &str, fallback: Duration| {
            env.non_empty_var(key)
                .and_then(|v| v.trim().parse().ok())
                .map_or(fallback, Duration::from_secs)
        };
        Self {
            stream: env.non_empty_var("DIFY_WORK_STREAM").unwrap_or(defaults.stream),
            subject: env.non_empty_var("DIFY_WORK_SUBJECT").unwrap_or(defaults.subject),
            consumer: env.non_empty_var("DIFY_WORK_CONSUMER").unwrap_or(defaults.consumer),
            max_age: secs("DIFY_WORK_MAX_AGE_SECS", defaults.max_age),
            ack_wait: secs("DIFY_WORK_ACK_WAIT_SECS", defaults.ack_wait),
        }
    }

    fn stream_config(&self) -> StreamConfig {
        StreamConfig {
            name: self.stream.clone(),
            subjects: vec![self.subject.clone()],
            // An item leaves the stream once a worker acks it.
            retention: RetentionPolicy::WorkQueue,
            storage: StorageType::File,
            max_age: self.max_age,
            ..Default::default()
        }
    }

    fn consumer_config(&self) -> pull::Config {
        pull::Config {
            durable_name: Some(self.consumer.clone()),
            filter_subject: self.subject.clone(),
            ack_policy: AckPolicy::Explicit,
            ack_wait: self.ack_wait,
            max_deliver: MAX_DELIVER,
            ..Default::default()
        }
    }
}

/// Idempotent; both the webhook and the worker call it on startup.
pub async fn ensure_work_stream(
    js: &jetstream::Context,
    config: &WorkQueueConfig,
) -> Result<Stream, CreateStreamError> {
    js.get_or_create_stream(config.stream_config()).await
}

/// Durable pull consumer shared by all worker replicas.
pub async fn work_consumer(
    js: &jetstream::Context,
    config: &WorkQueueConfig,
) -> Result<Consumer<pull::Config>, async_nats::Error> {
    let stream = js.get_stream(&config.stream).await?;
    let consumer = stream
        .get_or_create_consumer(&config.consumer, config.consumer_config())
        .await?;
    Ok(consumer)
}
