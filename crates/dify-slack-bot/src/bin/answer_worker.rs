//! Answer worker binary.
//!
//! Pulls mention work items from JetStream, runs the Dify workflow for each
//! and edits the Slack placeholder. See [`WorkerConfig`] for the environment.

use std::time::Duration;

use async_nats::jetstream;
use bridge_nats::{connect, ensure_work_stream, work_consumer};
use bridge_std::SystemEnv;
use dify_slack_bot::config::WorkerConfig;
use dify_slack_bot::worker::{self, WorkerSettings};
use dify_slack_bot::{AnswerConsumer, DifyClient, SlackWebClient, health};

const NATS_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = WorkerConfig::from_env(&SystemEnv)?;

    tokio::spawn(health::serve(config.health_port));

    tracing::info!("Connecting to NATS...");
    let nats = connect(&config.nats, NATS_CONNECT_TIMEOUT).await?;
    let js = jetstream::new(nats);
    ensure_work_stream(&js, &config.queue).await?;
    let consumer = work_consumer(&js, &config.queue).await?;
    tracing::info!(consumer = %config.queue.consumer, "Work queue consumer ready");

    let http = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()?;
    let chat = SlackWebClient::connect(
        config.slack.bot_token.as_str(),
        &config.slack.api_base,
        config.slack.timeout,
    )?;
    let answers = AnswerConsumer::new(
        chat,
        DifyClient::new(http, &config.dify_api_url, &config.dify_api_key),
    );
    let settings = WorkerSettings {
        concurrency: config.concurrency,
        progress_interval: config.progress_interval,
    };
    tracing::info!(
        concurrency = settings.concurrency,
        ack_wait = ?config.queue.ack_wait,
        "Starting answer worker"
    );

    tokio::select! {
        result = worker::run(consumer, &answers, settings) => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("Shutting down"),
    }
    Ok(())
}
