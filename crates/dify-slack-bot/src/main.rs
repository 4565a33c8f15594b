use std::sync::Arc;
use std::time::Duration;

use async_nats::jetstream;
use bridge_nats::{connect, ensure_work_stream};
use bridge_secret::{HashicorpSecretStore, SecretGate};
use bridge_std::{SystemClock, SystemEnv};
use dify_slack_bot::config::WebhookConfig;
use dify_slack_bot::announce::{self, Announcer};
use dify_slack_bot::trigger::WorkflowTrigger;
use dify_slack_bot::{
    CommandPipeline, DifyClient, MentionReceiver, SlackSignatureVerifier, SlackWebClient,
    authorizer, server, trigger,
};

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

    let config = WebhookConfig::from_env(&SystemEnv)?;

    tracing::info!("Connecting to NATS...");
    let nats = connect(&config.nats, NATS_CONNECT_TIMEOUT).await?;
    let js = jetstream::new(nats.clone());
    ensure_work_stream(&js, &config.queue).await?;
    tracing::info!(stream = %config.queue.stream, "Work queue ready");

    let http = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()?;
    let chat = SlackWebClient::connect(
        config.slack.bot_token.as_str(),
        &config.slack.api_base,
        config.slack.timeout,
    )?;

    let mentions = MentionReceiver::new(chat.clone(), js, config.queue.subject.clone())
        .with_bot_user_id(config.bot_user_id.clone());
    let commands = CommandPipeline::new(
        SlackSignatureVerifier::new(&config.signing_secret, SystemClock),
        nats,
        config.command_subject.clone(),
    );
    let mut app = server::router(mentions, commands);

    match (&config.secret_gate, &config.trigger) {
        (Some(gate_config), trigger_config) => {
            let store = HashicorpSecretStore::new(
                http.clone(),
                &gate_config.vault_addr,
                &gate_config.vault_mount,
                &gate_config.vault_token,
            );
            let gate = Arc::new(SecretGate::new(store, &gate_config.secret_name));
            app = app.merge(authorizer::routes(gate.clone()));
            tracing::info!(secret = %gate_config.secret_name, "Secret gate enabled");

            if let Some(trigger_config) = trigger_config {
                let dify = DifyClient::new(http, &trigger_config.api_url, &trigger_config.api_key);
                app = app.merge(trigger::routes(gate.clone(), WorkflowTrigger::new(dify, &trigger_config.user)));
                tracing::info!("Workflow trigger enabled");
            }

            if let Some(announce_config) = &config.announce {
                let announcer = Announcer::new(
                    chat,
                    &announce_config.channel_id,
                    &announce_config.default_message,
                );
                app = app.merge(announce::routes(gate, announcer));
                tracing::info!(channel = %announce_config.channel_id, "Announcements enabled");
            }
        }
        (None, trigger_config) => {
            if trigger_config.is_some() {
                tracing::warn!("DIFY_TRIGGER_URL is set but SECRET_NAME is not; workflow trigger disabled");
            }
            if config.announce.is_some() {
                tracing::warn!("MAIN_CHANNEL_ID is set but SECRET_NAME is not; announcements disabled");
            }
        }
    }

    tokio::select! {
        result = server::serve(app, config.port) => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("Shutting down"),
    }
    Ok(())
}
