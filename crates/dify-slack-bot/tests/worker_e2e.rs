//! Answer worker against a real JetStream work queue.
//!
//! Requires Docker (uses testcontainers to spin up a NATS server with JetStream).
//!
//! Run with:
//!   cargo test -p dify-slack-bot --test worker_e2e

use std::time::Duration;

use async_nats::jetstream;
use bridge_nats::{
    JetStreamPublishClient, NatsConfig, WorkQueueConfig, connect, ensure_work_stream, work_consumer,
};
use dify_slack_bot::worker::{self, WorkerSettings};
use dify_slack_bot::{AnswerConsumer, DifyClient, SlackWebClient};
use httpmock::prelude::*;
use serde_json::json;
use testcontainers_modules::nats::Nats;
use testcontainers_modules::testcontainers::{ContainerAsync, ImageExt, runners::AsyncRunner};

async fn start_nats() -> (ContainerAsync<Nats>, u16) {
    let container: ContainerAsync<Nats> = Nats::default()
        .with_cmd(["--jetstream"])
        .start()
        .await
        .expect("Failed to start NATS container, is Docker running?");
    let port = container.get_host_port_ipv4(4222).await.unwrap();
    (container, port)
}

fn settings(concurrency: usize) -> WorkerSettings {
    WorkerSettings {
        concurrency,
        progress_interval: Duration::from_secs(1),
    }
}

async fn wait_for_hits(mock: &httpmock::Mock<'_>, hits: usize) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while mock.hits_async().await < hits {
        if tokio::time::Instant::now() >= deadline {
            panic!("expected {hits} hits within 10s");
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

/// Work-queue retention drops a message once it is acked or terminated.
async fn wait_for_drained(js: &jetstream::Context, stream: &str) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        let mut handle = js.get_stream(stream).await.unwrap();
        if handle.info().await.unwrap().state.messages == 0 {
            return;
        }
        if tokio::time::Instant::now() >= deadline {
            panic!("stream {stream} not drained within 10s");
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

#[tokio::test]
async fn worker_answers_and_acks_queued_mentions() {
    let (_container, port) = start_nats().await;
    let nats = connect(
        &NatsConfig::from_url(format!("nats://127.0.0.1:{port}")),
        Duration::from_secs(10),
    )
    .await
    .unwrap();
    let js = jetstream::new(nats);
    let queue = WorkQueueConfig::default();
    ensure_work_stream(&js, &queue).await.unwrap();
    let consumer = work_consumer(&js, &queue).await.unwrap();

    let slack = MockServer::start_async().await;
    let dify = MockServer::start_async().await;
    let update = slack
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/chat.update")
                .json_body_partial(r#"{"channel": "C1", "ts": "1700000001.000200", "text": "<@U1> 42"}"#);
            then.status(200)
                .json_body(json!({"ok": true, "channel": "C1", "ts": "1700000001.000200"}));
        })
        .await;
    dify.mock_async(|when, then| {
        when.method(POST).path("/v1/workflows/run");
        then.status(200).body("data: {\"answer\":\"42\"}\n\n");
    })
    .await;

    let answers = AnswerConsumer::new(
        SlackWebClient::cleartext("xoxb-test", &slack.base_url(), Duration::from_secs(5)),
        DifyClient::new(reqwest::Client::new(), dify.url("/v1/workflows/run"), "app-key"),
    );
    tokio::spawn(async move {
        let _ = worker::run(consumer, &answers, settings(2)).await;
    });

    let item = json!({
        "question": "meaning of life",
        "channel_id": "C1",
        "user_id": "U1",
        "message_ts": "1700000001.000200"
    });
    js.publish_durable(queue.subject.clone(), item.to_string().into())
        .await
        .unwrap();

    wait_for_hits(&update, 1).await;
    wait_for_drained(&js, &queue.stream).await;
}

#[tokio::test]
async fn malformed_item_is_terminated_without_edits() {
    let (_container, port) = start_nats().await;
    let nats = connect(
        &NatsConfig::from_url(format!("nats://127.0.0.1:{port}")),
        Duration::from_secs(10),
    )
    .await
    .unwrap();
    let js = jetstream::new(nats);
    let queue = WorkQueueConfig::default();
    ensure_work_stream(&js, &queue).await.unwrap();
    let consumer = work_consumer(&js, &queue).await.unwrap();

    let slack = MockServer::start_async().await;
    let dify = MockServer::start_async().await;
    let edits = slack
        .mock_async(|when, then| {
            when.method(POST);
            then.status(200).json_body(json!({"ok": true}));
        })
        .await;

    let answers = AnswerConsumer::new(
        SlackWebClient::cleartext("xoxb-test", &slack.base_url(), Duration::from_secs(5)),
        DifyClient::new(reqwest::Client::new(), dify.url("/v1/workflows/run"), "app-key"),
    );
    tokio::spawn(async move {
        let _ = worker::run(consumer, &answers, settings(1)).await;
    });

    js.publish_durable(queue.subject.clone(), "not json".into())
        .await
        .unwrap();

    wait_for_drained(&js, &queue.stream).await;
    assert_eq!(edits.hits_async().await, 0);
}
