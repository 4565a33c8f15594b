//! Events API webhook: answers the URL handshake and turns each user
//! mention into a placeholder message plus a queued work item.
//!
//! Every outcome is `200`, so Slack never retries a delivery because of
//! something this side did.

use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use bridge_nats::JetStreamPublishClient;
use bridge_types::{MentionWorkItem, SlackEventCallback};
use serde_json::{Value, json};
use tracing::{info, instrument, warn};

use crate::format::placeholder_text;
use crate::response::HandlerResponse;
use crate::slack_api::ChatApi;

pub const EVENTS_PATH: &str = "/slack/events";

/// Present on deliveries Slack is re-sending after a timeout or error.
pub const RETRY_NUM_HEADER: &str = "x-slack-retry-num";

pub struct MentionReceiver<C, Q> {
    chat: C,
    queue: Q,
    work_subject: String,
    bot_user_id: Option<String>,
}

impl<C: ChatApi, Q: JetStreamPublishClient> MentionReceiver<C, Q> {
    pub fn new(chat: C, queue: Q, work_subject: impl Into<String>) -> Self {
        Self {
            chat,
            queue,
            work_subject: work_subject.into(),
            bot_user_id: None,
        }
    }

    /// Mentions authored by this user id are ignored.
    pub fn with_bot_user_id(mut self, bot_user_id: Option<String>) -> Self {
        self.bot_user_id = bot_user_id;
        self
    }

    #[instrument(
        name = "slack.mention",
        skip_all,
        fields(
            kind = tracing::field::Empty,
            channel = tracing::field::Empty,
            user = tracing::field::Empty
        )
    )]
    pub async fn handle(&self, headers: &HeaderMap, body: &[u8]) -> HandlerResponse {
        let raw: Value = match serde_json::from_slice(body) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Ignoring event body that is not valid JSON");
                return HandlerResponse::ok();
            }
        };

        // Answered before anything else in the body is looked at.
        if let Some(challenge) = raw.get("challenge") {
            info!("Answering URL verification challenge");
            return HandlerResponse::json(StatusCode::OK, json!({ "challenge": challenge }));
        }

        let callback: SlackEventCallback = match serde_json::from_value(raw) {
            Ok(callback) => callback,
            Err(e) => {
                warn!(error = %e, "Ignoring event body with an unexpected shape");
                return HandlerResponse::ok();
            }
        };
        let Some(event) = callback.event else {
            warn!(kind = ?callback.kind, "Ignoring callback without an event");
            return HandlerResponse::ok();
        };
        tracing::Span::current().record("kind", event.kind.as_str());
        if event.is_bot_authored(self.bot_user_id.as_deref()) {
            info!("Ignoring bot-authored event");
            return HandlerResponse::ok();
        }
        if headers.contains_key(RETRY_NUM_HEADER) {
            info!("Ignoring Slack retry delivery");
            return HandlerResponse::ok();
        }

        let (Some(channel), Some(user)) = (event.channel.as_deref(), event.user.as_deref()) else {
            warn!("Ignoring event without channel or user");
            return HandlerResponse::ok();
        };
        let span = tracing::Span::current();
        span.record("channel", channel);
        span.record("user", user);

        let message_ts = match self.chat.post_message(channel, &placeholder_text(user)).await {
            Ok(ts) => ts,
            Err(e) => {
                warn!(error = %e, "Failed to post placeholder");
                return HandlerResponse::ok();
            }
        };

        let item = MentionWorkItem {
            question: event.question().to_string(),
            channel_id: channel.to_string(),
            user_id: user.to_string(),
            message_ts,
        };
        self.enqueue(&item).await;
        HandlerResponse::ok()
    }

    async fn enqueue(&self, item: &MentionWorkItem) {
        let payload = match serde_json::to_vec(item) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Failed to serialize work item");
                return;
            }
        };
        match self
            .queue
            .publish_durable(self.work_subject.clone(), Bytes::from(payload))
            .await
        {
            Ok(()) => info!(subject = %self.work_subject, ts = %item.message_ts, "Queued mention"),
            Err(e) => warn!(error = %e, subject = %self.work_subject, "Failed to queue mention"),
        }
    }
}

async fn handle_events<C: ChatApi, Q: JetStreamPublishClient>(
    State(receiver): State<Arc<MentionReceiver<C, Q>>>,
    headers: HeaderMap,
    body: Bytes,
) -> HandlerResponse {
    receiver.handle(&headers, &body).await
}

pub fn routes<C: ChatApi, Q: JetStreamPublishClient>(receiver: MentionReceiver<C, Q>) -> Router {
    Router::new()
        .route(EVENTS_PATH, post(handle_events::<C, Q>))
        .with_state(Arc::new(receiver))
}
