//! Posts an announcement to the main channel, behind the secret gate.

use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::routing::post;
use bridge_secret::{SecretGate, SecretStore};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::authorizer::require_secret_key;
use crate::response::HandlerResponse;
use crate::slack_api::{ChatApi, SlackApiError};

pub const ANNOUNCE_PATH: &str = "/announce";

/// Optional JSON body; an empty body posts the default message.
#[derive(Debug, Default, Deserialize)]
pub struct AnnounceRequest {
    #[serde(default)]
    pub message: Option<String>,
}

pub struct Announcer<C> {
    chat: C,
    channel_id: String,
    default_message: String,
}

impl<C: ChatApi> Announcer<C> {
    pub fn new(chat: C, channel_id: impl Into<String>, default_message: impl Into<String>) -> Self {
        Self {
            chat,
            channel_id: channel_id.into(),
            default_message: default_message.into(),
        }
    }

    pub async fn handle(&self, body: &[u8]) -> HandlerResponse {
        let request = if body.iter().all(u8::is_ascii_whitespace) {
            AnnounceRequest::default()
        } else {
            match serde_json::from_slice::<AnnounceRequest>(body) {
                Ok(request) => request,
                Err(e) => {
                    warn!(error = %e, "Rejected announcement body");
                    return HandlerResponse::json(
                        StatusCode::BAD_REQUEST,
                        json!({ "error": "Invalid JSON body." }),
                    );
                }
            }
        };
        self.announce(request.message.as_deref()).await
    }

    pub async fn announce(&self, message: Option<&str>) -> HandlerResponse {
        let text = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(&self.default_message);

        match self.chat.post_message(&self.channel_id, text).await {
            Ok(ts) => {
                info!(channel = %self.channel_id, ts = %ts, "Posted announcement");
                HandlerResponse::json(
                    StatusCode::OK,
                    json!({ "message": "Successfully posted to Slack", "ts": ts }),
                )
            }
            Err(SlackApiError::Api(code)) => {
                warn!(channel = %self.channel_id, error = %code, "Slack rejected announcement");
                HandlerResponse::json(StatusCode::BAD_REQUEST, json!({ "error": code }))
            }
            Err(e) => {
                warn!(channel = %self.channel_id, error = %e, "Announcement failed");
                HandlerResponse::json(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
        }
    }
}

async fn handle_announce<C: ChatApi>(
    State(announcer): State<Arc<Announcer<C>>>,
    body: Bytes,
) -> HandlerResponse {
    announcer.handle(&body).await
}

pub fn routes<S: SecretStore, C: ChatApi>(gate: Arc<SecretGate<S>>, announcer: Announcer<C>) -> Router {
    Router::new()
        .route(ANNOUNCE_PATH, post(handle_announce::<C>))
        .with_state(Arc::new(announcer))
        .layer(from_fn_with_state(gate, require_secret_key::<S>))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::ResponseBody;
    use crate::test_support::{ChatCall, MockChat};

    fn announcer(chat: &MockChat) -> Announcer<MockChat> {
        Announcer::new(chat.clone(), "CMAIN", "Hello from dify-slack-bot!")
    }

    #[tokio::test]
    async fn empty_body_posts_default_message() {
        let chat = MockChat::new();
        let response = announcer(&chat).handle(b"").await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(
            response.body,
            ResponseBody::Json(json!({
                "message": "Successfully posted to Slack",
                "ts": "1700000000.000100"
            }))
        );
        assert_eq!(
            chat.calls(),
            vec![ChatCall::Post {
                channel: "CMAIN".into(),
                text: "Hello from dify-slack-bot!".into()
            }]
        );
    }

    #[tokio::test]
    async fn request_message_overrides_default() {
        let chat = MockChat::new();
        announcer(&chat)
            .handle(br#"{"message":"deploy window open"}"#)
            .await;
        assert_eq!(
            chat.calls(),
            vec![ChatCall::Post {
                channel: "CMAIN".into(),
                text: "deploy window open".into()
            }]
        );
    }

    #[tokio::test]
    async fn blank_message_falls_back_to_default() {
        let chat = MockChat::new();
        announcer(&chat).handle(br#"{"message":"  "}"#).await;
        assert!(matches!(
            &chat.calls()[0],
            ChatCall::Post { text, .. } if text == "Hello from dify-slack-bot!"
        ));
    }

    #[tokio::test]
    async fn invalid_json_posts_nothing() {
        let chat = MockChat::new();
        let response = announcer(&chat).handle(b"{message").await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert!(chat.calls().is_empty());
    }

    #[tokio::test]
    async fn slack_rejection_is_bad_request_with_code() {
        let chat = MockChat::new();
        chat.post_returns(Err(SlackApiError::Api("channel_not_found".into())));
        let response = announcer(&chat).handle(b"").await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body, ResponseBody::Json(json!({"error": "channel_not_found"})));
    }

    #[tokio::test]
    async fn transport_failure_is_internal_error() {
        let chat = MockChat::new();
        chat.post_returns(Err(SlackApiError::Transport("refused".into())));
        let response = announcer(&chat).handle(b"").await;
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
