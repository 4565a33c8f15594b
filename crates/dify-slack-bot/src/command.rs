//! Slash-command webhook. Verifies the request signature, hands the command
//! to the external processor on a core NATS subject and acknowledges within
//! Slack's three second window without waiting for the processor.

use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::routing::any;
use bridge_nats::PublishClient;
use bridge_std::WallClock;
use bridge_types::SlashCommandPayload;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::format::COMMAND_ACK_TEXT;
use crate::response::HandlerResponse;
use crate::signature::SlackSignatureVerifier;

pub const COMMANDS_PATH: &str = "/slack/commands";

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
enum FormError {
    #[error("Invalid form body.")]
    Malformed,
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

#[derive(Deserialize)]
struct CommandForm {
    #[serde(default)]
    response_url: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

fn parse_form(body: &[u8]) -> Result<SlashCommandPayload, FormError> {
    let form: CommandForm = serde_urlencoded::from_bytes(body).map_err(|_| FormError::Malformed)?;
    let required = |value: Option<String>, name: &'static str| {
        value
            .filter(|v| !v.is_empty())
            .ok_or(FormError::MissingField(name))
    };
    Ok(SlashCommandPayload {
        response_url: required(form.response_url, "response_url")?,
        user_id: required(form.user_id, "user_id")?,
        text: form.text.unwrap_or_default(),
    })
}

pub struct CommandPipeline<D, K> {
    verifier: SlackSignatureVerifier<K>,
    dispatcher: D,
    dispatch_subject: String,
}

impl<D: PublishClient, K: WallClock> CommandPipeline<D, K> {
    pub fn new(
        verifier: SlackSignatureVerifier<K>,
        dispatcher: D,
        dispatch_subject: impl Into<String>,
    ) -> Self {
        Self {
            verifier,
            dispatcher,
            dispatch_subject: dispatch_subject.into(),
        }
    }

    #[instrument(name = "slack.command", skip_all, fields(user = tracing::field::Empty))]
    pub async fn handle(&self, method: &Method, headers: &HeaderMap, body: &[u8]) -> HandlerResponse {
        if *method != Method::POST {
            return HandlerResponse::text(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
        }
        if let Err(e) = self.verifier.verify_headers(headers, body) {
            warn!(reason = %e, "Rejected slash command");
            return HandlerResponse::text(e.status(), e.to_string());
        }

        let payload = match parse_form(body) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(reason = %e, "Rejected slash command form");
                return HandlerResponse::text(StatusCode::BAD_REQUEST, e.to_string());
            }
        };
        tracing::Span::current().record("user", payload.user_id.as_str());

        self.dispatch(&payload).await;
        HandlerResponse::json(StatusCode::OK, json!({ "text": COMMAND_ACK_TEXT }))
    }

    async fn dispatch(&self, payload: &SlashCommandPayload) {
        let bytes = match serde_json::to_vec(payload) {
            Ok(bytes) => Bytes::from(bytes),
            Err(e) => {
                warn!(error = %e, "Failed to serialize slash command");
                return;
            }
        };
        match self
            .dispatcher
            .publish_with_headers(self.dispatch_subject.clone(), async_nats::HeaderMap::new(), bytes)
            .await
        {
            Ok(()) => info!(subject = %self.dispatch_subject, "Dispatched slash command"),
            Err(e) => warn!(error = %e, subject = %self.dispatch_subject, "Failed to dispatch slash command"),
        }
    }
}

async fn handle_command<D: PublishClient, K: WallClock>(
    State(pipeline): State<Arc<CommandPipeline<D, K>>>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> HandlerResponse {
    pipeline.handle(&method, &headers, &body).await
}

/// Accepts every method so non-POST requests get a 405 from the pipeline.
pub fn routes<D: PublishClient, K: WallClock>(pipeline: CommandPipeline<D, K>) -> Router {
    Router::new()
        .route(COMMANDS_PATH, any(handle_command::<D, K>))
        .with_state(Arc::new(pipeline))
}
