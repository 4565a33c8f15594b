//! Manually triggered workflow run with no inputs, behind the secret gate.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::routing::post;
use bridge_secret::{SecretGate, SecretStore};
use serde_json::json;
use tracing::{info, warn};

use crate::authorizer::require_secret_key;
use crate::response::HandlerResponse;
use crate::workflow::{WorkflowApi, WorkflowRun};

pub const TRIGGER_PATH: &str = "/workflows/trigger";
pub const DEFAULT_TRIGGER_USER: &str = "dify-slack-bridge";

pub struct WorkflowTrigger<W> {
    workflow: W,
    user: String,
}

impl<W: WorkflowApi> WorkflowTrigger<W> {
    pub fn new(workflow: W, user: impl Into<String>) -> Self {
        Self {
            workflow,
            user: user.into(),
        }
    }

    pub async fn trigger(&self) -> HandlerResponse {
        match self.workflow.run(&WorkflowRun::without_inputs(&self.user)).await {
            Ok(reply) if reply.is_success() => {
                info!(status = reply.status, "Workflow triggered");
                HandlerResponse::json(StatusCode::OK, json!({ "message": "Workflow triggered." }))
            }
            Ok(reply) => HandlerResponse::json(
                StatusCode::BAD_GATEWAY,
                json!({ "error": format!("Workflow API returned status {}", reply.status) }),
            ),
            Err(e) => {
                warn!(error = %e, "Workflow trigger failed");
                HandlerResponse::json(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
        }
    }
}

async fn handle_trigger<W: WorkflowApi>(State(trigger): State<Arc<WorkflowTrigger<W>>>) -> HandlerResponse {
    trigger.trigger().await
}

pub fn routes<S: SecretStore, W: WorkflowApi>(
    gate: Arc<SecretGate<S>>,
    trigger: WorkflowTrigger<W>,
) -> Router {
    Router::new()
        .route(TRIGGER_PATH, post(handle_trigger::<W>))
        .with_state(Arc::new(trigger))
        .layer(from_fn_with_state(gate, require_secret_key::<S>))
}
