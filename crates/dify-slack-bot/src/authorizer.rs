//! HTTP surface of the shared-secret gate.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use bridge_secret::{Authorization, SECRET_KEY_HEADER, SecretGate, SecretStore};
use serde_json::json;

use crate::response::HandlerResponse;

pub const AUTHORIZE_PATH: &str = "/authorize";

fn presented_key(headers: &HeaderMap) -> Option<String> {
    headers
        .get(SECRET_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

/// Always `200`; the decision is in the body.
async fn handle_authorize<S: SecretStore>(
    State(gate): State<Arc<SecretGate<S>>>,
    headers: HeaderMap,
) -> Json<Authorization> {
    Json(gate.authorize(presented_key(&headers).as_deref()).await)
}

pub fn routes<S: SecretStore>(gate: Arc<SecretGate<S>>) -> Router {
    Router::new()
        .route(AUTHORIZE_PATH, post(handle_authorize::<S>))
        .with_state(gate)
}

/// Middleware answering `403` unless the request carries the shared secret.
///
/// ```rust,ignore
/// router.layer(axum::middleware::from_fn_with_state(gate, require_secret_key::<S>))
/// ```
pub async fn require_secret_key<S: SecretStore>(
    State(gate): State<Arc<SecretGate<S>>>,
    request: Request,
    next: Next,
) -> Response {
    let presented = presented_key(request.headers());
    if gate.authorize(presented.as_deref()).await.is_authorized {
        next.run(request).await
    } else {
        HandlerResponse::json(StatusCode::FORBIDDEN, json!({ "message": "Forbidden" })).into_response()
    }
}
