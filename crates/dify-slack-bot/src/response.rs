use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::Value;

/// What a handler answers, independent of the HTTP framework so handlers can
/// be unit tested without a router.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerResponse {
    pub status: StatusCode,
    pub body: ResponseBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Text(String),
    Json(Value),
}

impl HandlerResponse {
    pub fn text(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: ResponseBody::Text(body.into()),
        }
    }

    pub fn json(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body: ResponseBody::Json(body),
        }
    }

    /// Plain `200 ok`, the answer Slack expects for every accepted event.
    pub fn ok() -> Self {
        Self::text(StatusCode::OK, "ok")
    }
}

impl IntoResponse for HandlerResponse {
    fn into_response(self) -> Response {
        match self.body {
            ResponseBody::Text(text) => (self.status, text).into_response(),
            ResponseBody::Json(value) => (self.status, Json(value)).into_response(),
        }
    }
}
