use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;

pub const HEALTH_PATH: &str = "/healthz";

/// `GET /healthz` answering `200 ok`, for liveness and readiness checks.
pub fn routes() -> Router {
    Router::new().route(HEALTH_PATH, get(|| async { "ok" }))
}

/// Serves only the health route on `port`. Used by processes without an
/// HTTP API of their own.
pub async fn serve(port: u16) {
    let addr = format!("0.0.0.0:{port}");
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, addr = %addr, "Failed to bind health check port");
            return;
        }
    };
    tracing::info!(addr = %addr, "Health check server listening");
    if let Err(e) = axum::serve(listener, routes()).await {
        tracing::error!(error = %e, "Health check server stopped");
    }
}
