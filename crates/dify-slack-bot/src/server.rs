use std::net::SocketAddr;

use axum::Router;
use bridge_nats::{JetStreamPublishClient, PublishClient};
use bridge_std::WallClock;
use tracing::info;

use crate::command::{self, CommandPipeline};
use crate::health;
use crate::mention::{self, MentionReceiver};
use crate::slack_api::ChatApi;

/// Slack-facing routes plus the health route. Optional routes (secret gate,
/// workflow trigger) are merged on top by the caller.
pub fn router<C, Q, D, K>(mentions: MentionReceiver<C, Q>, commands: CommandPipeline<D, K>) -> Router
where
    C: ChatApi,
    Q: JetStreamPublishClient,
    D: PublishClient,
    K: WallClock,
{
    Router::new()
        .merge(mention::routes(mentions))
        .merge(command::routes(commands))
        .merge(health::routes())
}

pub async fn serve(app: Router, port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "Webhook server listening");
    axum::serve(listener, app).await
}
