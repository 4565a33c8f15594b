use crate::config::{NatsAuth, NatsConfig};
use async_nats::{Client, ConnectOptions, Event};
use std::time::Duration;
use tracing::{info, instrument, warn};

const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(30);

#[derive(Debug)]
pub enum ConnectError {
    Credentials(std::io::Error),
    Unreachable {
        servers: Vec<String>,
        error: async_nats::ConnectError,
    },
}

impl std::fmt::Display for ConnectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Credentials(e) => write!(f, "cannot read NATS credentials file: {e}"),
            Self::Unreachable { servers, error } => {
                write!(f, "cannot connect to NATS at {servers:?}: {error}")
            }
        }
    }
}

impl std::error::Error for ConnectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Credentials(e) => Some(e),
            Self::Unreachable { error, .. } => Some(error),
        }
    }
}

/// Exponential backoff capped at [`MAX_RECONNECT_DELAY`].
fn backoff(attempts: usize) -> Duration {
    let exponent = u32::try_from(attempts).unwrap_or(u32::MAX);
    Duration::from_secs(2u64.saturating_pow(exponent)).min(MAX_RECONNECT_DELAY)
}

async fn log_event(event: Event) {
    match event {
        Event::Connected => info!("NATS connected"),
        Event::Disconnected => warn!("NATS disconnected, reconnecting"),
        Event::LameDuckMode => warn!("NATS server entered lame duck mode"),
        Event::SlowConsumer(sid) => warn!(sid, "NATS slow consumer"),
        other => info!(event = %other, "NATS connection event"),
    }
}

async fn options_for(auth: &NatsAuth) -> Result<ConnectOptions, ConnectError> {
    let options = match auth {
        NatsAuth::Credentials(path) => ConnectOptions::with_credentials_file(path.clone())
            .await
            .map_err(ConnectError::Credentials)?,
        NatsAuth::UserPassword { user, password } => {
            ConnectOptions::with_user_and_password(user.clone(), password.clone())
        }
        NatsAuth::Token(token) => ConnectOptions::with_token(token.clone()),
        NatsAuth::Anonymous => ConnectOptions::new(),
    };
    Ok(options)
}

/// Connect with retry on the initial attempt and capped exponential
/// reconnect backoff afterwards.
#[instrument(name = "nats.connect", skip_all, fields(servers = ?config.servers, auth = config.auth.kind()))]
pub async fn connect(config: &NatsConfig, timeout: Duration) -> Result<Client, ConnectError> {
    let options = options_for(&config.auth)
        .await?
        .retry_on_initial_connect()
        .connection_timeout(timeout)
        .reconnect_delay_callback(backoff)
        .event_callback(|event| async move { log_event(event).await });

    match options.connect(&config.servers).await {
        Ok(client) => {
            info!("Connected to NATS");
            Ok(client)
        }
        Err(error) => {
            warn!(error = %error, "Failed to connect to NATS");
            Err(ConnectError::Unreachable {
                servers: config.servers.clone(),
                error,
            })
        }
    }
}
