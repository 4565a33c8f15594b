use bridge_std::ReadEnv;
use std::path::PathBuf;

const ENV_NATS_URL: &str = "NATS_URL";
const ENV_NATS_CREDS: &str = "NATS_CREDS";
const ENV_NATS_USER: &str = "NATS_USER";
const ENV_NATS_PASSWORD: &str = "NATS_PASSWORD";
const ENV_NATS_TOKEN: &str = "NATS_TOKEN";

const DEFAULT_NATS_URL: &str = "localhost:4222";

/// How the bridge authenticates to NATS.
///
/// Resolved from the environment in this order: `NATS_CREDS`, then
/// `NATS_USER` with `NATS_PASSWORD`, then `NATS_TOKEN`, else anonymous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NatsAuth {
    Credentials(PathBuf),
    UserPassword { user: String, password: String },
    Token(String),
    Anonymous,
}

impl NatsAuth {
    /// Safe to log.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Credentials(_) => "credentials file",
            Self::UserPassword { .. } => "user/password",
            Self::Token(_) => "token",
            Self::Anonymous => "anonymous",
        }
    }

    fn from_env<E: ReadEnv>(env: &E) -> Self {
        if let Some(path) = env.non_empty_var(ENV_NATS_CREDS) {
            return Self::Credentials(PathBuf::from(path));
        }
        if let (Some(user), Some(password)) = (
            env.non_empty_var(ENV_NATS_USER),
            env.non_empty_var(ENV_NATS_PASSWORD),
        ) {
            return Self::UserPassword { user, password };
        }
        match env.non_empty_var(ENV_NATS_TOKEN) {
            Some(token) => Self::Token(token),
            None => Self::Anonymous,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NatsConfig {
    pub servers: Vec<String>,
    pub auth: NatsAuth,
}

impl NatsConfig {
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            servers: vec![url.into()],
            auth: NatsAuth::Anonymous,
        }
    }

    /// `NATS_URL` is a comma-separated server list (default `localhost:4222`).
    pub fn from_env<E: ReadEnv>(env: &E) -> Self {
        let raw = env
            .non_empty_var(ENV_NATS_URL)
            .unwrap_or_else(|| DEFAULT_NATS_URL.to_string());
        Self {
            servers: raw
                .split(',')
                .map(str::trim)
                .filter(|server| !server.is_empty())
                .map(String::from)
                .collect(),
            auth: NatsAuth::from_env(env),
        }
    }
}
