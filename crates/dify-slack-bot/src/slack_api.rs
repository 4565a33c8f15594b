//! The three Slack Web API chat methods the bridge uses.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use hyper_util::client::legacy::connect::HttpConnector;
use slack_morphism::SlackClientHttpConnector;
use slack_morphism::errors::SlackClientError;
use slack_morphism::prelude::*;
use tracing::debug;

pub const DEFAULT_SLACK_API_BASE: &str = "https://slack.com";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlackApiError {
    #[error("Slack request failed: {0}")]
    Transport(String),
    /// Slack answered `ok: false` with this error code.
    #[error("Slack API error: {0}")]
    Api(String),
    #[error("Slack did not answer {method} within {timeout:?}")]
    Timeout {
        method: &'static str,
        timeout: Duration,
    },
}

impl From<SlackClientError> for SlackApiError {
    fn from(error: SlackClientError) -> Self {
        match error {
            SlackClientError::ApiError(api) => SlackApiError::Api(api.code),
            other => SlackApiError::Transport(other.to_string()),
        }
    }
}

pub trait ChatApi: Send + Sync + Clone + 'static {
    /// Returns the `ts` of the new message.
    fn post_message(
        &self,
        channel: &str,
        text: &str,
    ) -> impl Future<Output = Result<String, SlackApiError>> + Send;

    fn update_message(
        &self,
        channel: &str,
        ts: &str,
        text: &str,
    ) -> impl Future<Output = Result<(), SlackApiError>> + Send;

    fn delete_message(
        &self,
        channel: &str,
        ts: &str,
    ) -> impl Future<Output = Result<(), SlackApiError>> + Send;
}

/// Cleartext connector for Slack API stand-ins such as local mocks.
pub type SlackCleartextConnector = SlackClientHyperConnector<HttpConnector>;

/// `{api_base}/api`, the prefix slack-morphism appends method names to.
fn method_base(api_base: &str) -> String {
    format!("{}/api", api_base.trim_end_matches('/'))
}

/// Bot-token chat client. Every call is bounded by `timeout`.
pub struct SlackWebClient<C = SlackClientHyperHttpsConnector>
where
    C: SlackClientHttpConnector + Send + Sync + 'static,
{
    client: Arc<SlackClient<C>>,
    token: SlackApiToken,
    timeout: Duration,
}

impl<C> Clone for SlackWebClient<C>
where
    C: SlackClientHttpConnector + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            token: self.token.clone(),
            timeout: self.timeout,
        }
    }
}

impl SlackWebClient {
    /// HTTPS client for `api_base`, normally [`DEFAULT_SLACK_API_BASE`].
    pub fn connect(
        bot_token: impl Into<String>,
        api_base: &str,
        timeout: Duration,
    ) -> Result<Self, SlackApiError> {
        let connector = SlackClientHyperConnector::new()
            .map_err(|e| SlackApiError::Transport(format!("HTTP connector: {e}")))?
            .with_slack_api_url(&method_base(api_base));
        Ok(Self::with_client(
            Arc::new(SlackClient::new(connector)),
            bot_token,
            timeout,
        ))
    }
}

impl SlackWebClient<SlackCleartextConnector> {
    /// Plain `http://` client, e.g. for a mock Slack API.
    pub fn cleartext(bot_token: impl Into<String>, api_base: &str, timeout: Duration) -> Self {
        let connector = SlackClientHyperConnector::with_connector(HttpConnector::new())
            .with_slack_api_url(&method_base(api_base));
        Self::with_client(Arc::new(SlackClient::new(connector)), bot_token, timeout)
    }
}

impl<C> SlackWebClient<C>
where
    C: SlackClientHttpConnector + Send + Sync + 'static,
{
    pub fn with_client(
        client: Arc<SlackClient<C>>,
        bot_token: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let bot_token: String = bot_token.into();
        Self {
            client,
            token: SlackApiToken::new(bot_token.into()),
            timeout,
        }
    }

    async fn bounded<T, F>(&self, method: &'static str, call: F) -> Result<T, SlackApiError>
    where
        F: Future<Output = Result<T, SlackClientError>>,
    {
        let result = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| SlackApiError::Timeout {
                method,
                timeout: self.timeout,
            })?
            .map_err(SlackApiError::from);
        if result.is_ok() {
            debug!(method, "Slack call succeeded");
        }
        result
    }
}

impl<C> ChatApi for SlackWebClient<C>
where
    C: SlackClientHttpConnector + Send + Sync + 'static,
{
    async fn post_message(&self, channel: &str, text: &str) -> Result<String, SlackApiError> {
        let request = SlackApiChatPostMessageRequest::new(
            SlackChannelId(channel.to_string()),
            SlackMessageContent::new().with_text(text.to_string()),
        );
        let session = self.client.open_session(&self.token);
        let response = self
            .bounded("chat.postMessage", session.chat_post_message(&request))
            .await?;
        Ok(response.ts.0)
    }

    async fn update_message(&self, channel: &str, ts: &str, text: &str) -> Result<(), SlackApiError> {
        let request = SlackApiChatUpdateRequest::new(
            SlackChannelId(channel.to_string()),
            SlackMessageContent::new().with_text(text.to_string()),
            SlackTs(ts.to_string()),
        );
        let session = self.client.open_session(&self.token);
        self.bounded("chat.update", session.chat_update(&request))
            .await
            .map(drop)
    }

    async fn delete_message(&self, channel: &str, ts: &str) -> Result<(), SlackApiError> {
        let request = SlackApiChatDeleteRequest::new(SlackChannelId(channel.to_string()), SlackTs(ts.to_string()));
        let session = self.client.open_session(&self.token);
        self.bounded("chat.delete", session.chat_delete(&request))
            .await
            .map(drop)
    }
}
