use serde::{Deserialize, Serialize};

// ── Inbound (Slack Events API) ──────────────────────────────────────────────

/// Body of an `event_callback` delivery to the Events API endpoint.
///
/// The `url_verification` handshake is answered from the raw JSON before a
/// body is read as this type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlackEventCallback {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<SlackMentionEvent>,
}

/// The `event` object of an `app_mention` delivery.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlackMentionEvent {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_id: Option<String>,
}

impl SlackMentionEvent {
    /// True for messages posted by a bot, including this app itself.
    pub fn is_bot_authored(&self, bot_user_id: Option<&str>) -> bool {
        if self.subtype.as_deref() == Some("bot_message") || self.bot_id.is_some() {
            return true;
        }
        matches!((bot_user_id, self.user.as_deref()), (Some(bot), Some(user)) if bot == user)
    }

    /// Text after the first `>`, i.e. with the leading `<@BOT>` removed.
    pub fn question(&self) -> &str {
        self.text
            .split_once('>')
            .map_or(self.text.as_str(), |(_, rest)| rest)
            .trim()
    }
}

// ── Work queue ──────────────────────────────────────────────────────────────

/// One unit of answer work, produced after the placeholder was posted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentionWorkItem {
    pub question: String,
    pub channel_id: String,
    pub user_id: String,
    /// `ts` of the placeholder message the answer replaces.
    pub message_ts: String,
}

// ── Slash commands ──────────────────────────────────────────────────────────

/// Forwarded to the external command processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlashCommandPayload {
    pub response_url: String,
    pub user_id: String,
    #[serde(default)]
    pub text: String,
}
