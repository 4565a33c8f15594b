//! Message texts posted to Slack.

/// Acknowledgement returned to Slack when a slash command is accepted.
pub const COMMAND_ACK_TEXT: &str = "Processing started. The result will be posted shortly...";

/// `<@U123>` mention markup.
pub fn mention(user: &str) -> String {
    format!("<@{user}>")
}

pub fn placeholder_text(user: &str) -> String {
    format!("{} Thinking... :thinking_face:", mention(user))
}

pub fn answer_text(user: &str, answer: &str) -> String {
    format!("{} {answer}", mention(user))
}

pub fn apology_text(user: &str) -> String {
    format!(
        "{} Sorry, something went wrong while preparing an answer.",
        mention(user)
    )
}
