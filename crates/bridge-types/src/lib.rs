//! Wire types exchanged between the Slack webhooks, the work queue and the
//! answer worker.

pub mod events;
pub mod placeholder;
pub mod subjects;

pub use events::{MentionWorkItem, SlackEventCallback, SlackMentionEvent, SlashCommandPayload};
pub use placeholder::{PostedPlaceholder, ResolvedPlaceholder, Resolution};
