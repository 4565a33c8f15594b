//! Lifecycle of the "thinking" message posted in reply to a mention.
//!
//! A placeholder starts as [`PostedPlaceholder`] and is turned into a
//! [`ResolvedPlaceholder`] by [`PostedPlaceholder::resolve`], which takes
//! `self`: once resolved, the posted state is gone and cannot be resolved a
//! second time.

use crate::events::MentionWorkItem;

/// A placeholder that exists in Slack and still awaits its outcome.
#[derive(Debug, PartialEq, Eq)]
pub struct PostedPlaceholder {
    pub channel: String,
    pub ts: String,
    /// Mentioned back in every replacement text.
    pub user: String,
}

/// What happens to the placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Replace the text with the answer.
    Answered(String),
    /// The workflow produced nothing; remove the message.
    Cleared,
    /// Answering failed; replace the text with an apology.
    Apologized,
}

impl Resolution {
    /// `Answered` for a non-empty answer, `Cleared` otherwise.
    pub fn from_answer(answer: String) -> Self {
        if answer.is_empty() {
            Self::Cleared
        } else {
            Self::Answered(answer)
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ResolvedPlaceholder {
    pub channel: String,
    pub ts: String,
    pub user: String,
    pub resolution: Resolution,
}

impl PostedPlaceholder {
    pub fn resolve(self, resolution: Resolution) -> ResolvedPlaceholder {
        ResolvedPlaceholder {
            channel: self.channel,
            ts: self.ts,
            user: self.user,
            resolution,
        }
    }
}

impl ResolvedPlaceholder {
    /// Replacement used when applying this resolution failed, so the
    /// message was never changed.
    pub fn into_apology(self) -> Option<ResolvedPlaceholder> {
        match self.resolution {
            Resolution::Apologized => None,
            _ => Some(ResolvedPlaceholder {
                resolution: Resolution::Apologized,
                ..self
            }),
        }
    }
}

impl From<&MentionWorkItem> for PostedPlaceholder {
    fn from(item: &MentionWorkItem) -> Self {
        Self {
            channel: item.channel_id.clone(),
            ts: item.message_ts.clone(),
            user: item.user_id.clone(),
        }
    }
}
