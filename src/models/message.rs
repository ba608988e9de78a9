//! Platform message snapshots and the listing-time message reference.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Aggregate reaction on a message: emoji name plus total count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reaction {
    /// Reaction name as reported by the platform (e.g. `pushpin`).
    pub emoji: String,
    /// Number of accounts currently holding the reaction.
    pub count: u32,
}

/// A user account as seen by the reaction enumeration call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Platform user ID.
    pub id: String,
    /// Whether the account is automated (bot or app user).
    pub is_bot: bool,
}

impl User {
    /// A non-automated account.
    #[must_use]
    pub fn human(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_bot: false,
        }
    }

    /// An automated account.
    #[must_use]
    pub fn bot(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_bot: true,
        }
    }
}

/// Live snapshot of a message returned by the platform.
///
/// Never cached across events; every reconciliation fetches a fresh copy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Message identifier (the Slack `ts`).
    pub id: String,
    /// Channel the message lives in.
    pub channel_id: String,
    /// Author user ID; empty for bot/integration posts without a user.
    pub author_id: String,
    /// Raw message text.
    pub content: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Whether the message is currently pinned in `channel_id`.
    pub pinned: bool,
    /// Aggregate reactions on the message.
    pub reactions: Vec<Reaction>,
    /// Permalink, when the platform supplied one.
    pub link: Option<String>,
}

impl Message {
    /// Find the reaction with the given emoji name.
    #[must_use]
    pub fn reaction(&self, emoji: &str) -> Option<&Reaction> {
        self.reactions.iter().find(|r| r.emoji == emoji)
    }
}

/// Immutable listing-time snapshot of a pinned message.
///
/// May go stale if the message is edited or deleted before a bulk-unpin
/// session is applied; the unpin call then fails and is counted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageRef {
    /// Message identifier.
    pub id: String,
    /// Channel the message lives in.
    pub channel_id: String,
    /// Author user ID.
    pub author_id: String,
    /// Short single-line preview of the content.
    pub content_preview: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Link to the message.
    pub link: String,
}
