//! Reaction classifier: turns raw reaction-change events into pin intents.

use serde::{Deserialize, Serialize};

/// Direction of a reaction change.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReactionKind {
    /// A user added the reaction.
    Added,
    /// A user removed the reaction.
    Removed,
}

/// One reaction-change notification from the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionEvent {
    /// Message the reaction applies to.
    pub message_id: String,
    /// Channel containing the message.
    pub channel_id: String,
    /// User who added or removed the reaction.
    pub actor_id: String,
    /// Reaction name.
    pub emoji: String,
    /// Added or removed.
    pub kind: ReactionKind,
}

/// A marker reaction change the reconciler should act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinIntent {
    /// Channel containing the message.
    pub channel_id: String,
    /// Message whose pin state may change.
    pub message_id: String,
    /// User who triggered the change.
    pub actor_id: String,
    /// Added or removed.
    pub kind: ReactionKind,
}

/// Classify a reaction event.
///
/// Returns `None` for events raised by the bot itself and for any emoji
/// other than `marker`.
#[must_use]
pub fn classify(event: &ReactionEvent, bot_user_id: &str, marker: &str) -> Option<PinIntent> {
    if event.actor_id == bot_user_id {
        return None;
    }
    if event.emoji != marker {
        return None;
    }
    Some(PinIntent {
        channel_id: event.channel_id.clone(),
        message_id: event.message_id.clone(),
        actor_id: event.actor_id.clone(),
        kind: event.kind,
    })
}
