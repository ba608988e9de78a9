//! Self-only ownership evaluation.
//!
//! A pinned message is *self-only* for a user when that user is the only
//! non-automated account holding the marker reaction. Only self-only pins
//! are offered for bulk unpinning.

use futures_util::future::join_all;
use tracing::{debug, warn};

use crate::models::{Message, User};
use crate::platform::ChatPlatform;

/// Keep only non-automated accounts.
#[must_use]
pub fn human_reactors(users: Vec<User>) -> Vec<User> {
    users.into_iter().filter(|u| !u.is_bot).collect()
}

/// Decide whether `candidate_user_id` is the sole human marker-reactor.
///
/// Enumeration failures yield `false` so that a message is never offered
/// for unpinning on unconfirmed ownership.
pub async fn is_self_only(
    platform: &dyn ChatPlatform,
    marker: &str,
    message: &Message,
    candidate_user_id: &str,
) -> bool {
    if message.reaction(marker).is_none() {
        return false;
    }

    let users = match platform
        .reaction_users(&message.channel_id, &message.id, marker)
        .await
    {
        Ok(users) => users,
        Err(err) => {
            warn!(
                %err,
                channel_id = %message.channel_id,
                message_id = %message.id,
                "reaction enumeration failed; treating as not self-only"
            );
            return false;
        }
    };

    let humans = human_reactors(users);
    let self_only = matches!(humans.as_slice(), [only] if only.id == candidate_user_id);
    debug!(
        message_id = %message.id,
        humans = humans.len(),
        self_only,
        "evaluated pin ownership"
    );
    self_only
}

/// Evaluate [`is_self_only`] for many messages concurrently.
///
/// The result is index-aligned with `messages`.
pub async fn evaluate_all(
    platform: &dyn ChatPlatform,
    marker: &str,
    messages: &[Message],
    candidate_user_id: &str,
) -> Vec<bool> {
    join_all(
        messages
            .iter()
            .map(|message| is_self_only(platform, marker, message, candidate_user_id)),
    )
    .await
}
