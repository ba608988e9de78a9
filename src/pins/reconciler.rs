//! Pin-state reconciler.
//!
//! Keeps a message's platform pin flag consistent with its marker reactions:
//! a message stays pinned while at least one human holds the marker. Every
//! decision is made from a fresh read of the message, never from the event
//! payload, because reaction events may arrive duplicated or out of order.
//! The pin flag is handled optimistically: no locking, and "already in the
//! desired state" counts as success.

use std::sync::Arc;

use tracing::{debug, info, info_span, warn, Instrument};

use super::classifier::{PinIntent, ReactionKind};
use super::notifier::Notifier;
use super::ownership::human_reactors;
use crate::models::Message;
use crate::platform::ChatPlatform;
use crate::{AppError, Result};

/// Why a pin or unpin attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The bot lacks permission.
    Forbidden,
    /// The channel is at its pin limit.
    PinLimit,
    /// Any other platform or transport failure.
    Other,
}

/// Result of reconciling one marker event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The message was pinned.
    Pinned,
    /// The message was unpinned.
    Unpinned,
    /// Marker added but the message was already pinned.
    AlreadyPinned,
    /// Marker removed but the message was not pinned.
    AlreadyUnpinned,
    /// Marker removed but other humans still hold it.
    StillHeld {
        /// Human reactors still holding the marker.
        remaining: usize,
    },
    /// Reactor enumeration failed; the pin was left in place.
    Undetermined,
    /// The message or channel no longer exists.
    Vanished,
    /// The pin or unpin call failed.
    Failed(FailureKind),
}

/// Applies marker reaction changes to message pin state.
#[derive(Clone)]
pub struct PinReconciler {
    platform: Arc<dyn ChatPlatform>,
    notifier: Notifier,
    marker: String,
}

impl PinReconciler {
    /// Create a reconciler for the given marker reaction.
    #[must_use]
    pub fn new(platform: Arc<dyn ChatPlatform>, notifier: Notifier, marker: String) -> Self {
        Self {
            platform,
            notifier,
            marker,
        }
    }

    /// Marker reaction name this reconciler acts on.
    #[must_use]
    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Reconcile a single marker event. Never fails; every error is logged
    /// and, where the actor should know, reported with a short notice.
    pub async fn handle(&self, intent: PinIntent) -> ReconcileOutcome {
        let span = info_span!(
            "reconcile",
            channel_id = %intent.channel_id,
            message_id = %intent.message_id,
            actor_id = %intent.actor_id,
            kind = ?intent.kind,
        );

        async {
            let outcome = match intent.kind {
                ReactionKind::Added => self.on_marker_added(&intent).await,
                ReactionKind::Removed => self.on_marker_removed(&intent).await,
            };
            info!(?outcome, "marker event reconciled");
            outcome
        }
        .instrument(span)
        .await
    }

    async fn on_marker_added(&self, intent: &PinIntent) -> ReconcileOutcome {
        let message = match self.fetch(intent).await {
            Ok(message) => message,
            Err(outcome) => return outcome,
        };

        if message.pinned {
            debug!("message already pinned; nothing to do");
            return ReconcileOutcome::AlreadyPinned;
        }

        match self.platform.pin(&intent.channel_id, &intent.message_id).await {
            Ok(()) => {
                info!(author_id = %message.author_id, "message pinned");
                self.notifier.notify(
                    &intent.channel_id,
                    format!("\u{1f4cc} <@{}> pinned a message!", intent.actor_id),
                );
                ReconcileOutcome::Pinned
            }
            Err(err) => self.report_failure(intent, &err, "pin"),
        }
    }

    async fn on_marker_removed(&self, intent: &PinIntent) -> ReconcileOutcome {
        let message = match self.fetch(intent).await {
            Ok(message) => message,
            Err(outcome) => return outcome,
        };

        if !message.pinned {
            debug!("message is not pinned; nothing to do");
            return ReconcileOutcome::AlreadyUnpinned;
        }

        // Several add/remove events may have raced; read the reactions again.
        let message = match self
            .platform
            .fetch_message(&intent.channel_id, &intent.message_id)
            .await
        {
            Ok(fresh) => fresh,
            Err(AppError::NotFound(_)) => return ReconcileOutcome::Vanished,
            Err(err) => {
                debug!(%err, "re-fetch failed; using first snapshot");
                message
            }
        };

        let remaining = match self.remaining_human_reactors(&message).await {
            Ok(remaining) => remaining,
            Err(err) => {
                warn!(%err, "cannot confirm remaining reactors; keeping pin");
                return ReconcileOutcome::Undetermined;
            }
        };

        if remaining > 0 {
            info!(remaining, "other users still hold the marker; keeping pin");
            return ReconcileOutcome::StillHeld { remaining };
        }

        match self
            .platform
            .unpin(&intent.channel_id, &intent.message_id)
            .await
        {
            Ok(()) => {
                info!("message unpinned");
                self.notifier.notify(
                    &intent.channel_id,
                    format!("\u{1f4cc} <@{}> unpinned a message.", intent.actor_id),
                );
                ReconcileOutcome::Unpinned
            }
            Err(err) => self.report_failure(intent, &err, "unpin"),
        }
    }

    /// Count humans still holding the marker. An absent marker reaction
    /// means the last reactor removed it.
    async fn remaining_human_reactors(&self, message: &Message) -> Result<usize> {
        if message.reaction(&self.marker).is_none() {
            debug!("marker reaction is gone entirely");
            return Ok(0);
        }

        let users = self
            .platform
            .reaction_users(&message.channel_id, &message.id, &self.marker)
            .await?;
        Ok(human_reactors(users).len())
    }

    async fn fetch(&self, intent: &PinIntent) -> std::result::Result<Message, ReconcileOutcome> {
        match self
            .platform
            .fetch_message(&intent.channel_id, &intent.message_id)
            .await
        {
            Ok(message) => Ok(message),
            Err(AppError::NotFound(msg)) => {
                info!(%msg, "message vanished before it could be reconciled");
                Err(ReconcileOutcome::Vanished)
            }
            Err(AppError::Forbidden(msg)) => {
                warn!(%msg, "no permission to read message");
                Err(ReconcileOutcome::Failed(FailureKind::Forbidden))
            }
            Err(err) => {
                warn!(%err, "failed to fetch message");
                Err(ReconcileOutcome::Failed(FailureKind::Other))
            }
        }
    }

    fn report_failure(&self, intent: &PinIntent, err: &AppError, action: &str) -> ReconcileOutcome {
        let actor = &intent.actor_id;
        let (kind, text) = match err {
            AppError::NotFound(_) => {
                info!(%err, action, "message vanished mid-reconcile");
                return ReconcileOutcome::Vanished;
            }
            AppError::Forbidden(_) => (
                FailureKind::Forbidden,
                format!("\u{274c} <@{actor}> I don't have permission to {action} messages here."),
            ),
            AppError::PinLimit(_) => (
                FailureKind::PinLimit,
                format!(
                    "\u{274c} <@{actor}> This channel has reached its pin limit. \
                     Unpin something first."
                ),
            ),
            AppError::Platform(code) => (
                FailureKind::Other,
                format!("\u{274c} <@{actor}> Failed to {action} the message ({code})."),
            ),
            _ => (
                FailureKind::Other,
                format!("\u{274c} <@{actor}> An unexpected error occurred."),
            ),
        };
        warn!(%err, action, ?kind, "marker action failed");
        self.notifier.notify(&intent.channel_id, text);
        ReconcileOutcome::Failed(kind)
    }
}
