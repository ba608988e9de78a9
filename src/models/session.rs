//! Bulk-unpin session model and lifecycle helpers.

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use uuid::Uuid;

use super::message::MessageRef;
use crate::{AppError, Result};

/// Lifecycle status for a bulk-unpin session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Accepting selection, apply, and cancel interactions.
    Open,
    /// Apply was pressed; unpins were attempted.
    Applied,
    /// Cancel was pressed.
    Cancelled,
    /// Inactivity window elapsed.
    Expired,
}

/// Ephemeral, owner-scoped state backing one bulk-unpin workflow.
#[derive(Debug, Clone)]
pub struct PinSession {
    /// Unique session identifier, embedded in interactive element values.
    pub id: String,
    /// User who ran the listing command; the only user allowed to interact.
    pub owner_user_id: String,
    /// Channel the listing was produced for.
    pub channel_id: String,
    /// Selectable messages, in listing order.
    pub candidates: Vec<MessageRef>,
    /// Rendered listing shown above the selection controls.
    pub summary: String,
    /// Selected message IDs, in selection order.
    pub selected: Vec<String>,
    /// Inactivity deadline.
    pub expires_at: Instant,
    /// Current lifecycle status.
    pub status: SessionStatus,
}

impl PinSession {
    /// Construct an open session with a generated identifier.
    #[must_use]
    pub fn new(
        owner_user_id: String,
        channel_id: String,
        candidates: Vec<MessageRef>,
        expires_at: Instant,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner_user_id,
            channel_id,
            candidates,
            summary: String::new(),
            selected: Vec::new(),
            expires_at,
            status: SessionStatus::Open,
        }
    }

    /// Attach the rendered listing text.
    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Verify that `acting_user_id` owns this session.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] for any other user.
    pub fn check_owner(&self, acting_user_id: &str) -> Result<()> {
        if self.owner_user_id == acting_user_id {
            Ok(())
        } else {
            Err(AppError::Unauthorized(format!(
                "session {} belongs to <@{}>",
                self.id, self.owner_user_id
            )))
        }
    }

    /// Whether `message_id` is one of the session's candidates.
    #[must_use]
    pub fn is_candidate(&self, message_id: &str) -> bool {
        self.candidates.iter().any(|c| c.id == message_id)
    }

    /// Whether `message_id` is currently selected.
    #[must_use]
    pub fn is_selected(&self, message_id: &str) -> bool {
        self.selected.iter().any(|id| id == message_id)
    }

    /// Flip the selection state of a candidate.
    ///
    /// Returns the new selection state, or `None` when `message_id` is not a
    /// candidate (the selection is left untouched).
    pub fn toggle(&mut self, message_id: &str) -> Option<bool> {
        if !self.is_candidate(message_id) {
            return None;
        }
        if let Some(pos) = self.selected.iter().position(|id| id == message_id) {
            self.selected.remove(pos);
            Some(false)
        } else {
            self.selected.push(message_id.to_owned());
            Some(true)
        }
    }

    /// Selected candidates, in listing order.
    #[must_use]
    pub fn selected_candidates(&self) -> Vec<&MessageRef> {
        self.candidates
            .iter()
            .filter(|c| self.is_selected(&c.id))
            .collect()
    }
}
