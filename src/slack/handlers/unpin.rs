//! Bulk-unpin button handlers (toggle / apply / cancel).

use serde_json::Value;
use tracing::{info, warn};

use crate::slack::blocks::{
    self, parse_toggle_value, APPLY_ACTION, CANCEL_ACTION, TOGGLE_ACTION_PREFIX,
};
use crate::state::AppState;
use crate::AppError;

/// Reply shown when a session is no longer open.
pub const EXPIRED_TEXT: &str =
    "\u{231b} This selection is no longer active. Run the list command again.";

/// Reply shown after cancelling.
pub const CANCELLED_TEXT: &str = "Cancelled.";

/// A parsed bulk-unpin button press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnpinAction {
    /// Flip the selection of one candidate.
    Toggle {
        /// Target session.
        session_id: String,
        /// Candidate message.
        message_id: String,
    },
    /// Unpin the selection and close the session.
    Apply {
        /// Target session.
        session_id: String,
    },
    /// Close the session without changes.
    Cancel {
        /// Target session.
        session_id: String,
    },
}

impl UnpinAction {
    /// Parse an action from its `action_id` and button value.
    #[must_use]
    pub fn parse(action_id: &str, value: &str) -> Option<Self> {
        if action_id.starts_with(TOGGLE_ACTION_PREFIX) {
            let (session_id, message_id) = parse_toggle_value(value)?;
            return Some(Self::Toggle {
                session_id: session_id.to_owned(),
                message_id: message_id.to_owned(),
            });
        }
        if value.is_empty() {
            return None;
        }
        match action_id {
            APPLY_ACTION => Some(Self::Apply {
                session_id: value.to_owned(),
            }),
            CANCEL_ACTION => Some(Self::Cancel {
                session_id: value.to_owned(),
            }),
            _ => None,
        }
    }
}

/// Apply a button press to its session and build the replacement message.
///
/// Returns `None` when the press must be ignored without feedback (the
/// actor does not own the session, or the reply cannot be rendered).
pub async fn handle_unpin_action(
    app: &AppState,
    action: &UnpinAction,
    user_id: &str,
) -> Option<Value> {
    let result = match action {
        UnpinAction::Toggle {
            session_id,
            message_id,
        } => app
            .sessions
            .toggle(session_id, user_id, message_id)
            .await
            .and_then(|session| {
                blocks::ephemeral_payload(&session.summary, &blocks::session_blocks(&session))
            }),
        UnpinAction::Apply { session_id } => app
            .sessions
            .apply(app.platform.as_ref(), session_id, user_id)
            .await
            .map(|report| blocks::ephemeral_text(&report.summary())),
        UnpinAction::Cancel { session_id } => app
            .sessions
            .cancel(session_id, user_id)
            .await
            .map(|_| blocks::ephemeral_text(CANCELLED_TEXT)),
    };

    match result {
        Ok(payload) => Some(payload),
        Err(AppError::Unauthorized(msg)) => {
            warn!(user_id, %msg, "non-owner interaction ignored");
            None
        }
        Err(AppError::Expired(msg)) => {
            info!(user_id, %msg, "interaction on closed session");
            Some(blocks::ephemeral_text(EXPIRED_TEXT))
        }
        Err(err) => {
            warn!(%err, user_id, "unpin action failed");
            None
        }
    }
}
