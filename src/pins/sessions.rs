//! Bulk-unpin session registry.
//!
//! Sessions live only in memory. Every interaction is checked against the
//! session owner before anything is mutated. Removal from the registry is
//! the single point at which a session closes, so apply, cancel, and the
//! inactivity timeout can race without double-processing.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::models::{MessageRef, PinSession, SessionStatus};
use crate::platform::ChatPlatform;
use crate::{AppError, Result};

/// Outcome of applying a session's selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Number of selected messages.
    pub selected: usize,
    /// Unpins that succeeded.
    pub succeeded: usize,
    /// Unpins that failed.
    pub failed: usize,
}

impl ApplyReport {
    /// User-facing summary line.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.selected == 0 {
            return "No messages were selected.".to_owned();
        }
        let mut text = format!("\u{1f4cc} Unpinned {} message(s).", self.succeeded);
        if self.failed > 0 {
            text.push_str(&format!(" \u{26a0}\u{fe0f} {} could not be unpinned.", self.failed));
        }
        text
    }
}

/// Thread-safe map of open sessions keyed by session ID.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<String, PinSession>>>,
    timeout: Duration,
}

impl SessionRegistry {
    /// Create a registry whose sessions close after `timeout` of inactivity.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            sessions: Arc::default(),
            timeout,
        }
    }

    /// Open a session for `owner_user_id` and start its inactivity timer.
    ///
    /// `summary` is the rendered listing kept for re-rendering after each
    /// interaction. Returns a snapshot of the new session.
    pub async fn open(
        &self,
        owner_user_id: &str,
        channel_id: &str,
        candidates: Vec<MessageRef>,
        summary: impl Into<String>,
    ) -> PinSession {
        let session = PinSession::new(
            owner_user_id.to_owned(),
            channel_id.to_owned(),
            candidates,
            Instant::now() + self.timeout,
        )
        .with_summary(summary);
        self.sessions
            .lock()
            .await
            .insert(session.id.clone(), session.clone());
        info!(
            session_id = %session.id,
            owner_user_id,
            candidates = session.candidates.len(),
            "bulk-unpin session opened"
        );
        self.spawn_timeout(session.id.clone());
        session
    }

    /// Snapshot of an open session.
    pub async fn get(&self, session_id: &str) -> Option<PinSession> {
        self.sessions.lock().await.get(session_id).cloned()
    }

    /// Number of open sessions.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Whether no sessions are open.
    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }

    /// Flip the selection of `message_id` and refresh the inactivity timer.
    ///
    /// Returns the updated session snapshot.
    ///
    /// # Errors
    ///
    /// [`AppError::Expired`] when the session is closed or unknown,
    /// [`AppError::Unauthorized`] when `actor_id` is not the owner.
    pub async fn toggle(
        &self,
        session_id: &str,
        actor_id: &str,
        message_id: &str,
    ) -> Result<PinSession> {
        let mut sessions = self.sessions.lock().await;
        let session = Self::open_session(&mut sessions, session_id, actor_id)?;

        match session.toggle(message_id) {
            Some(selected) => {
                info!(session_id, message_id, selected, "selection toggled");
            }
            None => {
                warn!(session_id, message_id, "toggle for non-candidate ignored");
            }
        }
        session.expires_at = Instant::now() + self.timeout;
        Ok(session.clone())
    }

    /// Close the session without touching any pins.
    ///
    /// # Errors
    ///
    /// Same as [`toggle`](Self::toggle).
    pub async fn cancel(&self, session_id: &str, actor_id: &str) -> Result<PinSession> {
        let mut session = self.close(session_id, actor_id).await?;
        session.status = SessionStatus::Cancelled;
        info!(session_id, status = ?session.status, "bulk-unpin session cancelled");
        Ok(session)
    }

    /// Close the session and unpin every selected candidate.
    ///
    /// Individual unpin failures are counted, never fatal.
    ///
    /// # Errors
    ///
    /// Same as [`toggle`](Self::toggle).
    pub async fn apply(
        &self,
        platform: &dyn ChatPlatform,
        session_id: &str,
        actor_id: &str,
    ) -> Result<ApplyReport> {
        let mut session = self.close(session_id, actor_id).await?;
        session.status = SessionStatus::Applied;
        let report = unpin_selected(platform, &session).await;
        info!(
            session_id,
            status = ?session.status,
            selected = report.selected,
            succeeded = report.succeeded,
            failed = report.failed,
            "bulk-unpin session applied"
        );
        Ok(report)
    }

    /// Remove an open session after verifying ownership.
    async fn close(&self, session_id: &str, actor_id: &str) -> Result<PinSession> {
        let mut sessions = self.sessions.lock().await;
        Self::open_session(&mut sessions, session_id, actor_id)?;
        sessions
            .remove(session_id)
            .ok_or_else(|| AppError::Expired(format!("session {session_id} is closed")))
    }

    /// Look up an open session for `actor_id`, dropping it if its deadline
    /// passed before the timer task got to it.
    fn open_session<'a>(
        sessions: &'a mut HashMap<String, PinSession>,
        session_id: &str,
        actor_id: &str,
    ) -> Result<&'a mut PinSession> {
        let expired = match sessions.get(session_id) {
            None => return Err(AppError::Expired(format!("session {session_id} is closed"))),
            Some(session) => {
                session.check_owner(actor_id)?;
                session.expires_at <= Instant::now()
            }
        };

        if expired {
            sessions.remove(session_id);
            return Err(AppError::Expired(format!("session {session_id} timed out")));
        }

        sessions
            .get_mut(session_id)
            .ok_or_else(|| AppError::Expired(format!("session {session_id} is closed")))
    }

    fn spawn_timeout(&self, session_id: String) {
        let sessions = Arc::clone(&self.sessions);
        tokio::spawn(async move {
            loop {
                let deadline = match sessions.lock().await.get(&session_id) {
                    Some(session) => session.expires_at,
                    None => return,
                };

                tokio::time::sleep_until(deadline).await;

                let mut guard = sessions.lock().await;
                let expired = match guard.get(&session_id) {
                    None => return,
                    Some(session) => session.expires_at <= Instant::now(),
                };
                // Otherwise the deadline was pushed back by an interaction.
                if expired {
                    if let Some(mut session) = guard.remove(&session_id) {
                        session.status = SessionStatus::Expired;
                        info!(
                            %session_id,
                            status = ?session.status,
                            selected = session.selected.len(),
                            "bulk-unpin session closed without action"
                        );
                    }
                    return;
                }
            }
        });
    }
}

/// Unpin every selected candidate of `session`, counting failures.
pub async fn unpin_selected(platform: &dyn ChatPlatform, session: &PinSession) -> ApplyReport {
    let selected = session.selected_candidates();
    let mut report = ApplyReport {
        selected: selected.len(),
        ..ApplyReport::default()
    };

    for candidate in selected {
        match platform.unpin(&candidate.channel_id, &candidate.id).await {
            Ok(()) => report.succeeded += 1,
            Err(err) => {
                warn!(
                    %err,
                    session_id = %session.id,
                    message_id = %candidate.id,
                    "bulk unpin failed for message"
                );
                report.failed += 1;
            }
        }
    }

    report
}
