//! Short-lived channel notices.
//!
//! Each notice is posted and then deleted after a delay on a tracked
//! background task, so the caller never waits for the deletion.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

use crate::platform::ChatPlatform;

/// Posts auto-expiring notices into channels.
#[derive(Clone)]
pub struct Notifier {
    platform: Arc<dyn ChatPlatform>,
    ttl: Duration,
    tracker: TaskTracker,
}

impl Notifier {
    /// Create a notifier whose notices live for `ttl` by default.
    #[must_use]
    pub fn new(platform: Arc<dyn ChatPlatform>, ttl: Duration) -> Self {
        Self {
            platform,
            ttl,
            tracker: TaskTracker::new(),
        }
    }

    /// Post `text` to `channel_id` and delete it after the default lifetime.
    pub fn notify(&self, channel_id: &str, text: impl Into<String>) {
        self.notify_for(channel_id, text, self.ttl);
    }

    /// Post `text` to `channel_id` and delete it after `ttl`.
    pub fn notify_for(&self, channel_id: &str, text: impl Into<String>, ttl: Duration) {
        let platform = Arc::clone(&self.platform);
        let channel_id = channel_id.to_owned();
        let text = text.into();

        self.tracker.spawn(async move {
            let notice_id = match platform.send_message(&channel_id, &text).await {
                Ok(id) => id,
                Err(err) => {
                    warn!(%err, %channel_id, "failed to post notice");
                    return;
                }
            };

            tokio::time::sleep(ttl).await;

            // Someone may have removed it already.
            if let Err(err) = platform.delete_message(&channel_id, &notice_id).await {
                debug!(%err, %channel_id, %notice_id, "notice deletion failed (ignored)");
            }
        });
    }

    /// Stop accepting new notices and wait for pending ones to be deleted.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }

    /// Number of notices still posted or pending deletion.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }
}
