//! Slack command and interaction handler sub-modules.
//!
//! Handlers compute the reply payload; [`deliver`] posts it to the
//! `response_url` Slack supplied with the command or interaction.

pub mod bot;
pub mod listing;
pub mod unpin;

use serde_json::Value;
use tracing::{debug, warn};

use crate::state::AppState;

/// Post `payload` to `response_url` through the Slack client, if any.
pub async fn deliver(app: &AppState, response_url: &str, payload: &Value) {
    let Some(ref slack) = app.slack else {
        debug!("slack not configured; reply dropped");
        return;
    };
    if let Err(err) = slack.respond(response_url, payload).await {
        warn!(%err, "failed to deliver response");
    }
}
