//! `status` and `test` subcommands of the bot command.

use tracing::{info, warn};

use super::deliver;
use crate::slack::{blocks, commands};
use crate::state::AppState;
use crate::Result;

/// Text of the message posted by the `test` subcommand.
pub const TEST_MESSAGE: &str = "\u{1f4cc} React to this message to try pinning!";

/// Status text for `channel_id`.
pub async fn status_reply(app: &AppState, channel_id: &str) -> String {
    match app.platform.list_pins(channel_id).await {
        Ok(pins) => commands::status_text(
            &app.bot_user_id,
            pins.len(),
            app.config.listing.pin_cap,
            app.started_at.elapsed(),
        ),
        Err(err) => {
            warn!(%err, channel_id, "status lookup failed");
            format!("\u{274c} Could not read this channel's pins: {err}")
        }
    }
}

/// Run the `status` subcommand and post the result to `response_url`.
pub async fn run_status(app: &AppState, channel_id: &str, response_url: &str) {
    let text = status_reply(app, channel_id).await;
    deliver(app, response_url, &blocks::ephemeral_text(&text)).await;
}

/// Post the test message and add the marker to it as the bot.
///
/// The bot's own reaction is ignored by the classifier, so the message is
/// only pinned once a human adds the marker.
///
/// # Errors
///
/// Propagates the platform error from posting or reacting.
pub async fn post_test_message(app: &AppState, channel_id: &str) -> Result<String> {
    let message_id = app.platform.send_message(channel_id, TEST_MESSAGE).await?;
    app.platform
        .add_reaction(channel_id, &message_id, &app.config.slack.marker_emoji)
        .await?;
    info!(channel_id, %message_id, "test message posted");
    Ok(message_id)
}

/// Run the `test` subcommand, logging failures.
pub async fn run_test(app: &AppState, channel_id: &str) {
    if let Err(err) = post_test_message(app, channel_id).await {
        warn!(%err, channel_id, "test message failed");
        app.notifier.notify_for(
            channel_id,
            format!("\u{274c} Could not post the test message: {err}"),
            app.config.timeouts.long_notice(),
        );
    }
}
