//! Slack interaction dispatch handler.
//!
//! Receives button presses via Socket Mode and routes them by `action_id`
//! prefix. Ownership is enforced inside the session registry; interactions
//! from anyone but the session owner are dropped silently and logged.

use std::sync::Arc;

use slack_morphism::prelude::{
    SlackClient, SlackClientEventsUserState, SlackClientHyperHttpsConnector,
    SlackInteractionEvent,
};
use tracing::{info, warn};

use crate::slack::handlers;
use crate::slack::handlers::unpin::UnpinAction;
use crate::state::AppState;

/// Handle interactive payloads delivered via Socket Mode.
///
/// # Errors
///
/// Never fails; handler errors are logged.
pub async fn handle_interaction(
    event: SlackInteractionEvent,
    _client: Arc<SlackClient<SlackClientHyperHttpsConnector>>,
    state: SlackClientEventsUserState,
) -> slack_morphism::UserCallbackResult<()> {
    let app_state: Option<Arc<AppState>> = {
        let guard = state.read().await;
        guard.get_user_state::<Arc<AppState>>().cloned()
    };

    match &event {
        SlackInteractionEvent::BlockActions(block_event) => {
            let user_id = block_event
                .user
                .as_ref()
                .map(|u| u.id.to_string())
                .unwrap_or_default();

            if user_id.is_empty() {
                warn!("block action with empty user ID; ignoring");
                return Ok(());
            }

            let Some(ref app) = app_state else {
                warn!("app state not available; cannot process interaction");
                return Ok(());
            };

            let response_url = block_event
                .response_url
                .as_ref()
                .map(|url| url.0.to_string());

            for action in block_event.actions.iter().flatten() {
                let action_id = action.action_id.to_string();
                let value = action.value.clone().unwrap_or_default();
                info!(action_id, user_id, "dispatching block action");

                let Some(parsed) = UnpinAction::parse(&action_id, &value) else {
                    warn!(action_id, "unknown action_id prefix");
                    continue;
                };

                let payload = handlers::unpin::handle_unpin_action(app, &parsed, &user_id).await;
                match (payload, response_url.as_deref()) {
                    (Some(payload), Some(url)) => {
                        handlers::deliver(app, url, &payload).await;
                    }
                    (Some(_), None) => {
                        warn!(action_id, "interaction has no response_url; reply dropped");
                    }
                    (None, _) => {}
                }
            }
        }
        _ => {
            info!("unhandled interaction event type");
        }
    }
    Ok(())
}
