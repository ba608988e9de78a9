//! Reaction push events.
//!
//! `reaction_added` / `reaction_removed` events on messages are converted to
//! [`ReactionEvent`]s, classified, and handed to the reconciler on their own
//! task so that a slow Web API call never holds up the listener.

use std::sync::Arc;

use slack_morphism::prelude::{
    SlackClient, SlackClientEventsUserState, SlackClientHyperHttpsConnector,
    SlackEventCallbackBody, SlackPushEventCallback, SlackReactionsItem,
};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::pins::{classify, ReactionEvent, ReactionKind};
use crate::state::AppState;

/// Handle push events delivered via Socket Mode.
///
/// # Errors
///
/// Never fails; unsupported events are ignored.
pub async fn handle_push_event(
    event: SlackPushEventCallback,
    _client: Arc<SlackClient<SlackClientHyperHttpsConnector>>,
    state: SlackClientEventsUserState,
) -> slack_morphism::UserCallbackResult<()> {
    let app_state: Option<Arc<AppState>> = {
        let guard = state.read().await;
        guard.get_user_state::<Arc<AppState>>().cloned()
    };
    let Some(app) = app_state else {
        warn!("app state not available; dropping push event");
        return Ok(());
    };

    let reaction = match event.event {
        SlackEventCallbackBody::ReactionAdded(ev) => match &ev.item {
            SlackReactionsItem::Message(m) => m.origin.channel.as_ref().map(|c| ReactionEvent {
                message_id: m.origin.ts.0.clone(),
                channel_id: c.0.clone(),
                actor_id: ev.user.0.clone(),
                emoji: ev.reaction.0.clone(),
                kind: ReactionKind::Added,
            }),
            _ => None,
        },
        SlackEventCallbackBody::ReactionRemoved(ev) => match &ev.item {
            SlackReactionsItem::Message(m) => m.origin.channel.as_ref().map(|c| ReactionEvent {
                message_id: m.origin.ts.0.clone(),
                channel_id: c.0.clone(),
                actor_id: ev.user.0.clone(),
                emoji: ev.reaction.0.clone(),
                kind: ReactionKind::Removed,
            }),
            _ => None,
        },
        _ => {
            debug!("ignoring unhandled push event type");
            return Ok(());
        }
    };

    match reaction {
        Some(reaction) => {
            dispatch_reaction(&app, &reaction);
        }
        None => debug!("reaction on a non-message item ignored"),
    }
    Ok(())
}

/// Classify `event` and, when it concerns the marker, reconcile it on a
/// spawned task. Returns the task handle so callers may await it.
pub fn dispatch_reaction(app: &AppState, event: &ReactionEvent) -> Option<JoinHandle<()>> {
    let Some(intent) = classify(event, &app.bot_user_id, app.reconciler.marker()) else {
        debug!(emoji = %event.emoji, actor_id = %event.actor_id, "reaction ignored");
        return None;
    };

    let reconciler = app.reconciler.clone();
    Some(tokio::spawn(async move {
        reconciler.handle(intent).await;
    }))
}
