//! Listing command handler.

use chrono::Utc;
use serde_json::Value;
use tracing::{info_span, warn, Instrument};

use super::deliver;
use crate::pins::{build_listing, ListRequest};
use crate::slack::blocks;
use crate::state::AppState;

/// Reply to a listing command.
#[derive(Debug, Clone)]
pub struct ListingReply {
    /// Ephemeral `response_url` payload.
    pub payload: Value,
    /// Session opened for bulk unpinning, if any pin is self-only.
    pub session_id: Option<String>,
}

/// Build the listing and, when the requester holds self-only pins, open a
/// bulk-unpin session over the first selectable ones.
pub async fn listing_reply(app: &AppState, request: ListRequest) -> ListingReply {
    let settings = app.listing_settings();
    let listing = match build_listing(app.platform.as_ref(), &settings, &request, Utc::now()).await
    {
        Ok(listing) => listing,
        Err(err) => {
            warn!(%err, channel_id = %request.channel_id, "pin listing failed");
            return ListingReply {
                payload: blocks::ephemeral_text(&format!(
                    "\u{274c} Could not list pinned messages: {err}"
                )),
                session_id: None,
            };
        }
    };

    let text = blocks::listing_text(&listing);
    if listing.selectable().is_empty() {
        let payload = blocks::ephemeral_payload(&text, &blocks::listing_blocks(&listing))
            .unwrap_or_else(|_| blocks::ephemeral_text(&text));
        return ListingReply {
            payload,
            session_id: None,
        };
    }

    let session = app
        .sessions
        .open(
            &request.requester_id,
            &request.channel_id,
            listing.selectable().to_vec(),
            text.clone(),
        )
        .await;
    let payload = blocks::ephemeral_payload(&text, &blocks::session_blocks(&session))
        .unwrap_or_else(|_| blocks::ephemeral_text(&text));
    ListingReply {
        payload,
        session_id: Some(session.id),
    }
}

/// Run a listing command and post the result to `response_url`.
pub async fn run_listing(app: &AppState, request: ListRequest, response_url: &str) {
    let span = info_span!(
        "list_command",
        channel_id = %request.channel_id,
        requester_id = %request.requester_id,
    );
    async {
        let reply = listing_reply(app, request).await;
        deliver(app, response_url, &reply.payload).await;
    }
    .instrument(span)
    .await;
}
