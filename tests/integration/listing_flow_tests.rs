//! Integration tests for the pin listing and the session it opens.

use chrono::{Duration, Utc};

use pushpin_bot::models::User;
use pushpin_bot::pins::listing::{EMPTY_PREVIEW, TRUNCATION_MARKER};
use pushpin_bot::pins::{build_listing, ListRequest, ListingSettings};
use pushpin_bot::slack::handlers::listing::listing_reply;
use pushpin_bot::AppError;

use super::test_helpers::{
    message, message_at, pinned_message, test_app_state, FakePlatform, CHANNEL, MARKER,
};

const REQUESTER: &str = "UALICE";

fn request() -> ListRequest {
    ListRequest {
        channel_id: CHANNEL.into(),
        requester_id: REQUESTER.into(),
        ..ListRequest::default()
    }
}

#[tokio::test]
async fn self_only_pins_are_eligible_and_others_locked() {
    let fake = FakePlatform::new();
    pinned_message(&fake, "200.000001", "UAUTHOR", 1, &[REQUESTER]);
    pinned_message(&fake, "200.000002", "UAUTHOR", 2, &[REQUESTER, "UBOB"]);
    pinned_message(&fake, "200.000003", "UCAROL", 3, &["UBOB"]);

    let listing = build_listing(
        &*fake,
        &ListingSettings::default(),
        &request(),
        Utc::now(),
    )
    .await
    .expect("listing builds");

    assert_eq!(listing.total, 3);
    assert_eq!(listing.title, "\u{1f4cc} Pinned messages from everyone");
    assert_eq!(listing.eligible.len(), 1);
    assert_eq!(listing.eligible[0].id, "200.000001");

    let lines: Vec<&str> = listing.body.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with('\u{1f4cc}'));
    assert!(lines[1].starts_with('\u{1f512}'));
    assert!(lines[1].ends_with("_by <@UAUTHOR>_"));
    assert!(lines[2].ends_with("_by <@UCAROL>_"));
    assert_eq!(
        listing.footer.as_deref(),
        Some("Total 3 | \u{1f4cc} yours: 1 (can be unpinned)")
    );
}

#[tokio::test]
async fn bot_reactors_do_not_spoil_self_only() {
    let fake = FakePlatform::new();
    pinned_message(&fake, "200.000010", "UAUTHOR", 1, &[]);
    fake.set_reactors(
        CHANNEL,
        "200.000010",
        MARKER,
        vec![User::human(REQUESTER), User::bot("UBOT")],
    );

    let listing = build_listing(
        &*fake,
        &ListingSettings::default(),
        &request(),
        Utc::now(),
    )
    .await
    .expect("listing builds");

    assert_eq!(listing.eligible.len(), 1);
}

#[tokio::test]
async fn enumeration_failure_locks_every_pin() {
    let fake = FakePlatform::new();
    pinned_message(&fake, "200.000020", "UAUTHOR", 1, &[REQUESTER]);
    fake.fail_enumeration();

    let listing = build_listing(
        &*fake,
        &ListingSettings::default(),
        &request(),
        Utc::now(),
    )
    .await
    .expect("listing builds");

    assert_eq!(listing.total, 1);
    assert!(listing.eligible.is_empty());
    assert!(listing.body.starts_with('\u{1f512}'));
    assert!(listing
        .footer
        .as_deref()
        .is_some_and(|f| f.ends_with("you have no pins of your own")));
}

#[tokio::test]
async fn author_and_age_filters_apply() {
    let fake = FakePlatform::new();
    pinned_message(&fake, "200.000030", "UAUTHOR", 1, &[REQUESTER]);
    pinned_message(&fake, "200.000031", "UAUTHOR", 10, &[REQUESTER]);
    pinned_message(&fake, "200.000032", "UCAROL", 1, &[REQUESTER]);

    let req = ListRequest {
        filter_user: Some("UAUTHOR".into()),
        since_days: Some(3),
        ..request()
    };
    let listing = build_listing(&*fake, &ListingSettings::default(), &req, Utc::now())
        .await
        .expect("listing builds");

    assert_eq!(listing.title, "\u{1f4cc} Pinned messages from <@UAUTHOR>");
    assert_eq!(listing.total, 1);
    assert_eq!(listing.eligible[0].id, "200.000030");
    assert_eq!(
        listing.footer.as_deref(),
        Some("Total 1 (last 3 days) | \u{1f4cc} yours: 1 (can be unpinned)")
    );
}

#[tokio::test]
async fn zero_days_means_no_age_limit() {
    let fake = FakePlatform::new();
    pinned_message(&fake, "200.000040", "UAUTHOR", 400, &["UBOB"]);

    let req = ListRequest {
        since_days: Some(0),
        ..request()
    };
    let listing = build_listing(&*fake, &ListingSettings::default(), &req, Utc::now())
        .await
        .expect("listing builds");

    assert_eq!(listing.total, 1);
    assert_eq!(
        listing.footer.as_deref(),
        Some("Total 1 | you have no pins of your own")
    );
}

#[tokio::test]
async fn empty_result_names_the_filters() {
    let fake = FakePlatform::new();
    pinned_message(&fake, "200.000050", "UAUTHOR", 30, &[REQUESTER]);

    let req = ListRequest {
        filter_user: Some("UDAVE".into()),
        since_days: Some(7),
        ..request()
    };
    let listing = build_listing(&*fake, &ListingSettings::default(), &req, Utc::now())
        .await
        .expect("listing builds");

    assert!(listing.is_empty());
    assert!(listing.footer.is_none());
    assert!(listing.selectable().is_empty());
    assert_eq!(
        listing.body,
        "\u{1f4cc} No pinned messages from <@UDAVE> in the last 7 days in this channel."
    );
}

#[tokio::test]
async fn empty_channel_has_plain_empty_text() {
    let fake = FakePlatform::new();
    let listing = build_listing(
        &*fake,
        &ListingSettings::default(),
        &request(),
        Utc::now(),
    )
    .await
    .expect("listing builds");
    assert_eq!(listing.body, "\u{1f4cc} No pinned messages in this channel.");
}

#[tokio::test]
async fn only_the_most_recent_pins_up_to_the_cap_are_considered() {
    let fake = FakePlatform::new();
    let now = Utc::now();
    for i in 0..60 {
        let id = format!("300.{i:06}");
        let mut msg = message_at(&id, "UAUTHOR", "note", now - Duration::minutes(i));
        msg.pinned = true;
        fake.insert(msg);
    }

    let listing = build_listing(&*fake, &ListingSettings::default(), &request(), now)
        .await
        .expect("listing builds");

    assert_eq!(listing.total, 50);
    assert!(listing.body.contains("300.000049"));
    assert!(!listing.body.contains("300.000050"));
}

#[tokio::test]
async fn more_than_max_selectable_eligible_pins_are_capped() {
    let fake = FakePlatform::new();
    for i in 0..30 {
        pinned_message(&fake, &format!("400.{i:06}"), REQUESTER, 1, &[REQUESTER]);
    }

    let listing = build_listing(
        &*fake,
        &ListingSettings::default(),
        &request(),
        Utc::now(),
    )
    .await
    .expect("listing builds");

    assert_eq!(listing.eligible.len(), 30);
    assert_eq!(listing.selectable().len(), 25);
    assert!(listing
        .footer
        .as_deref()
        .is_some_and(|f| f.contains("yours: 30 (only the first 25 can be unpinned)")));
}

#[tokio::test]
async fn long_listings_are_truncated() {
    let fake = FakePlatform::new();
    for i in 0..10 {
        pinned_message(&fake, &format!("500.{i:06}"), "UAUTHOR", 1, &["UBOB"]);
    }
    let settings = ListingSettings {
        text_budget: 120,
        ..ListingSettings::default()
    };

    let listing = build_listing(&*fake, &settings, &request(), Utc::now())
        .await
        .expect("listing builds");

    assert!(listing.body.ends_with(TRUNCATION_MARKER));
    assert_eq!(
        listing.body.chars().count(),
        120 + TRUNCATION_MARKER.chars().count()
    );
    assert_eq!(listing.total, 10);
}

#[tokio::test]
async fn empty_content_gets_placeholder_preview() {
    let fake = FakePlatform::new();
    let mut msg = message("600.000001", "UAUTHOR", "", 1);
    msg.pinned = true;
    fake.insert(msg);

    let listing = build_listing(
        &*fake,
        &ListingSettings::default(),
        &request(),
        Utc::now(),
    )
    .await
    .expect("listing builds");

    assert!(listing.body.contains(EMPTY_PREVIEW));
}

#[tokio::test]
async fn reply_opens_session_over_selectable_pins() {
    let fake = FakePlatform::new();
    pinned_message(&fake, "700.000001", "UAUTHOR", 1, &[REQUESTER]);
    pinned_message(&fake, "700.000002", "UAUTHOR", 1, &["UBOB"]);
    let app = test_app_state(&fake);

    let reply = listing_reply(&app, request()).await;

    let session_id = reply.session_id.expect("session opened");
    let session = app.sessions.get(&session_id).await.expect("session is open");
    assert_eq!(session.owner_user_id, REQUESTER);
    assert_eq!(session.candidates.len(), 1);
    assert_eq!(session.candidates[0].id, "700.000001");
    assert!(session.summary.contains("Pinned messages from everyone"));

    assert_eq!(reply.payload["response_type"], "ephemeral");
    let blocks = reply.payload["blocks"].to_string();
    assert!(blocks.contains("unpin_toggle_0"));
    assert!(blocks.contains("unpin_apply"));
}

#[tokio::test]
async fn reply_without_own_pins_opens_no_session() {
    let fake = FakePlatform::new();
    pinned_message(&fake, "700.000010", "UAUTHOR", 1, &["UBOB"]);
    let app = test_app_state(&fake);

    let reply = listing_reply(&app, request()).await;

    assert!(reply.session_id.is_none());
    assert!(app.sessions.is_empty().await);
    let blocks = reply.payload["blocks"].to_string();
    assert!(!blocks.contains("unpin_apply"));
    assert!(blocks.contains("you have no pins of your own"));
}

#[tokio::test]
async fn reply_reports_listing_failure() {
    let fake = FakePlatform::new();
    fake.fail_list(AppError::Forbidden("not_in_channel".into()));
    let app = test_app_state(&fake);

    let reply = listing_reply(&app, request()).await;

    assert!(reply.session_id.is_none());
    let text = reply.payload["text"].as_str().expect("text reply");
    assert!(text.contains("Could not list pinned messages"));
}
