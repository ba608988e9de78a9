//! Integration tests for the `status` and `test` subcommands.

use pushpin_bot::models::User;
use pushpin_bot::pins::{ReactionEvent, ReactionKind};
use pushpin_bot::slack::handlers::bot::{post_test_message, status_reply, TEST_MESSAGE};
use pushpin_bot::slack::push::dispatch_reaction;
use pushpin_bot::AppError;

use super::test_helpers::{
    pinned_message, test_app_state, FakePlatform, BOT_USER_ID, CHANNEL, MARKER,
};

#[tokio::test]
async fn status_counts_channel_pins() {
    let fake = FakePlatform::new();
    pinned_message(&fake, "950.000001", "UAUTHOR", 1, &["UALICE"]);
    pinned_message(&fake, "950.000002", "UAUTHOR", 2, &["UBOB"]);
    let app = test_app_state(&fake);

    let text = status_reply(&app, CHANNEL).await;

    assert!(text.contains(&format!("<@{BOT_USER_ID}>")));
    assert!(text.contains("2/50"));
    assert!(text.contains("Uptime"));
}

#[tokio::test]
async fn status_reports_lookup_failure() {
    let fake = FakePlatform::new();
    fake.fail_list(AppError::Forbidden("not_in_channel".into()));
    let app = test_app_state(&fake);

    let text = status_reply(&app, CHANNEL).await;

    assert!(text.starts_with('\u{274c}'));
    assert!(text.contains("not_in_channel"));
}

#[tokio::test]
async fn test_message_gets_bot_marker_but_stays_unpinned() {
    let fake = FakePlatform::new();
    let app = test_app_state(&fake);

    let message_id = post_test_message(&app, CHANNEL)
        .await
        .expect("test message posted");

    assert_eq!(fake.sent_texts(), vec![TEST_MESSAGE.to_owned()]);
    assert_eq!(
        fake.added_reactions(),
        vec![(CHANNEL.to_owned(), message_id.clone(), MARKER.to_owned())]
    );
    assert!(!fake.is_pinned(CHANNEL, &message_id));

    // The bot's own reaction event is dropped before reconciliation.
    let own = ReactionEvent {
        message_id: message_id.clone(),
        channel_id: CHANNEL.into(),
        actor_id: BOT_USER_ID.into(),
        emoji: MARKER.into(),
        kind: ReactionKind::Added,
    };
    assert!(dispatch_reaction(&app, &own).is_none());
}

#[tokio::test]
async fn human_marker_on_test_message_pins_it_and_removal_unpins() {
    let fake = FakePlatform::new();
    let app = test_app_state(&fake);
    let message_id = post_test_message(&app, CHANNEL)
        .await
        .expect("test message posted");

    fake.set_reactors(
        CHANNEL,
        &message_id,
        MARKER,
        vec![User::bot(BOT_USER_ID), User::human("UALICE")],
    );
    let added = ReactionEvent {
        message_id: message_id.clone(),
        channel_id: CHANNEL.into(),
        actor_id: "UALICE".into(),
        emoji: MARKER.into(),
        kind: ReactionKind::Added,
    };
    dispatch_reaction(&app, &added)
        .expect("dispatched")
        .await
        .expect("reconcile task");
    assert!(fake.is_pinned(CHANNEL, &message_id));

    // Only the bot's reaction remains; it does not hold the pin.
    fake.set_reactors(CHANNEL, &message_id, MARKER, vec![User::bot(BOT_USER_ID)]);
    let removed = ReactionEvent {
        kind: ReactionKind::Removed,
        ..added
    };
    dispatch_reaction(&app, &removed)
        .expect("dispatched")
        .await
        .expect("reconcile task");
    assert!(!fake.is_pinned(CHANNEL, &message_id));
}
