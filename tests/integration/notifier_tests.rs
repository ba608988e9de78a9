//! Integration tests for auto-expiring channel notices.

use std::sync::Arc;
use std::time::Duration;

use pushpin_bot::pins::Notifier;
use pushpin_bot::platform::ChatPlatform;

use super::test_helpers::{FakePlatform, CHANNEL};

fn notifier(fake: &Arc<FakePlatform>, ttl: Duration) -> Notifier {
    let platform: Arc<dyn ChatPlatform> = Arc::clone(fake) as Arc<dyn ChatPlatform>;
    Notifier::new(platform, ttl)
}

#[tokio::test(start_paused = true)]
async fn notice_is_deleted_after_its_lifetime() {
    let fake = FakePlatform::new();
    let notifier = notifier(&fake, Duration::from_secs(5));

    notifier.notify(CHANNEL, "pinned!");
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(fake.sent_texts(), vec!["pinned!".to_owned()]);
    assert_eq!(fake.deleted_count(), 0);
    assert_eq!(notifier.pending(), 1);

    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(fake.deleted_count(), 1);
    assert_eq!(notifier.pending(), 0);
}

#[tokio::test(start_paused = true)]
async fn custom_lifetime_overrides_default() {
    let fake = FakePlatform::new();
    let notifier = notifier(&fake, Duration::from_secs(5));

    notifier.notify_for(CHANNEL, "longer", Duration::from_secs(10));
    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(fake.deleted_count(), 0);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(fake.deleted_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn notice_removed_by_someone_else_is_ignored() {
    let fake = FakePlatform::new();
    let notifier = notifier(&fake, Duration::from_secs(5));

    notifier.notify(CHANNEL, "gone soon");
    tokio::time::sleep(Duration::from_secs(1)).await;
    fake.delete(CHANNEL, "1800000000.000001");

    notifier.drain().await;
    assert_eq!(fake.deleted_count(), 0);
    assert_eq!(notifier.pending(), 0);
}

#[tokio::test(start_paused = true)]
async fn drain_waits_for_every_notice() {
    let fake = FakePlatform::new();
    let notifier = notifier(&fake, Duration::from_secs(5));

    for i in 0..3 {
        notifier.notify(CHANNEL, format!("notice {i}"));
    }
    notifier.drain().await;

    assert_eq!(fake.sent_texts().len(), 3);
    assert_eq!(fake.deleted_count(), 3);
}
