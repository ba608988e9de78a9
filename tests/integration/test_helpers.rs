//! Shared helpers for integration tests.
//!
//! [`FakePlatform`] is an in-memory chat platform: messages, pin flags, and
//! marker reactors live in a mutex-guarded map, every call is counted, and
//! failures can be injected per operation.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

use pushpin_bot::config::GlobalConfig;
use pushpin_bot::models::{Message, Reaction, User};
use pushpin_bot::platform::{ChatPlatform, PlatformFuture};
use pushpin_bot::{AppError, AppState};

/// User ID of the bot in every test.
pub const BOT_USER_ID: &str = "UBOT";
/// Channel used by most tests.
pub const CHANNEL: &str = "C1";
/// Marker reaction name.
pub const MARKER: &str = "pushpin";

type Key = (String, String);

#[derive(Default)]
struct FakeState {
    messages: HashMap<Key, Message>,
    reactors: HashMap<(String, String, String), Vec<User>>,
    sent: Vec<(String, String, String)>,
    deleted: Vec<Key>,
    added_reactions: Vec<(String, String, String)>,
    pin_calls: usize,
    unpin_calls: usize,
    fetch_calls: usize,
    next_id: u64,
    fetch_error: Option<AppError>,
    pin_error: Option<AppError>,
    unpin_errors: HashMap<String, AppError>,
    list_error: Option<AppError>,
    enumeration_fails: bool,
}

/// In-memory [`ChatPlatform`].
#[derive(Default)]
pub struct FakePlatform {
    state: Mutex<FakeState>,
}

impl FakePlatform {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn with<T>(&self, f: impl FnOnce(&mut FakeState) -> T) -> T {
        let mut guard = self.state.lock().expect("fake platform lock");
        f(&mut guard)
    }

    /// Store a message.
    pub fn insert(&self, message: Message) {
        self.with(|s| {
            s.messages
                .insert((message.channel_id.clone(), message.id.clone()), message);
        });
    }

    /// Set the users holding `emoji`, keeping the message's reaction count
    /// in sync. An empty list removes the reaction.
    pub fn set_reactors(&self, channel_id: &str, message_id: &str, emoji: &str, users: Vec<User>) {
        self.with(|s| {
            if let Some(message) = s
                .messages
                .get_mut(&(channel_id.to_owned(), message_id.to_owned()))
            {
                message.reactions.retain(|r| r.emoji != emoji);
                if !users.is_empty() {
                    message.reactions.push(Reaction {
                        emoji: emoji.to_owned(),
                        count: u32::try_from(users.len()).expect("small count"),
                    });
                }
            }
            s.reactors.insert(
                (channel_id.to_owned(), message_id.to_owned(), emoji.to_owned()),
                users,
            );
        });
    }

    /// Remove a message, as if its author deleted it.
    pub fn delete(&self, channel_id: &str, message_id: &str) {
        self.with(|s| {
            s.messages
                .remove(&(channel_id.to_owned(), message_id.to_owned()));
        });
    }

    pub fn message(&self, channel_id: &str, message_id: &str) -> Option<Message> {
        self.with(|s| {
            s.messages
                .get(&(channel_id.to_owned(), message_id.to_owned()))
                .cloned()
        })
    }

    pub fn is_pinned(&self, channel_id: &str, message_id: &str) -> bool {
        self.message(channel_id, message_id)
            .is_some_and(|m| m.pinned)
    }

    pub fn pin_calls(&self) -> usize {
        self.with(|s| s.pin_calls)
    }

    pub fn unpin_calls(&self) -> usize {
        self.with(|s| s.unpin_calls)
    }

    pub fn fetch_calls(&self) -> usize {
        self.with(|s| s.fetch_calls)
    }

    /// Texts of every message posted through `send_message`.
    pub fn sent_texts(&self) -> Vec<String> {
        self.with(|s| s.sent.iter().map(|(_, _, text)| text.clone()).collect())
    }

    /// Messages removed through `delete_message`.
    pub fn deleted_count(&self) -> usize {
        self.with(|s| s.deleted.len())
    }

    /// `(channel, message, emoji)` for every reaction the bot added.
    pub fn added_reactions(&self) -> Vec<(String, String, String)> {
        self.with(|s| s.added_reactions.clone())
    }

    pub fn fail_fetch(&self, err: AppError) {
        self.with(|s| s.fetch_error = Some(err));
    }

    pub fn fail_pin(&self, err: AppError) {
        self.with(|s| s.pin_error = Some(err));
    }

    pub fn fail_unpin_of(&self, message_id: &str, err: AppError) {
        self.with(|s| {
            s.unpin_errors.insert(message_id.to_owned(), err);
        });
    }

    pub fn fail_list(&self, err: AppError) {
        self.with(|s| s.list_error = Some(err));
    }

    pub fn fail_enumeration(&self) {
        self.with(|s| s.enumeration_fails = true);
    }
}

impl ChatPlatform for FakePlatform {
    fn fetch_message<'a>(
        &'a self,
        channel_id: &'a str,
        message_id: &'a str,
    ) -> PlatformFuture<'a, Message> {
        let result = self.with(|s| {
            s.fetch_calls += 1;
            if let Some(err) = s.fetch_error.clone() {
                return Err(err);
            }
            s.messages
                .get(&(channel_id.to_owned(), message_id.to_owned()))
                .cloned()
                .ok_or_else(|| AppError::NotFound(format!("message {message_id}")))
        });
        Box::pin(async move { result })
    }

    fn pin<'a>(&'a self, channel_id: &'a str, message_id: &'a str) -> PlatformFuture<'a, ()> {
        let result = self.with(|s| {
            s.pin_calls += 1;
            if let Some(err) = s.pin_error.clone() {
                return Err(err);
            }
            let message = s
                .messages
                .get_mut(&(channel_id.to_owned(), message_id.to_owned()))
                .ok_or_else(|| AppError::NotFound(format!("message {message_id}")))?;
            message.pinned = true;
            Ok(())
        });
        Box::pin(async move { result })
    }

    fn unpin<'a>(&'a self, channel_id: &'a str, message_id: &'a str) -> PlatformFuture<'a, ()> {
        let result = self.with(|s| {
            s.unpin_calls += 1;
            if let Some(err) = s.unpin_errors.get(message_id).cloned() {
                return Err(err);
            }
            let message = s
                .messages
                .get_mut(&(channel_id.to_owned(), message_id.to_owned()))
                .ok_or_else(|| AppError::NotFound(format!("message {message_id}")))?;
            message.pinned = false;
            Ok(())
        });
        Box::pin(async move { result })
    }

    fn list_pins<'a>(&'a self, channel_id: &'a str) -> PlatformFuture<'a, Vec<Message>> {
        let result = self.with(|s| {
            if let Some(err) = s.list_error.clone() {
                return Err(err);
            }
            let mut pins: Vec<Message> = s
                .messages
                .values()
                .filter(|m| m.channel_id == channel_id && m.pinned)
                .cloned()
                .collect();
            pins.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
            Ok(pins)
        });
        Box::pin(async move { result })
    }

    fn reaction_users<'a>(
        &'a self,
        channel_id: &'a str,
        message_id: &'a str,
        emoji: &'a str,
    ) -> PlatformFuture<'a, Vec<User>> {
        let result = self.with(|s| {
            if s.enumeration_fails {
                return Err(AppError::Enumeration("injected failure".into()));
            }
            Ok(s.reactors
                .get(&(channel_id.to_owned(), message_id.to_owned(), emoji.to_owned()))
                .cloned()
                .unwrap_or_default())
        });
        Box::pin(async move { result })
    }

    fn add_reaction<'a>(
        &'a self,
        channel_id: &'a str,
        message_id: &'a str,
        emoji: &'a str,
    ) -> PlatformFuture<'a, ()> {
        self.with(|s| {
            s.added_reactions.push((
                channel_id.to_owned(),
                message_id.to_owned(),
                emoji.to_owned(),
            ));
        });
        let mut users = self.with(|s| {
            s.reactors
                .get(&(channel_id.to_owned(), message_id.to_owned(), emoji.to_owned()))
                .cloned()
                .unwrap_or_default()
        });
        users.push(User::bot(BOT_USER_ID));
        self.set_reactors(channel_id, message_id, emoji, users);
        Box::pin(async { Ok(()) })
    }

    fn send_message<'a>(
        &'a self,
        channel_id: &'a str,
        text: &'a str,
    ) -> PlatformFuture<'a, String> {
        let id = self.with(|s| {
            s.next_id += 1;
            let id = format!("1800000000.{:06}", s.next_id);
            s.sent
                .push((channel_id.to_owned(), id.clone(), text.to_owned()));
            s.messages.insert(
                (channel_id.to_owned(), id.clone()),
                Message {
                    id: id.clone(),
                    channel_id: channel_id.to_owned(),
                    author_id: BOT_USER_ID.to_owned(),
                    content: text.to_owned(),
                    created_at: Utc::now(),
                    pinned: false,
                    reactions: Vec::new(),
                    link: None,
                },
            );
            id
        });
        Box::pin(async move { Ok(id) })
    }

    fn delete_message<'a>(
        &'a self,
        channel_id: &'a str,
        message_id: &'a str,
    ) -> PlatformFuture<'a, ()> {
        let result = self.with(|s| {
            let key = (channel_id.to_owned(), message_id.to_owned());
            s.messages
                .remove(&key)
                .map(|_| s.deleted.push(key))
                .ok_or_else(|| AppError::NotFound(format!("message {message_id}")))
        });
        Box::pin(async move { result })
    }
}

/// An unpinned message in [`CHANNEL`] created at `created_at`.
pub fn message_at(id: &str, author: &str, content: &str, created_at: DateTime<Utc>) -> Message {
    Message {
        id: id.to_owned(),
        channel_id: CHANNEL.to_owned(),
        author_id: author.to_owned(),
        content: content.to_owned(),
        created_at,
        pinned: false,
        reactions: Vec::new(),
        link: Some(format!("https://example.slack.com/archives/{CHANNEL}/p{id}")),
    }
}

/// An unpinned message in [`CHANNEL`], created `days_ago` days ago.
pub fn message(id: &str, author: &str, content: &str, days_ago: i64) -> Message {
    message_at(id, author, content, Utc::now() - Duration::days(days_ago))
}

/// Insert a pinned message held by `holders` (human users).
pub fn pinned_message(
    platform: &FakePlatform,
    id: &str,
    author: &str,
    days_ago: i64,
    holders: &[&str],
) {
    let mut msg = message(id, author, &format!("message {id}"), days_ago);
    msg.pinned = true;
    platform.insert(msg);
    platform.set_reactors(
        CHANNEL,
        id,
        MARKER,
        holders.iter().map(|u| User::human(*u)).collect(),
    );
}

/// Default configuration for tests.
pub fn test_config() -> GlobalConfig {
    GlobalConfig::default()
}

/// App state wired around `platform` without a Slack client.
pub fn test_app_state(platform: &Arc<FakePlatform>) -> AppState {
    test_app_state_with(platform, test_config())
}

/// App state wired around `platform` with a custom configuration.
pub fn test_app_state_with(platform: &Arc<FakePlatform>, config: GlobalConfig) -> AppState {
    let platform: Arc<dyn ChatPlatform> = Arc::clone(platform) as Arc<dyn ChatPlatform>;
    AppState::new(Arc::new(config), platform, None, BOT_USER_ID)
}
