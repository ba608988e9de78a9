//! Chat-platform capability surface.
//!
//! The [`ChatPlatform`] trait decouples the pin engine (reconciler,
//! ownership evaluator, listing, sessions) from the concrete client. The
//! Slack implementation lives in [`crate::slack::client`]; tests substitute
//! an in-memory fake.

use std::future::Future;
use std::pin::Pin;

use crate::models::{Message, User};
use crate::Result;

/// Boxed future returned by every [`ChatPlatform`] call.
pub type PlatformFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Operations the pin engine needs from the chat platform.
///
/// Every call is a suspension point; callers must not assume that state
/// observed by one call still holds when the next one runs.
pub trait ChatPlatform: Send + Sync {
    /// Fetch a fresh snapshot of a message.
    ///
    /// # Errors
    ///
    /// [`AppError::NotFound`](crate::AppError::NotFound) when the message or
    /// channel is gone, [`AppError::Forbidden`](crate::AppError::Forbidden)
    /// when the bot cannot read it.
    fn fetch_message<'a>(
        &'a self,
        channel_id: &'a str,
        message_id: &'a str,
    ) -> PlatformFuture<'a, Message>;

    /// Pin a message. Pinning an already-pinned message succeeds.
    ///
    /// # Errors
    ///
    /// [`AppError::Forbidden`](crate::AppError::Forbidden),
    /// [`AppError::PinLimit`](crate::AppError::PinLimit) or
    /// [`AppError::Platform`](crate::AppError::Platform).
    fn pin<'a>(&'a self, channel_id: &'a str, message_id: &'a str) -> PlatformFuture<'a, ()>;

    /// Unpin a message. Unpinning a message that is not pinned succeeds.
    ///
    /// # Errors
    ///
    /// [`AppError::Forbidden`](crate::AppError::Forbidden) or
    /// [`AppError::Platform`](crate::AppError::Platform).
    fn unpin<'a>(&'a self, channel_id: &'a str, message_id: &'a str) -> PlatformFuture<'a, ()>;

    /// List the pinned messages of a channel, most recent pin first.
    ///
    /// # Errors
    ///
    /// Propagates platform failures.
    fn list_pins<'a>(&'a self, channel_id: &'a str) -> PlatformFuture<'a, Vec<Message>>;

    /// Enumerate every account holding `emoji` on a message.
    ///
    /// # Errors
    ///
    /// [`AppError::Enumeration`](crate::AppError::Enumeration) on any failure;
    /// callers treat it as "cannot confirm".
    fn reaction_users<'a>(
        &'a self,
        channel_id: &'a str,
        message_id: &'a str,
        emoji: &'a str,
    ) -> PlatformFuture<'a, Vec<User>>;

    /// Add a reaction as the bot user.
    ///
    /// # Errors
    ///
    /// Propagates platform failures.
    fn add_reaction<'a>(
        &'a self,
        channel_id: &'a str,
        message_id: &'a str,
        emoji: &'a str,
    ) -> PlatformFuture<'a, ()>;

    /// Post a plain-text message and return its identifier.
    ///
    /// # Errors
    ///
    /// Propagates platform failures.
    fn send_message<'a>(&'a self, channel_id: &'a str, text: &'a str)
        -> PlatformFuture<'a, String>;

    /// Delete a message previously posted by the bot.
    ///
    /// # Errors
    ///
    /// Propagates platform failures, including `NotFound` when it is
    /// already gone.
    fn delete_message<'a>(
        &'a self,
        channel_id: &'a str,
        message_id: &'a str,
    ) -> PlatformFuture<'a, ()>;
}
