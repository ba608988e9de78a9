//! Slack Socket Mode client and [`ChatPlatform`] implementation.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::try_join_all;
use serde_json::Value;
use slack_morphism::errors::SlackClientError;
use slack_morphism::prelude::{
    SlackApiChatDeleteRequest, SlackApiChatPostMessageRequest, SlackApiReactionsAddRequest,
    SlackApiToken, SlackApiTokenType, SlackApiTokenValue, SlackChannelId, SlackClient,
    SlackClientEventsListenerEnvironment, SlackClientHyperHttpsConnector, SlackClientSession,
    SlackClientSocketModeConfig, SlackClientSocketModeListener, SlackMessageContent,
    SlackReactionName, SlackSocketModeListenerCallbacks, SlackTs,
};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::models::{Message, User};
use crate::platform::{ChatPlatform, PlatformFuture};
use crate::slack::api::{map_error_code, AuthIdentity, SlackWebApi};
use crate::slack::retry::Backoff;
use crate::slack::{commands, events, push};
use crate::state::AppState;
use crate::{config::SlackConfig, AppError, Result};

/// Plain-text message delivered via `chat.postMessage`.
#[derive(Debug, Clone)]
pub struct SlackMessage {
    /// Target channel.
    pub channel: SlackChannelId,
    /// Message text (`mrkdwn`).
    pub text: String,
}

impl SlackMessage {
    /// Create a plain-text message for a channel.
    pub fn plain(channel: SlackChannelId, text: impl Into<String>) -> Self {
        Self {
            channel,
            text: text.into(),
        }
    }

    fn into_request(self) -> SlackApiChatPostMessageRequest {
        let content = SlackMessageContent {
            text: Some(self.text),
            blocks: None,
            attachments: None,
            upload: None,
            files: None,
            reactions: None,
            metadata: None,
        };

        SlackApiChatPostMessageRequest {
            channel: self.channel,
            content,
            as_user: None,
            icon_emoji: None,
            icon_url: None,
            link_names: Some(true),
            parse: None,
            thread_ts: None,
            username: None,
            reply_broadcast: None,
            unfurl_links: Some(false),
            unfurl_media: None,
        }
    }
}

/// Slack client: Socket Mode listener plus Web API calls.
pub struct SlackService {
    client: Arc<SlackClient<SlackClientHyperHttpsConnector>>,
    bot_token: SlackApiToken,
    app_token: SlackApiToken,
    api: SlackWebApi,
    bot_flags: RwLock<HashMap<String, bool>>,
}

impl SlackService {
    /// Build the Slack client from configured tokens.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Slack` if the HTTPS connector cannot be created.
    pub fn new(config: &SlackConfig) -> Result<Self> {
        let connector = SlackClientHyperHttpsConnector::new()
            .map_err(|err| AppError::Slack(format!("failed to init slack connector: {err}")))?;
        let client = Arc::new(SlackClient::new(connector));
        let bot_token = SlackApiToken {
            token_value: SlackApiTokenValue(config.bot_token.clone()),
            cookie: None,
            team_id: None,
            scope: None,
            token_type: Some(SlackApiTokenType::Bot),
        };
        let app_token = SlackApiToken {
            token_value: SlackApiTokenValue(config.app_token.clone()),
            cookie: None,
            team_id: None,
            scope: None,
            token_type: Some(SlackApiTokenType::App),
        };

        Ok(Self {
            client,
            bot_token,
            app_token,
            api: SlackWebApi::new(config.bot_token.clone()),
            bot_flags: RwLock::default(),
        })
    }

    /// Identify the bot user behind the bot token.
    ///
    /// # Errors
    ///
    /// Returns the mapped Slack error when `auth.test` fails.
    pub async fn identify(&self) -> Result<AuthIdentity> {
        let identity = self.api.auth_test().await?;
        info!(
            bot_user_id = %identity.user_id,
            bot_name = %identity.user,
            team_id = %identity.team_id,
            "authenticated with slack"
        );
        Ok(identity)
    }

    /// Start the Socket Mode listener with `state` as shared user state.
    #[must_use]
    pub fn spawn_socket_mode(&self, state: Arc<AppState>) -> JoinHandle<()> {
        let listener_env = Arc::new(
            SlackClientEventsListenerEnvironment::new(Arc::clone(&self.client))
                .with_error_handler(|err, _client, _state| {
                    error!(?err, "socket mode error");
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR
                })
                .with_user_state(state),
        );
        let callbacks = SlackSocketModeListenerCallbacks::new()
            .with_hello_events(|event, _client, _state| async move {
                info!(?event, "socket hello");
            })
            .with_push_events(push::handle_push_event)
            .with_command_events(commands::handle_command)
            .with_interaction_events(events::handle_interaction);
        let config = SlackClientSocketModeConfig {
            max_connections_count: SlackClientSocketModeConfig::DEFAULT_CONNECTIONS_COUNT,
            debug_connections: SlackClientSocketModeConfig::DEFAULT_DEBUG_CONNECTIONS,
            initial_backoff_in_seconds:
                SlackClientSocketModeConfig::DEFAULT_INITIAL_BACKOFF_IN_SECONDS,
            reconnect_timeout_in_seconds:
                SlackClientSocketModeConfig::DEFAULT_RECONNECT_TIMEOUT_IN_SECONDS,
            ping_interval_in_seconds: SlackClientSocketModeConfig::DEFAULT_PING_INTERVAL_IN_SECONDS,
            ping_failure_threshold_times:
                SlackClientSocketModeConfig::DEFAULT_PING_FAILURE_THRESHOLD_TIMES,
        };

        let listener = SlackClientSocketModeListener::new(&config, listener_env, callbacks);
        let app_token = self.app_token.clone();
        tokio::spawn(async move {
            if let Err(error) = listener.listen_for(&app_token).await {
                error!(?error, "socket mode listen failed");
                return;
            }

            listener.serve().await;
            info!("socket mode listener exited");
        })
    }

    /// Create an HTTP session for direct API calls using the bot token.
    #[must_use]
    pub fn http_session(&self) -> SlackClientSession<'_, SlackClientHyperHttpsConnector> {
        self.client.open_session(&self.bot_token)
    }

    /// Post a payload to a slash-command or interaction `response_url`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Slack` when the webhook rejects the payload.
    pub async fn respond(&self, response_url: &str, payload: &Value) -> Result<()> {
        self.api.post_response_url(response_url, payload).await
    }

    /// Resolve whether `user_id` is automated, caching the answer.
    async fn is_bot(&self, user_id: &str) -> Result<bool> {
        if let Some(is_bot) = self.bot_flags.read().await.get(user_id) {
            return Ok(*is_bot);
        }
        let is_bot = self.api.is_bot_user(user_id).await?;
        self.bot_flags
            .write()
            .await
            .insert(user_id.to_owned(), is_bot);
        Ok(is_bot)
    }

    async fn resolve_reactors(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<Vec<User>> {
        let ids = self
            .api
            .reaction_user_ids(channel_id, message_id, emoji)
            .await?;
        let flags = try_join_all(ids.iter().map(|id| self.is_bot(id))).await?;
        debug!(channel_id, message_id, reactors = ids.len(), "resolved reactors");
        Ok(ids
            .into_iter()
            .zip(flags)
            .map(|(id, is_bot)| User { id, is_bot })
            .collect())
    }

    async fn post_message(&self, channel_id: &str, text: &str) -> Result<String> {
        let request =
            SlackMessage::plain(SlackChannelId(channel_id.to_owned()), text).into_request();
        let session = self.http_session();
        let response =
            with_rate_limit_retry("chat.postMessage", || session.chat_post_message(&request))
                .await?;
        Ok(response.ts.0)
    }

    async fn add_marker(&self, channel_id: &str, message_id: &str, emoji: &str) -> Result<()> {
        let request = SlackApiReactionsAddRequest {
            channel: SlackChannelId(channel_id.to_owned()),
            name: SlackReactionName(emoji.to_owned()),
            timestamp: SlackTs(message_id.to_owned()),
        };
        let session = self.http_session();
        match with_rate_limit_retry("reactions.add", || session.reactions_add(&request)).await {
            Ok(_) => Ok(()),
            Err(AppError::Platform(code)) if code == "already_reacted" => Ok(()),
            Err(err) => Err(err),
        }
    }

    async fn remove_message(&self, channel_id: &str, message_id: &str) -> Result<()> {
        let request = SlackApiChatDeleteRequest {
            channel: SlackChannelId(channel_id.to_owned()),
            ts: SlackTs(message_id.to_owned()),
            as_user: None,
        };
        let session = self.http_session();
        with_rate_limit_retry("chat.delete", || session.chat_delete(&request))
            .await
            .map(|_| ())
    }
}

/// Run a slack-morphism call, retrying `RateLimitError` on the [`Backoff`]
/// schedule. API error codes go through [`map_error_code`].
///
/// # Errors
///
/// `AppError::Platform("ratelimited")` once retries are spent, otherwise the
/// mapped Slack error.
async fn with_rate_limit_retry<T, F, Fut>(method: &str, call: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = std::result::Result<T, SlackClientError>>,
{
    let mut backoff = Backoff::default();
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(SlackClientError::RateLimitError(rate)) => {
                let Some(delay) = backoff.next_delay(rate.retry_after) else {
                    warn!(method, retries = backoff.retries(), "slack rate limit persisted");
                    return Err(AppError::Platform("ratelimited".into()));
                };
                warn!(method, delay = ?delay, "slack rate limited; retrying");
                sleep(delay).await;
            }
            Err(SlackClientError::ApiError(api)) => return Err(map_error_code(method, &api.code)),
            Err(err) => return Err(AppError::Slack(format!("{method} failed: {err}"))),
        }
    }
}

impl ChatPlatform for SlackService {
    fn fetch_message<'a>(
        &'a self,
        channel_id: &'a str,
        message_id: &'a str,
    ) -> PlatformFuture<'a, Message> {
        Box::pin(self.api.fetch_message(channel_id, message_id))
    }

    fn pin<'a>(&'a self, channel_id: &'a str, message_id: &'a str) -> PlatformFuture<'a, ()> {
        Box::pin(self.api.pin(channel_id, message_id))
    }

    fn unpin<'a>(&'a self, channel_id: &'a str, message_id: &'a str) -> PlatformFuture<'a, ()> {
        Box::pin(self.api.unpin(channel_id, message_id))
    }

    fn list_pins<'a>(&'a self, channel_id: &'a str) -> PlatformFuture<'a, Vec<Message>> {
        Box::pin(self.api.list_pins(channel_id))
    }

    fn reaction_users<'a>(
        &'a self,
        channel_id: &'a str,
        message_id: &'a str,
        emoji: &'a str,
    ) -> PlatformFuture<'a, Vec<User>> {
        Box::pin(async move {
            self.resolve_reactors(channel_id, message_id, emoji)
                .await
                .map_err(|err| AppError::Enumeration(err.to_string()))
        })
    }

    fn add_reaction<'a>(
        &'a self,
        channel_id: &'a str,
        message_id: &'a str,
        emoji: &'a str,
    ) -> PlatformFuture<'a, ()> {
        Box::pin(self.add_marker(channel_id, message_id, emoji))
    }

    fn send_message<'a>(
        &'a self,
        channel_id: &'a str,
        text: &'a str,
    ) -> PlatformFuture<'a, String> {
        Box::pin(self.post_message(channel_id, text))
    }

    fn delete_message<'a>(
        &'a self,
        channel_id: &'a str,
        message_id: &'a str,
    ) -> PlatformFuture<'a, ()> {
        Box::pin(self.remove_message(channel_id, message_id))
    }
}
