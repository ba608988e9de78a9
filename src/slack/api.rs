//! Thin Slack Web API client for the pin, reaction, and history methods.
//!
//! Read methods go out as `GET` with query parameters; write methods as
//! `POST` with a JSON body. Slack reports failures in-band as
//! `{"ok": false, "error": "<code>"}`; [`map_error_code`] folds those codes
//! into [`AppError`] variants. HTTP `429` replies are retried on the
//! [`Backoff`] schedule before surfacing as `ratelimited`.

use chrono::{DateTime, Utc};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::models::{Message, Reaction};
use crate::slack::retry::{retry_after, Backoff};
use crate::{AppError, Result};

/// Default Slack Web API base URL.
pub const SLACK_API_BASE: &str = "https://slack.com/api";

/// Slack user ID of the built-in Slackbot, which is automated but not
/// flagged `is_bot`.
pub const SLACKBOT_USER_ID: &str = "USLACKBOT";

/// Map a Slack Web API error code onto the application error taxonomy.
#[must_use]
pub fn map_error_code(method: &str, code: &str) -> AppError {
    match code {
        "message_not_found" | "channel_not_found" | "thread_not_found" | "file_not_found"
        | "is_archived" => AppError::NotFound(format!("{method}: {code}")),
        "not_in_channel"
        | "permission_denied"
        | "restricted_action"
        | "missing_scope"
        | "cant_delete_message"
        | "not_allowed_token_type"
        | "ekm_access_denied" => AppError::Forbidden(format!("{method}: {code}")),
        "too_many_pins" => AppError::PinLimit(format!("{method}: {code}")),
        _ => AppError::Platform(code.to_owned()),
    }
}

/// Parse a Slack message `ts` (`"1712345678.123456"`) into a timestamp.
#[must_use]
pub fn parse_ts(ts: &str) -> DateTime<Utc> {
    let (secs, frac) = ts.split_once('.').unwrap_or((ts, "0"));
    let secs = secs.parse::<i64>().unwrap_or_default();
    let micros = format!("{frac:0<6}")
        .get(..6)
        .and_then(|digits| digits.parse::<u32>().ok())
        .unwrap_or_default();
    DateTime::from_timestamp(secs, micros * 1_000).unwrap_or_default()
}

/// Reaction as serialized by Slack.
#[derive(Debug, Clone, Deserialize)]
pub struct WireReaction {
    /// Reaction name.
    pub name: String,
    /// Total count.
    #[serde(default)]
    pub count: u32,
    /// Reacting user IDs (possibly truncated unless `full=true`).
    #[serde(default)]
    pub users: Vec<String>,
}

/// Message as serialized by Slack history, pins, and reactions methods.
#[derive(Debug, Clone, Deserialize)]
pub struct WireMessage {
    /// Message timestamp / identifier.
    pub ts: String,
    /// Author user ID.
    #[serde(default)]
    pub user: Option<String>,
    /// Bot ID for integration posts.
    #[serde(default)]
    pub bot_id: Option<String>,
    /// Message text.
    #[serde(default)]
    pub text: String,
    /// Aggregate reactions.
    #[serde(default)]
    pub reactions: Vec<WireReaction>,
    /// Channels the message is pinned to.
    #[serde(default)]
    pub pinned_to: Vec<String>,
    /// Permalink (present on `pins.list` items).
    #[serde(default)]
    pub permalink: Option<String>,
}

impl WireMessage {
    /// Convert into the platform-neutral [`Message`] for `channel_id`.
    #[must_use]
    pub fn into_message(self, channel_id: &str) -> Message {
        let pinned = self.pinned_to.iter().any(|c| c == channel_id);
        Message {
            created_at: parse_ts(&self.ts),
            id: self.ts,
            channel_id: channel_id.to_owned(),
            author_id: self.user.or(self.bot_id).unwrap_or_default(),
            content: self.text,
            pinned,
            reactions: self
                .reactions
                .into_iter()
                .map(|r| Reaction {
                    emoji: r.name,
                    count: r.count,
                })
                .collect(),
            link: self.permalink,
        }
    }
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    messages: Vec<WireMessage>,
}

#[derive(Debug, Deserialize)]
struct PinItem {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    message: Option<WireMessage>,
}

#[derive(Debug, Deserialize)]
struct PinsListResponse {
    #[serde(default)]
    items: Vec<PinItem>,
}

#[derive(Debug, Deserialize)]
struct ReactionsGetResponse {
    message: Option<WireMessage>,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    id: String,
    #[serde(default)]
    is_bot: bool,
}

#[derive(Debug, Deserialize)]
struct UsersInfoResponse {
    user: UserInfo,
}

/// Identity returned by `auth.test`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthIdentity {
    /// Bot user ID.
    pub user_id: String,
    /// Bot user name.
    #[serde(default)]
    pub user: String,
    /// Workspace ID.
    #[serde(default)]
    pub team_id: String,
}

/// Minimal Slack Web API client over `reqwest`.
#[derive(Clone)]
pub struct SlackWebApi {
    http: reqwest::Client,
    token: String,
    base_url: String,
}

impl SlackWebApi {
    /// Create a client for the public Slack API.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(token, SLACK_API_BASE)
    }

    /// Create a client against a different base URL (used by tests).
    #[must_use]
    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            token: token.into(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    /// `auth.test`: identify the bot user.
    ///
    /// # Errors
    ///
    /// Returns the mapped Slack error.
    pub async fn auth_test(&self) -> Result<AuthIdentity> {
        self.post("auth.test", &json!({})).await
    }

    /// Fetch one message by `ts`, falling back to thread replies.
    ///
    /// # Errors
    ///
    /// [`AppError::NotFound`] when the message no longer exists.
    pub async fn fetch_message(&self, channel_id: &str, ts: &str) -> Result<Message> {
        let history: HistoryResponse = self
            .get(
                "conversations.history",
                &[
                    ("channel", channel_id),
                    ("latest", ts),
                    ("inclusive", "true"),
                    ("limit", "1"),
                ],
            )
            .await?;
        if let Some(found) = history.messages.into_iter().find(|m| m.ts == ts) {
            return Ok(found.into_message(channel_id));
        }

        // Thread replies are not part of channel history. Slack puts the
        // thread parent first, so the window must hold two entries.
        let replies: HistoryResponse = self
            .get(
                "conversations.replies",
                &[
                    ("channel", channel_id),
                    ("ts", ts),
                    ("oldest", ts),
                    ("latest", ts),
                    ("inclusive", "true"),
                    ("limit", "2"),
                ],
            )
            .await?;
        replies
            .messages
            .into_iter()
            .find(|m| m.ts == ts)
            .map(|m| m.into_message(channel_id))
            .ok_or_else(|| AppError::NotFound(format!("message {ts} in {channel_id}")))
    }

    /// `pins.list`: pinned messages of a channel. File pins are skipped.
    ///
    /// # Errors
    ///
    /// Returns the mapped Slack error.
    pub async fn list_pins(&self, channel_id: &str) -> Result<Vec<Message>> {
        let response: PinsListResponse = self.get("pins.list", &[("channel", channel_id)]).await?;
        Ok(response
            .items
            .into_iter()
            .filter(|item| item.kind == "message")
            .filter_map(|item| item.message)
            .map(|wire| {
                let mut message = wire.into_message(channel_id);
                message.pinned = true;
                message
            })
            .collect())
    }

    /// `pins.add`. An `already_pinned` reply counts as success.
    ///
    /// # Errors
    ///
    /// Returns the mapped Slack error.
    pub async fn pin(&self, channel_id: &str, ts: &str) -> Result<()> {
        match self
            .post::<Value>("pins.add", &json!({ "channel": channel_id, "timestamp": ts }))
            .await
        {
            Ok(_) => Ok(()),
            Err(AppError::Platform(code)) if code == "already_pinned" => {
                debug!(channel_id, ts, "message was already pinned");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// `pins.remove`. A `no_pin` reply counts as success.
    ///
    /// # Errors
    ///
    /// Returns the mapped Slack error.
    pub async fn unpin(&self, channel_id: &str, ts: &str) -> Result<()> {
        match self
            .post::<Value>("pins.remove", &json!({ "channel": channel_id, "timestamp": ts }))
            .await
        {
            Ok(_) => Ok(()),
            Err(AppError::Platform(code)) if code == "no_pin" => {
                debug!(channel_id, ts, "message was already unpinned");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// `reactions.get` with `full=true`: user IDs holding `name`.
    ///
    /// # Errors
    ///
    /// Returns the mapped Slack error.
    pub async fn reaction_user_ids(&self, channel_id: &str, ts: &str, name: &str) -> Result<Vec<String>> {
        let response: ReactionsGetResponse = self
            .get(
                "reactions.get",
                &[("channel", channel_id), ("timestamp", ts), ("full", "true")],
            )
            .await?;
        Ok(response
            .message
            .into_iter()
            .flat_map(|m| m.reactions)
            .filter(|r| r.name == name)
            .flat_map(|r| r.users)
            .collect())
    }

    /// `users.info`: whether the account is automated.
    ///
    /// # Errors
    ///
    /// Returns the mapped Slack error.
    pub async fn is_bot_user(&self, user_id: &str) -> Result<bool> {
        if user_id == SLACKBOT_USER_ID {
            return Ok(true);
        }
        let response: UsersInfoResponse = self.get("users.info", &[("user", user_id)]).await?;
        debug!(user_id = %response.user.id, is_bot = response.user.is_bot, "resolved user");
        Ok(response.user.is_bot)
    }

    /// Post a payload to an interaction or slash-command `response_url`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Slack` on transport failure or a non-success status.
    pub async fn post_response_url(&self, response_url: &str, payload: &Value) -> Result<()> {
        let response = self.http.post(response_url).json(payload).send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(AppError::Slack(format!(
                "response_url returned {}",
                response.status()
            )))
        }
    }

    async fn get<T: DeserializeOwned>(&self, method: &str, params: &[(&str, &str)]) -> Result<T> {
        let url = Url::parse_with_params(&format!("{}/{method}", self.base_url), params)
            .map_err(|err| AppError::Slack(format!("invalid url for {method}: {err}")))?;
        self.send(method, || self.http.get(url.clone())).await
    }

    async fn post<T: DeserializeOwned>(&self, method: &str, body: &Value) -> Result<T> {
        let url = format!("{}/{method}", self.base_url);
        self.send(method, || self.http.post(&url).json(body)).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: &str,
        request: impl Fn() -> reqwest::RequestBuilder,
    ) -> Result<T> {
        let mut backoff = Backoff::default();
        loop {
            let response = request().bearer_auth(&self.token).send().await?;
            if response.status() != StatusCode::TOO_MANY_REQUESTS {
                return Self::decode(method, response).await;
            }
            let Some(delay) = backoff.next_delay(retry_after(response.headers())) else {
                warn!(method, retries = backoff.retries(), "slack rate limit persisted");
                return Err(AppError::Platform("ratelimited".into()));
            };
            warn!(method, delay = ?delay, "slack rate limited; retrying");
            sleep(delay).await;
        }
    }

    async fn decode<T: DeserializeOwned>(method: &str, response: reqwest::Response) -> Result<T> {
        let body: Value = response.json().await?;
        if body.get("ok").and_then(Value::as_bool) != Some(true) {
            let code = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown_error");
            return Err(map_error_code(method, code));
        }
        serde_json::from_value(body)
            .map_err(|err| AppError::Slack(format!("unexpected {method} response: {err}")))
    }
}
