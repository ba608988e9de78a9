//! Global configuration parsing, validation, and credential loading.

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::{AppError, Result};

/// Keychain service name under which Slack tokens are stored.
pub const KEYRING_SERVICE: &str = "pushpin-bot";

/// Nested Slack configuration for Socket Mode connectivity.
///
/// Tokens are loaded at runtime via OS keychain or environment variables,
/// never from the TOML config file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SlackConfig {
    /// Reaction name that marks a message as pinned (without colons).
    #[serde(default = "default_marker_emoji")]
    pub marker_emoji: String,
    /// Slash command that lists pinned messages.
    #[serde(default = "default_list_command")]
    pub list_command: String,
    /// Slash command carrying the `help`, `status` and `test` subcommands.
    #[serde(default = "default_bot_command")]
    pub bot_command: String,
    /// App-level token used for Socket Mode (populated at runtime).
    #[serde(skip)]
    pub app_token: String,
    /// Bot user token used for Web API calls (populated at runtime).
    #[serde(skip)]
    pub bot_token: String,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            marker_emoji: default_marker_emoji(),
            list_command: default_list_command(),
            bot_command: default_bot_command(),
            app_token: String::new(),
            bot_token: String::new(),
        }
    }
}

fn default_marker_emoji() -> String {
    "pushpin".into()
}

fn default_list_command() -> String {
    "/pinnedlist".into()
}

fn default_bot_command() -> String {
    "/pin".into()
}

/// Configurable timeout values (seconds).
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct TimeoutConfig {
    /// Inactivity window after which a bulk-unpin session closes itself.
    #[serde(default = "default_session_seconds")]
    pub session_seconds: u64,
    /// Lifetime of pin/unpin confirmation notices.
    #[serde(default = "default_notice_seconds")]
    pub notice_seconds: u64,
    /// Lifetime of longer informational notices.
    #[serde(default = "default_long_notice_seconds")]
    pub long_notice_seconds: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            session_seconds: default_session_seconds(),
            notice_seconds: default_notice_seconds(),
            long_notice_seconds: default_long_notice_seconds(),
        }
    }
}

impl TimeoutConfig {
    /// Session inactivity window as a [`Duration`].
    #[must_use]
    pub fn session(&self) -> Duration {
        Duration::from_secs(self.session_seconds)
    }

    /// Confirmation notice lifetime as a [`Duration`].
    #[must_use]
    pub fn notice(&self) -> Duration {
        Duration::from_secs(self.notice_seconds)
    }

    /// Informational notice lifetime as a [`Duration`].
    #[must_use]
    pub fn long_notice(&self) -> Duration {
        Duration::from_secs(self.long_notice_seconds)
    }
}

fn default_session_seconds() -> u64 {
    180
}

fn default_notice_seconds() -> u64 {
    5
}

fn default_long_notice_seconds() -> u64 {
    10
}

/// Limits applied when rendering a channel's pin list.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ListingConfig {
    /// Maximum pins considered per channel.
    #[serde(default = "default_pin_cap")]
    pub pin_cap: usize,
    /// Maximum candidates exposed in a bulk-unpin session.
    #[serde(default = "default_max_selectable")]
    pub max_selectable: usize,
    /// Character budget for the rendered list body.
    #[serde(default = "default_text_budget")]
    pub text_budget: usize,
    /// Characters of message content shown per line.
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            pin_cap: default_pin_cap(),
            max_selectable: default_max_selectable(),
            text_budget: default_text_budget(),
            preview_chars: default_preview_chars(),
        }
    }
}

fn default_pin_cap() -> usize {
    50
}

fn default_max_selectable() -> usize {
    25
}

fn default_text_budget() -> usize {
    4000
}

fn default_preview_chars() -> usize {
    10
}

fn default_http_port() -> u16 {
    8080
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Port for the health-check HTTP endpoint.
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// Slack connectivity settings.
    #[serde(default)]
    pub slack: SlackConfig,
    /// Session and notice timeouts.
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    /// Pin listing limits.
    #[serde(default)]
    pub listing: ListingConfig,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            http_port: default_http_port(),
            slack: SlackConfig::default(),
            timeouts: TimeoutConfig::default(),
            listing: ListingConfig::default(),
        }
    }
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load Slack credentials from OS keychain with env-var fallback.
    ///
    /// Tries the `pushpin-bot` keyring service first, then falls back to
    /// `SLACK_APP_TOKEN` / `SLACK_BOT_TOKEN` environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if neither keychain nor env vars provide
    /// the required tokens.
    pub async fn load_credentials(&mut self) -> Result<()> {
        self.slack.app_token = load_credential("slack_app_token", "SLACK_APP_TOKEN").await?;
        self.slack.bot_token = load_credential("slack_bot_token", "SLACK_BOT_TOKEN").await?;
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        let marker = self.slack.marker_emoji.trim().trim_matches(':').to_owned();
        if marker.is_empty() {
            return Err(AppError::Config("slack.marker_emoji must not be empty".into()));
        }
        self.slack.marker_emoji = marker;

        for (name, command) in [
            ("list_command", &self.slack.list_command),
            ("bot_command", &self.slack.bot_command),
        ] {
            if !command.starts_with('/') || command.len() < 2 {
                return Err(AppError::Config(format!(
                    "slack.{name} must be a slash command, got {command:?}"
                )));
            }
        }

        if self.timeouts.session_seconds == 0 {
            return Err(AppError::Config(
                "timeouts.session_seconds must be greater than zero".into(),
            ));
        }

        if self.listing.max_selectable == 0 || self.listing.max_selectable > 25 {
            return Err(AppError::Config(
                "listing.max_selectable must be between 1 and 25".into(),
            ));
        }

        if self.listing.pin_cap == 0 {
            return Err(AppError::Config(
                "listing.pin_cap must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}

/// Load a single credential from OS keychain with env-var fallback.
async fn load_credential(keyring_key: &str, env_key: &str) -> Result<String> {
    let key = keyring_key.to_owned();

    // keyring is synchronous I/O.
    let keychain_result = tokio::task::spawn_blocking(move || {
        keyring::Entry::new(KEYRING_SERVICE, &key).and_then(|entry| entry.get_password())
    })
    .await
    .map_err(|err| AppError::Config(format!("keychain task panicked: {err}")))?;

    match keychain_result {
        Ok(value) if !value.is_empty() => return Ok(value),
        Ok(_) => {
            warn!(key = keyring_key, "keychain entry is empty, trying env var");
        }
        Err(err) => {
            warn!(
                key = keyring_key,
                ?err,
                "keychain lookup failed, trying env var"
            );
        }
    }

    match env::var(env_key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(AppError::Config(format!(
            "credential {keyring_key} not found in keychain or {env_key} env var"
        ))),
    }
}
