//! Slack slash command router.
//!
//! Two commands are registered: the listing command (`/pinnedlist` by
//! default) and the bot command (`/pin help|status|test`). Slack expects an
//! acknowledgement within three seconds, so anything that calls the Web API
//! runs on a spawned task and answers through the command's `response_url`.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use slack_morphism::prelude::{
    SlackClient, SlackClientEventsUserState, SlackClientHyperHttpsConnector, SlackCommandEvent,
    SlackCommandEventResponse, SlackMessageContent, SlackMessageResponseType,
};
use tracing::{info, warn};

use crate::config::GlobalConfig;
use crate::pins::ListRequest;
use crate::slack::handlers;
use crate::state::AppState;

static USER_MENTION: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(?:user:)?<@([UW][A-Z0-9]+)(?:\|[^>]*)?>$").ok());

/// Arguments of the listing command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListArgs {
    /// Only list pins authored by this user.
    pub user: Option<String>,
    /// Only list pins from the last N days.
    pub days: Option<u32>,
}

impl ListArgs {
    /// Turn the arguments into a listing request.
    #[must_use]
    pub fn into_request(self, channel_id: &str, requester_id: &str) -> ListRequest {
        ListRequest {
            channel_id: channel_id.to_owned(),
            requester_id: requester_id.to_owned(),
            filter_user: self.user,
            since_days: self.days,
        }
    }
}

/// Subcommands of the bot command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    /// Usage text.
    Help,
    /// Bot user, channel pin count, uptime.
    Status,
    /// Post a message carrying the marker reaction.
    Test,
    /// Anything else.
    Unknown(String),
}

/// Parse `[@user] [days]` in any order. `user:` and `days:` prefixes are
/// accepted too.
///
/// # Errors
///
/// Returns a user-facing message for unrecognized or repeated arguments.
pub fn parse_list_args(text: &str) -> std::result::Result<ListArgs, String> {
    let mut args = ListArgs::default();

    for token in text.split_whitespace() {
        if let Some(user) = mention_user_id(token) {
            if args.user.replace(user).is_some() {
                return Err("Only one user can be given.".into());
            }
            continue;
        }

        let digits = token.strip_prefix("days:").unwrap_or(token);
        match digits.parse::<u32>() {
            Ok(days) => {
                if args.days.replace(days).is_some() {
                    return Err("Only one day count can be given.".into());
                }
            }
            Err(_) if token.trim_start_matches("user:").starts_with('@') => {
                return Err(format!(
                    "`{token}` arrived as plain text, not a user mention. Pick the user \
                     from the autocomplete list, or enable *Escape channels, users, and \
                     links sent to your app* on this slash command in the Slack app \
                     settings."
                ));
            }
            Err(_) => {
                return Err(format!(
                    "Unrecognized argument `{token}`. Usage: `[@user] [days]`"
                ));
            }
        }
    }

    Ok(args)
}

/// Extract the user ID from a `<@U123>` or `<@U123|name>` mention.
#[must_use]
pub fn mention_user_id(token: &str) -> Option<String> {
    USER_MENTION
        .as_ref()?
        .captures(token)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
}

/// Parse the bot command's text.
#[must_use]
pub fn parse_bot_command(text: &str) -> BotCommand {
    match text.trim().to_lowercase().as_str() {
        "" | "help" => BotCommand::Help,
        "status" => BotCommand::Status,
        "test" => BotCommand::Test,
        other => BotCommand::Unknown(other.to_owned()),
    }
}

/// Usage text for the bot command.
#[must_use]
pub fn help_text(config: &GlobalConfig) -> String {
    let marker = &config.slack.marker_emoji;
    let list = &config.slack.list_command;
    let bot = &config.slack.bot_command;
    let pin_cap = config.listing.pin_cap;
    let max_selectable = config.listing.max_selectable;
    format!(
        "\u{1f4cc} *How to use the pin bot*\n\
         \n\
         React with :{marker}: to pin a message. The message stays pinned while \
         anyone still holds the :{marker}: reaction; it is unpinned when the last \
         person removes theirs.\n\
         \n\
         *Commands*\n\
         \u{2022} `{list}` lists everyone's pinned messages\n\
         \u{2022} `{list} @user` lists pins authored by that user (the command \
         needs *Escape channels, users, and links* enabled in the Slack app)\n\
         \u{2022} `{list} 7` lists pins from the last 7 days\n\
         \n\
         *Bulk unpin*\n\
         Pins only you are holding (\u{1f4cc}) can be selected and removed together. \
         Pins someone else also holds (\u{1f512}) cannot.\n\
         \n\
         *Limits*\n\
         \u{2022} The bot needs permission to pin in the channel\n\
         \u{2022} Up to {pin_cap} pins are listed per channel\n\
         \u{2022} Up to {max_selectable} pins can be selected at once\n\
         \n\
         *Diagnostics*\n\
         \u{2022} `{bot} test` posts a message to try pinning on\n\
         \u{2022} `{bot} status` shows the bot's state"
    )
}

/// Status text for the bot command.
#[must_use]
pub fn status_text(bot_user_id: &str, pin_count: usize, pin_cap: usize, uptime: Duration) -> String {
    format!(
        "*Bot status*\n\
         \u{2022} Bot user: <@{bot_user_id}>\n\
         \u{2022} Pins in this channel: {pin_count}/{pin_cap}\n\
         \u{2022} Uptime: {}",
        format_uptime(uptime)
    )
}

/// Render an uptime such as `2d 3h 4m` or `5m 6s`.
#[must_use]
pub fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    let (days, hours, minutes, seconds) =
        (secs / 86_400, secs / 3_600 % 24, secs / 60 % 60, secs % 60);
    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m {seconds}s")
    }
}

fn ephemeral(text: impl Into<String>) -> SlackCommandEventResponse {
    SlackCommandEventResponse {
        content: SlackMessageContent {
            text: Some(text.into()),
            blocks: None,
            attachments: None,
            upload: None,
            files: None,
            reactions: None,
            metadata: None,
        },
        response_type: Some(SlackMessageResponseType::Ephemeral),
    }
}

/// Handle incoming slash commands routed via Socket Mode.
///
/// # Errors
///
/// Returns an error if the command response cannot be constructed.
pub async fn handle_command(
    event: SlackCommandEvent,
    _client: Arc<SlackClient<SlackClientHyperHttpsConnector>>,
    state: SlackClientEventsUserState,
) -> slack_morphism::AnyStdResult<SlackCommandEventResponse> {
    let command = event.command.0.clone();
    let user_id = event.user_id.0.clone();
    let channel_id = event.channel_id.0.clone();
    let text = event.text.clone().unwrap_or_default();
    let response_url = event.response_url.0.to_string();
    info!(%command, %user_id, %channel_id, "received slash command");

    let app_state: Option<Arc<AppState>> = {
        let guard = state.read().await;
        guard.get_user_state::<Arc<AppState>>().cloned()
    };
    let Some(app) = app_state else {
        warn!("app state not available; cannot process command");
        return Ok(ephemeral("\u{274c} The bot is still starting. Try again shortly."));
    };

    if command == app.config.slack.list_command {
        let args = match parse_list_args(&text) {
            Ok(args) => args,
            Err(message) => return Ok(ephemeral(format!("\u{274c} {message}"))),
        };
        let request = args.into_request(&channel_id, &user_id);
        tokio::spawn(async move {
            handlers::listing::run_listing(&app, request, &response_url).await;
        });
        return Ok(ephemeral("\u{23f3} Collecting pinned messages\u{2026}"));
    }

    if command == app.config.slack.bot_command {
        return Ok(match parse_bot_command(&text) {
            BotCommand::Help => ephemeral(help_text(&app.config)),
            BotCommand::Status => {
                tokio::spawn(async move {
                    handlers::bot::run_status(&app, &channel_id, &response_url).await;
                });
                ephemeral("\u{23f3} Checking status\u{2026}")
            }
            BotCommand::Test => {
                tokio::spawn(async move {
                    handlers::bot::run_test(&app, &channel_id).await;
                });
                ephemeral("\u{1f4cc} Posting a test message\u{2026}")
            }
            BotCommand::Unknown(sub) => ephemeral(format!(
                "Unknown subcommand `{sub}`. Try `{} help`.",
                app.config.slack.bot_command
            )),
        });
    }

    warn!(%command, "unrouted slash command");
    Ok(ephemeral(format!("Unknown command `{command}`.")))
}
