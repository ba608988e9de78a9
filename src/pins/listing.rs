//! Channel pin listing.
//!
//! Fetches a channel's pins, applies the author and age filters, marks each
//! message as self-only (📌, bulk-unpinnable) or locked (🔒), and renders
//! the summary text within the platform's size budget.

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use super::ownership::evaluate_all;
use crate::config::GlobalConfig;
use crate::models::{Message, MessageRef};
use crate::platform::ChatPlatform;
use crate::Result;

/// Placeholder preview for messages without text (attachments, embeds).
pub const EMPTY_PREVIEW: &str = "[attachment/embed]";

/// Marker appended when the rendered list exceeds its budget.
pub const TRUNCATION_MARKER: &str = "\n... (truncated)";

/// Limits and marker used while building a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingSettings {
    /// Marker reaction name.
    pub marker: String,
    /// Maximum pins considered per channel.
    pub pin_cap: usize,
    /// Maximum selectable candidates per session.
    pub max_selectable: usize,
    /// Character budget for the list body.
    pub text_budget: usize,
    /// Preview length in characters.
    pub preview_chars: usize,
}

impl ListingSettings {
    /// Derive settings from the global configuration.
    #[must_use]
    pub fn from_config(config: &GlobalConfig) -> Self {
        Self {
            marker: config.slack.marker_emoji.clone(),
            pin_cap: config.listing.pin_cap,
            max_selectable: config.listing.max_selectable,
            text_budget: config.listing.text_budget,
            preview_chars: config.listing.preview_chars,
        }
    }
}

impl Default for ListingSettings {
    fn default() -> Self {
        Self::from_config(&GlobalConfig::default())
    }
}

/// Parameters of one listing command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListRequest {
    /// Channel whose pins are listed.
    pub channel_id: String,
    /// User who ran the command; self-only checks are made for them.
    pub requester_id: String,
    /// Only list messages authored by this user.
    pub filter_user: Option<String>,
    /// Only list messages created within this many days. Zero means no limit.
    pub since_days: Option<u32>,
}

impl ListRequest {
    fn age_filter(&self) -> Option<u32> {
        self.since_days.filter(|days| *days > 0)
    }
}

/// Rendered listing plus the messages eligible for bulk unpinning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinListing {
    /// Heading naming whose pins are shown.
    pub title: String,
    /// One line per pin, or the "no pins" text when nothing matched.
    pub body: String,
    /// Count summary; absent when nothing matched.
    pub footer: Option<String>,
    /// Number of pins that passed the filters.
    pub total: usize,
    /// Self-only pins, in listing order (not capped).
    pub eligible: Vec<MessageRef>,
    max_selectable: usize,
}

impl PinListing {
    /// Whether no pins matched the filters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// The candidates a bulk-unpin session may expose.
    #[must_use]
    pub fn selectable(&self) -> &[MessageRef] {
        let end = self.eligible.len().min(self.max_selectable);
        &self.eligible[..end]
    }
}

/// Build the listing for a channel.
///
/// # Errors
///
/// Propagates the platform error when the channel's pins cannot be listed.
pub async fn build_listing(
    platform: &dyn ChatPlatform,
    settings: &ListingSettings,
    request: &ListRequest,
    now: DateTime<Utc>,
) -> Result<PinListing> {
    let mut pins = platform.list_pins(&request.channel_id).await?;
    pins.truncate(settings.pin_cap);
    let pins = filter_pins(pins, request, now);

    let title = match &request.filter_user {
        Some(user) => format!("\u{1f4cc} Pinned messages from <@{user}>"),
        None => "\u{1f4cc} Pinned messages from everyone".to_owned(),
    };

    if pins.is_empty() {
        return Ok(PinListing {
            title,
            body: empty_text(request),
            footer: None,
            total: 0,
            eligible: Vec::new(),
            max_selectable: settings.max_selectable,
        });
    }

    let self_only = evaluate_all(
        platform,
        &settings.marker,
        &pins,
        &request.requester_id,
    )
    .await;

    let mut lines = Vec::with_capacity(pins.len());
    let mut eligible = Vec::new();
    for (message, is_self_only) in pins.iter().zip(self_only) {
        let reference = message_ref(message, settings.preview_chars);
        let link = link_text(&reference);
        if is_self_only {
            lines.push(format!("\u{1f4cc} {link}"));
            eligible.push(reference);
        } else {
            lines.push(format!("\u{1f512} {link} _by <@{}>_", reference.author_id));
        }
    }

    let footer = footer_text(pins.len(), request.age_filter(), eligible.len(), settings);
    info!(
        channel_id = %request.channel_id,
        total = pins.len(),
        eligible = eligible.len(),
        "built pin listing"
    );

    Ok(PinListing {
        title,
        body: truncate_to_budget(&lines.join("\n"), settings.text_budget),
        footer: Some(footer),
        total: pins.len(),
        eligible,
        max_selectable: settings.max_selectable,
    })
}

/// Apply the author and age filters. The age cutoff is inclusive.
#[must_use]
pub fn filter_pins(pins: Vec<Message>, request: &ListRequest, now: DateTime<Utc>) -> Vec<Message> {
    let cutoff = request
        .age_filter()
        .map(|days| now - Duration::days(i64::from(days)));

    pins.into_iter()
        .filter(|m| {
            request
                .filter_user
                .as_ref()
                .is_none_or(|user| &m.author_id == user)
        })
        .filter(|m| cutoff.is_none_or(|cutoff| m.created_at >= cutoff))
        .collect()
}

/// Single-line preview: newlines flattened, first `chars` characters, with
/// an ellipsis when the content is longer.
#[must_use]
pub fn preview(content: &str, chars: usize) -> String {
    let mut text: String = content.replace('\n', " ").chars().take(chars).collect();
    if content.chars().count() > chars {
        text.push_str("...");
    }
    if text.trim().is_empty() {
        return EMPTY_PREVIEW.to_owned();
    }
    text
}

/// Cut `text` to `budget` characters, appending [`TRUNCATION_MARKER`].
#[must_use]
pub fn truncate_to_budget(text: &str, budget: usize) -> String {
    if text.chars().count() <= budget {
        return text.to_owned();
    }
    let mut cut: String = text.chars().take(budget).collect();
    cut.push_str(TRUNCATION_MARKER);
    cut
}

/// Snapshot a message for listing and session use.
#[must_use]
pub fn message_ref(message: &Message, preview_chars: usize) -> MessageRef {
    MessageRef {
        id: message.id.clone(),
        channel_id: message.channel_id.clone(),
        author_id: message.author_id.clone(),
        content_preview: preview(&message.content, preview_chars),
        created_at: message.created_at,
        link: message.link.clone().unwrap_or_default(),
    }
}

/// Escape the characters Slack treats as markup in `mrkdwn` text.
#[must_use]
pub fn escape_mrkdwn(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn link_text(reference: &MessageRef) -> String {
    let label = escape_mrkdwn(&reference.content_preview).replace('|', "\u{ff5c}");
    if reference.link.is_empty() {
        label
    } else {
        format!("<{}|{label}>", reference.link)
    }
}

fn footer_text(
    total: usize,
    since_days: Option<u32>,
    eligible: usize,
    settings: &ListingSettings,
) -> String {
    let mut footer = format!("Total {total}");
    if let Some(days) = since_days {
        footer.push_str(&format!(" (last {days} days)"));
    }
    if eligible > settings.max_selectable {
        footer.push_str(&format!(
            " | \u{1f4cc} yours: {eligible} (only the first {} can be unpinned)",
            settings.max_selectable
        ));
    } else if eligible > 0 {
        footer.push_str(&format!(" | \u{1f4cc} yours: {eligible} (can be unpinned)"));
    } else {
        footer.push_str(" | you have no pins of your own");
    }
    footer
}

fn empty_text(request: &ListRequest) -> String {
    let target = request
        .filter_user
        .as_ref()
        .map(|user| format!(" from <@{user}>"))
        .unwrap_or_default();
    let period = request
        .age_filter()
        .map(|days| format!(" in the last {days} days"))
        .unwrap_or_default();
    format!("\u{1f4cc} No pinned messages{target}{period} in this channel.")
}
