//! Slack Block Kit message builders.
//!
//! Renders pin listings and the bulk-unpin selection controls. Each
//! candidate gets a toggle button whose value carries
//! `{session_id}:{message_id}`; Apply and Cancel carry the session ID.

use serde_json::{json, Value};
use slack_morphism::prelude::{
    SlackActionBlockElement, SlackActionsBlock, SlackBlock, SlackBlockButtonElement, SlackBlockId,
    SlackBlockPlainTextOnly, SlackBlockText, SlackSectionBlock,
};

use crate::models::PinSession;
use crate::pins::PinListing;

/// Action ID prefix for candidate toggle buttons.
pub const TOGGLE_ACTION_PREFIX: &str = "unpin_toggle_";
/// Action ID of the Apply button.
pub const APPLY_ACTION: &str = "unpin_apply";
/// Action ID of the Cancel button.
pub const CANCEL_ACTION: &str = "unpin_cancel";

/// Slack's limit on section text length.
const SECTION_TEXT_LIMIT: usize = 3000;
/// Slack's limit on elements per actions block.
const ACTIONS_PER_BLOCK: usize = 5;
/// Slack's limit on button label length.
const BUTTON_LABEL_LIMIT: usize = 75;

/// Build an actions block with the given buttons.
#[must_use]
pub fn action_buttons(block_id: &str, buttons: &[(&str, &str, &str)]) -> SlackBlock {
    let elements: Vec<SlackActionBlockElement> = buttons
        .iter()
        .map(|(action_id, text, value)| {
            SlackActionBlockElement::Button(
                SlackBlockButtonElement::new(
                    (*action_id).into(),
                    SlackBlockPlainTextOnly::from(*text),
                )
                .with_value((*value).into()),
            )
        })
        .collect();
    SlackBlock::Actions(
        SlackActionsBlock::new(elements).with_block_id(SlackBlockId(block_id.into())),
    )
}

/// Build a plain text section block.
#[must_use]
pub fn text_section(text: &str) -> SlackBlock {
    SlackBlock::Section(SlackSectionBlock::new().with_text(SlackBlockText::MarkDown(text.into())))
}

/// Split `text` into sections that fit Slack's per-section limit,
/// breaking on line boundaries where possible.
#[must_use]
pub fn text_sections(text: &str) -> Vec<SlackBlock> {
    let mut sections = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        let needed = current.chars().count() + line.chars().count() + 1;
        if !current.is_empty() && needed > SECTION_TEXT_LIMIT {
            sections.push(text_section(&current));
            current.clear();
        }
        if !current.is_empty() {
            current.push('\n');
        }
        // A single overlong line is cut; the listing budget keeps this rare.
        current.extend(line.chars().take(SECTION_TEXT_LIMIT));
    }
    if !current.is_empty() {
        sections.push(text_section(&current));
    }
    sections
}

/// Full listing text: title, body, and footer.
#[must_use]
pub fn listing_text(listing: &PinListing) -> String {
    let mut text = format!("*{}*\n{}", listing.title, listing.body);
    if let Some(footer) = &listing.footer {
        text.push_str(&format!("\n\n_{footer}_"));
    }
    text
}

/// Blocks for a listing without selection controls.
#[must_use]
pub fn listing_blocks(listing: &PinListing) -> Vec<SlackBlock> {
    text_sections(&listing_text(listing))
}

/// Blocks for an open bulk-unpin session: the listing followed by one
/// toggle per candidate and the Apply/Cancel row.
#[must_use]
pub fn session_blocks(session: &PinSession) -> Vec<SlackBlock> {
    let mut blocks = text_sections(&session.summary);
    blocks.push(text_section(&format!(
        "Select the pins to remove, then press *Apply*. Selected: {} of {}",
        session.selected.len(),
        session.candidates.len()
    )));

    let toggles: Vec<(String, String, String)> = session
        .candidates
        .iter()
        .enumerate()
        .map(|(index, candidate)| {
            let mark = if session.is_selected(&candidate.id) {
                "\u{2611}"
            } else {
                "\u{2610}"
            };
            (
                format!("{TOGGLE_ACTION_PREFIX}{index}"),
                button_label(&format!("{mark} {}", candidate.content_preview)),
                toggle_value(&session.id, &candidate.id),
            )
        })
        .collect();

    for (chunk_index, chunk) in toggles.chunks(ACTIONS_PER_BLOCK).enumerate() {
        let buttons: Vec<(&str, &str, &str)> = chunk
            .iter()
            .map(|(action_id, label, value)| (action_id.as_str(), label.as_str(), value.as_str()))
            .collect();
        blocks.push(action_buttons(
            &format!("unpin_select_{}_{chunk_index}", session.id),
            &buttons,
        ));
    }

    blocks.push(action_buttons(
        &format!("unpin_controls_{}", session.id),
        &[
            (APPLY_ACTION, "Apply", session.id.as_str()),
            (CANCEL_ACTION, "Cancel", session.id.as_str()),
        ],
    ));
    blocks
}

/// Value carried by a candidate toggle button.
#[must_use]
pub fn toggle_value(session_id: &str, message_id: &str) -> String {
    format!("{session_id}:{message_id}")
}

/// Split a toggle button value into `(session_id, message_id)`.
#[must_use]
pub fn parse_toggle_value(value: &str) -> Option<(&str, &str)> {
    value
        .split_once(':')
        .filter(|(session_id, message_id)| !session_id.is_empty() && !message_id.is_empty())
}

/// Payload replacing the original ephemeral message via `response_url`.
///
/// # Errors
///
/// Returns `AppError::Slack` if the blocks cannot be serialized.
pub fn ephemeral_payload(text: &str, blocks: &[SlackBlock]) -> crate::Result<Value> {
    let blocks = serde_json::to_value(blocks)
        .map_err(|err| crate::AppError::Slack(format!("failed to serialize blocks: {err}")))?;
    Ok(json!({
        "response_type": "ephemeral",
        "replace_original": true,
        "text": text,
        "blocks": blocks,
    }))
}

/// Plain ephemeral replacement without blocks.
#[must_use]
pub fn ephemeral_text(text: &str) -> Value {
    json!({
        "response_type": "ephemeral",
        "replace_original": true,
        "text": text,
    })
}

fn button_label(text: &str) -> String {
    if text.chars().count() <= BUTTON_LABEL_LIMIT {
        return text.to_owned();
    }
    let mut label: String = text.chars().take(BUTTON_LABEL_LIMIT - 3).collect();
    label.push_str("...");
    label
}
