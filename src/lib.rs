#![forbid(unsafe_code)]

//! `pushpin-bot`: reaction-driven message pinning for Slack.
//!
//! A message stays pinned while at least one human holds the marker
//! reaction on it. A listing command shows a channel's pins and lets users
//! bulk-unpin the ones only they are holding.

pub mod config;
pub mod errors;
pub mod health;
pub mod models;
pub mod pins;
pub mod platform;
pub mod slack;
pub mod state;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
pub use state::AppState;
