//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// Slack Socket Mode or transport failure.
    Slack(String),
    /// Message or channel no longer exists.
    NotFound(String),
    /// The bot lacks permission for the requested action.
    Forbidden(String),
    /// The channel already holds the maximum number of pins.
    PinLimit(String),
    /// Any other platform-reported failure, carrying the platform error code.
    Platform(String),
    /// Listing the users behind a reaction failed.
    Enumeration(String),
    /// Caller is not authorized to perform the requested action.
    Unauthorized(String),
    /// Interactive session is closed, timed out, or unknown.
    Expired(String),
    /// File-system or I/O operation failure.
    Io(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Slack(msg) => write!(f, "slack: {msg}"),
            Self::NotFound(msg) => write!(f, "not found: {msg}"),
            Self::Forbidden(msg) => write!(f, "forbidden: {msg}"),
            Self::PinLimit(msg) => write!(f, "pin limit: {msg}"),
            Self::Platform(msg) => write!(f, "platform: {msg}"),
            Self::Enumeration(msg) => write!(f, "enumeration: {msg}"),
            Self::Unauthorized(msg) => write!(f, "unauthorized: {msg}"),
            Self::Expired(msg) => write!(f, "expired: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        Self::Slack(format!("http request failed: {err}"))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
