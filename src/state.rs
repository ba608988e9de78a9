//! Shared application state handed to every Slack callback.

use std::sync::Arc;
use std::time::Instant;

use crate::config::GlobalConfig;
use crate::pins::{ListingSettings, Notifier, PinReconciler, SessionRegistry};
use crate::platform::ChatPlatform;
use crate::slack::client::SlackService;

/// Process-wide state injected into the Socket Mode listener.
pub struct AppState {
    /// Global configuration.
    pub config: Arc<GlobalConfig>,
    /// Platform capabilities used by the pin engine.
    pub platform: Arc<dyn ChatPlatform>,
    /// Concrete Slack client (absent in tests).
    pub slack: Option<Arc<SlackService>>,
    /// Reaction-driven pin reconciler.
    pub reconciler: PinReconciler,
    /// Short-lived channel notices.
    pub notifier: Notifier,
    /// Open bulk-unpin sessions.
    pub sessions: SessionRegistry,
    /// The bot's own user ID; its reactions are ignored.
    pub bot_user_id: String,
    /// Process start, for uptime reporting.
    pub started_at: Instant,
}

impl AppState {
    /// Wire the pin engine around `platform`.
    #[must_use]
    pub fn new(
        config: Arc<GlobalConfig>,
        platform: Arc<dyn ChatPlatform>,
        slack: Option<Arc<SlackService>>,
        bot_user_id: impl Into<String>,
    ) -> Self {
        let notifier = Notifier::new(Arc::clone(&platform), config.timeouts.notice());
        let reconciler = PinReconciler::new(
            Arc::clone(&platform),
            notifier.clone(),
            config.slack.marker_emoji.clone(),
        );
        let sessions = SessionRegistry::new(config.timeouts.session());

        Self {
            config,
            platform,
            slack,
            reconciler,
            notifier,
            sessions,
            bot_user_id: bot_user_id.into(),
            started_at: Instant::now(),
        }
    }

    /// Listing limits derived from the configuration.
    #[must_use]
    pub fn listing_settings(&self) -> ListingSettings {
        ListingSettings::from_config(&self.config)
    }
}
