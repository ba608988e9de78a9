//! Reaction-driven pin engine.
//!
//! Data flow: platform event → [`classifier`] → [`reconciler`] (pin/unpin
//! plus [`notifier`]). Independently, a listing command → [`listing`] →
//! [`ownership`] per message → [`sessions`] for bulk unpinning.

pub mod classifier;
pub mod listing;
pub mod notifier;
pub mod ownership;
pub mod reconciler;
pub mod sessions;

pub use classifier::{classify, PinIntent, ReactionEvent, ReactionKind};
pub use listing::{build_listing, ListRequest, ListingSettings, PinListing};
pub use notifier::Notifier;
pub use ownership::is_self_only;
pub use reconciler::{FailureKind, PinReconciler, ReconcileOutcome};
pub use sessions::{ApplyReport, SessionRegistry};
