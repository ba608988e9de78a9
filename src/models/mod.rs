//! Domain models shared by the pin engine and the Slack adapter.

pub mod message;
pub mod session;

pub use message::{Message, MessageRef, Reaction, User};
pub use session::{PinSession, SessionStatus};
