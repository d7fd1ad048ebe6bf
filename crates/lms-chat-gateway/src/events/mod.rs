//! Hub events
//!
//! Defines all dispatch events sent by the hub to clients.

mod event_types;
mod payloads;

pub use event_types::HubEventType;
pub use payloads::{ChatMessage, HubEvent, PresenceStatus, TypingIndicator};
