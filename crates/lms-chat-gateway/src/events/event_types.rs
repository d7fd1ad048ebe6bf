//! Hub event types
//!
//! Defines all event names for dispatch messages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Hub event types
///
/// These are the event names sent in the `t` field of dispatch messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HubEventType {
    // Presence events
    /// A tracked user connected
    UserOnline,
    /// A tracked user disconnected
    UserOffline,

    // Room events
    /// Typing indicator changed in a room
    UserTyping,
    /// New chat message in a room
    ReceiveMessage,
}

impl HubEventType {
    /// Get the string representation of the event type
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UserOnline => "UserOnline",
            Self::UserOffline => "UserOffline",
            Self::UserTyping => "UserTyping",
            Self::ReceiveMessage => "ReceiveMessage",
        }
    }
}

impl fmt::Display for HubEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<HubEventType> for String {
    fn from(event: HubEventType) -> Self {
        event.as_str().to_string()
    }
}
