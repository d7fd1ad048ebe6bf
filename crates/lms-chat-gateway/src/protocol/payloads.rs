//! Client payload definitions
//!
//! Defines the payload structures carried in the `d` field of non-dispatch messages.

use lms_chat_core::RoomId;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Longest chat message accepted, in characters
pub const MAX_MESSAGE_LENGTH: usize = 4000;

/// Payload for op 10 (Hello)
///
/// Sent by the server immediately after connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloPayload {
    /// Heartbeat interval in milliseconds
    pub heartbeat_interval: u64,
}

impl HelloPayload {
    /// Create a Hello payload advertising the given interval
    #[must_use]
    pub fn with_interval(heartbeat_interval: u64) -> Self {
        Self { heartbeat_interval }
    }
}

/// Payload for ops 2, 3, 5 and 6 (JoinChat, LeaveChat, Typing, StopTyping)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RoomPayload {
    pub chat_id: RoomId,
}

/// Payload for op 4 (SendMessage)
///
/// The sender is always the connection's own identity; clients cannot name one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "PascalCase")]
pub struct SendMessagePayload {
    pub chat_id: RoomId,

    #[validate(length(min = 1, max = 4000, message = "Message must be 1-4000 characters"))]
    pub message: String,
}

impl SendMessagePayload {
    /// Whether the message has any visible content
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.message.trim().is_empty()
    }
}
