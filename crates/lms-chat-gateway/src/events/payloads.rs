//! Event payload definitions
//!
//! Field names are PascalCase on the wire (`ChatId`, `UserId`, ...), which is
//! what the classroom web client binds against.

use super::HubEventType;
use chrono::{DateTime, Utc};
use lms_chat_core::{ConnectionId, RoomId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// UserTyping event payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TypingIndicator {
    pub chat_id: RoomId,
    pub user_id: UserId,
    pub is_typing: bool,
}

impl TypingIndicator {
    #[must_use]
    pub fn started(chat_id: RoomId, user_id: UserId) -> Self {
        Self {
            chat_id,
            user_id,
            is_typing: true,
        }
    }

    #[must_use]
    pub fn stopped(chat_id: RoomId, user_id: UserId) -> Self {
        Self {
            chat_id,
            user_id,
            is_typing: false,
        }
    }
}

/// ReceiveMessage event payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChatMessage {
    pub chat_id: RoomId,
    pub message: String,
    pub sender_id: UserId,
    /// Assigned by the hub at send time
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Stamp a new message with the current UTC time
    #[must_use]
    pub fn now(chat_id: RoomId, message: String, sender_id: UserId) -> Self {
        Self {
            chat_id,
            message,
            sender_id,
            timestamp: Utc::now(),
        }
    }
}

/// Presence snapshot for a single user, served over HTTP
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PresenceStatus {
    pub user_id: UserId,
    pub is_online: bool,
    pub is_typing: bool,
    /// Room the user is typing in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<RoomId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<ConnectionId>,
}

/// An event the hub fans out through the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubEvent {
    UserOnline(UserId),
    UserOffline(UserId),
    Typing(TypingIndicator),
    Message(ChatMessage),
}

impl HubEvent {
    /// Event name placed in the dispatch `t` field
    #[must_use]
    pub fn event_type(&self) -> HubEventType {
        match self {
            Self::UserOnline(_) => HubEventType::UserOnline,
            Self::UserOffline(_) => HubEventType::UserOffline,
            Self::Typing(_) => HubEventType::UserTyping,
            Self::Message(_) => HubEventType::ReceiveMessage,
        }
    }

    /// Render the dispatch `d` payload
    ///
    /// Presence events carry the bare user id string.
    pub fn to_data(&self) -> Result<Value, serde_json::Error> {
        match self {
            Self::UserOnline(user_id) | Self::UserOffline(user_id) => serde_json::to_value(user_id),
            Self::Typing(typing) => serde_json::to_value(typing),
            Self::Message(message) => serde_json::to_value(message),
        }
    }
}
