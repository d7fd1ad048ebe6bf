//! Presence and typing tracker
//!
//! Records which user is online on which connection and which room each user
//! is typing in, and fans presence, typing and chat events out through the
//! transport. One instance is built per process and shared via `Arc`.
//!
//! The two maps are updated independently, with no lock spanning both.

use super::HubTransport;
use crate::events::{ChatMessage, HubEvent, PresenceStatus, TypingIndicator};
use dashmap::DashMap;
use lms_chat_core::{ConnectionId, RoomId, UserId};
use std::sync::Arc;

/// Tracks online sessions and typing state for connected users
pub struct PresenceTracker {
    /// User ID to its most recent connection (last write wins)
    sessions: DashMap<UserId, ConnectionId>,

    /// User ID to the room they are typing in
    typing: DashMap<UserId, RoomId>,

    transport: Arc<dyn HubTransport>,
}

impl PresenceTracker {
    /// Create a tracker over a transport
    pub fn new(transport: Arc<dyn HubTransport>) -> Self {
        Self {
            sessions: DashMap::new(),
            typing: DashMap::new(),
            transport,
        }
    }

    /// Create a tracker wrapped in Arc
    pub fn new_shared(transport: Arc<dyn HubTransport>) -> Arc<Self> {
        Arc::new(Self::new(transport))
    }

    /// Record a connected user and announce them to everyone
    ///
    /// Anonymous connections are not tracked; returns whether a session was recorded.
    pub async fn on_connect(&self, user_id: Option<&UserId>, connection: &ConnectionId) -> bool {
        let Some(user_id) = user_id else {
            tracing::debug!(connection_id = %connection, "Anonymous connection, presence not tracked");
            return false;
        };

        if let Some(previous) = self.sessions.insert(user_id.clone(), connection.clone()) {
            tracing::debug!(
                user_id = %user_id,
                previous = %previous,
                connection_id = %connection,
                "Session replaced by newer connection"
            );
        }

        let sent = self
            .transport
            .send_to_all(&HubEvent::UserOnline(user_id.clone()))
            .await;

        tracing::info!(user_id = %user_id, connection_id = %connection, sent = sent, "User online");

        true
    }

    /// Forget a user's session and typing state and announce them offline
    ///
    /// Safe to call for users that were never connected.
    pub async fn on_disconnect(&self, user_id: Option<&UserId>) {
        let Some(user_id) = user_id else {
            return;
        };

        // Typing goes first so an offline user is never seen typing
        self.typing.remove(user_id);
        let removed = self.sessions.remove(user_id);

        let sent = self
            .transport
            .send_to_all(&HubEvent::UserOffline(user_id.clone()))
            .await;

        tracing::info!(
            user_id = %user_id,
            had_session = removed.is_some(),
            sent = sent,
            "User offline"
        );
    }

    /// Add a connection to a room's broadcast group
    pub fn join_room(&self, connection: &ConnectionId, room_id: RoomId) -> bool {
        let joined = self.transport.add_to_group(connection, room_id);

        tracing::debug!(connection_id = %connection, chat_id = %room_id, joined = joined, "Join room");

        joined
    }

    /// Remove a connection from a room's broadcast group
    pub fn leave_room(&self, connection: &ConnectionId, room_id: RoomId) -> bool {
        let left = self.transport.remove_from_group(connection, room_id);

        tracing::debug!(connection_id = %connection, chat_id = %room_id, left = left, "Leave room");

        left
    }

    /// Mark a user as typing in a room and tell the room
    pub async fn set_typing(&self, room_id: RoomId, user_id: &UserId) -> usize {
        self.typing.insert(user_id.clone(), room_id);

        let event = HubEvent::Typing(TypingIndicator::started(room_id, user_id.clone()));
        let sent = self.transport.send_to_group(room_id, &event).await;

        tracing::trace!(user_id = %user_id, chat_id = %room_id, sent = sent, "Typing started");

        sent
    }

    /// Clear a user's typing state and tell the room
    pub async fn clear_typing(&self, room_id: RoomId, user_id: &UserId) -> usize {
        self.typing.remove(user_id);

        let event = HubEvent::Typing(TypingIndicator::stopped(room_id, user_id.clone()));
        let sent = self.transport.send_to_group(room_id, &event).await;

        tracing::trace!(user_id = %user_id, chat_id = %room_id, sent = sent, "Typing stopped");

        sent
    }

    /// Stamp and broadcast a chat message to a room
    ///
    /// Nothing is stored; members who are not joined at send time never see it.
    pub async fn send_message(&self, room_id: RoomId, message: String, sender: &UserId) -> ChatMessage {
        let chat_message = ChatMessage::now(room_id, message, sender.clone());
        let event = HubEvent::Message(chat_message.clone());
        let sent = self.transport.send_to_group(room_id, &event).await;

        tracing::debug!(
            sender_id = %sender,
            chat_id = %room_id,
            sent = sent,
            "Message sent to room"
        );

        chat_message
    }

    /// Whether the user has a recorded session
    pub fn is_online(&self, user_id: &UserId) -> bool {
        self.sessions.contains_key(user_id)
    }

    /// Whether the user is typing anywhere
    pub fn is_typing(&self, user_id: &UserId) -> bool {
        self.typing.contains_key(user_id)
    }

    /// The user's most recent connection, if online
    pub fn get_connection(&self, user_id: &UserId) -> Option<ConnectionId> {
        self.sessions.get(user_id).map(|r| r.value().clone())
    }

    /// The room the user is typing in, if any
    pub fn typing_room(&self, user_id: &UserId) -> Option<RoomId> {
        self.typing.get(user_id).map(|r| *r.value())
    }

    /// Number of users with a recorded session
    pub fn online_count(&self) -> usize {
        self.sessions.len()
    }

    /// Point-in-time presence snapshot for one user
    pub fn presence(&self, user_id: &UserId) -> PresenceStatus {
        let connection_id = self.get_connection(user_id);
        let chat_id = self.typing_room(user_id);

        PresenceStatus {
            user_id: user_id.clone(),
            is_online: connection_id.is_some(),
            is_typing: chat_id.is_some(),
            chat_id,
            connection_id,
        }
    }
}

impl std::fmt::Debug for PresenceTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresenceTracker")
            .field("sessions", &self.sessions.len())
            .field("typing", &self.typing.len())
            .finish()
    }
}
