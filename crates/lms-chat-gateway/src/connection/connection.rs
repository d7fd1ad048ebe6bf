//! Individual WebSocket connection
//!
//! Represents a single WebSocket connection and its state.

use crate::protocol::GatewayMessage;
use lms_chat_core::{ConnectionId, RoomId, UserId};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// Socket accepted and registered
    Connected,
    /// Connection is closed
    Disconnected,
}

/// A single WebSocket connection
pub struct Connection {
    /// Unique connection reference
    id: ConnectionId,

    /// Identity resolved at upgrade time (None for anonymous clients)
    user_id: Option<UserId>,

    /// Current connection state
    state: RwLock<ConnectionState>,

    /// Channel to send messages to the WebSocket
    sender: mpsc::Sender<GatewayMessage>,

    /// Last dispatch sequence number sent
    sequence: AtomicU64,

    /// Last heartbeat received
    last_heartbeat: Mutex<Instant>,

    /// Rooms this connection has joined
    rooms: RwLock<HashSet<RoomId>>,

    /// Connection creation time
    created_at: Instant,
}

impl Connection {
    /// Create a new connection
    pub fn new(
        id: ConnectionId,
        user_id: Option<UserId>,
        sender: mpsc::Sender<GatewayMessage>,
    ) -> Arc<Self> {
        Arc::new(Self {
            id,
            user_id,
            state: RwLock::new(ConnectionState::Connected),
            sender,
            sequence: AtomicU64::new(0),
            last_heartbeat: Mutex::new(Instant::now()),
            rooms: RwLock::new(HashSet::new()),
            created_at: Instant::now(),
        })
    }

    /// Get the connection reference
    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    /// Get the user identity (if any)
    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    /// Whether the connection carries a user identity
    pub fn is_identified(&self) -> bool {
        self.user_id.is_some()
    }

    /// Get the current state
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Set the connection state
    pub fn set_state(&self, state: ConnectionState) {
        *self.state.write() = state;
    }

    /// Get the next dispatch sequence number
    pub fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Get the current dispatch sequence number
    pub fn current_sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    /// Record a heartbeat received
    pub fn record_heartbeat(&self) {
        *self.last_heartbeat.lock() = Instant::now();
    }

    /// Get time since last heartbeat
    pub fn time_since_heartbeat(&self) -> Duration {
        self.last_heartbeat.lock().elapsed()
    }

    /// Record room membership
    pub fn join_room(&self, room_id: RoomId) {
        self.rooms.write().insert(room_id);
    }

    /// Drop room membership
    pub fn leave_room(&self, room_id: RoomId) {
        self.rooms.write().remove(&room_id);
    }

    /// Get all joined rooms
    pub fn rooms(&self) -> Vec<RoomId> {
        self.rooms.read().iter().copied().collect()
    }

    /// Check if joined to a room
    pub fn is_in_room(&self, room_id: RoomId) -> bool {
        self.rooms.read().contains(&room_id)
    }

    /// Get connection age
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Send a message to this connection
    pub async fn send(&self, message: GatewayMessage) -> Result<(), mpsc::error::SendError<GatewayMessage>> {
        self.sender.send(message).await
    }

    /// Try to send a message (non-blocking)
    pub fn try_send(&self, message: GatewayMessage) -> Result<(), mpsc::error::TrySendError<GatewayMessage>> {
        self.sender.try_send(message)
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("sequence", &self.sequence.load(Ordering::SeqCst))
            .field("created_at", &self.created_at)
            .finish()
    }
}
