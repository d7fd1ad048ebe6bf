//! Connection manager
//!
//! Owns every live WebSocket connection and the room broadcast groups, using
//! DashMap for thread-safe access. This is the transport side of the hub:
//! group membership and fan-out live here, presence bookkeeping does not.

use super::{Connection, ConnectionState};
use crate::events::HubEvent;
use crate::hub::HubTransport;
use crate::protocol::GatewayMessage;
use async_trait::async_trait;
use dashmap::DashMap;
use lms_chat_core::{ConnectionId, RoomId, UserId};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Manages all active WebSocket connections and room groups
pub struct ConnectionManager {
    /// Active connections by connection id
    connections: DashMap<ConnectionId, Arc<Connection>>,

    /// Room ID to member connection ids
    room_connections: DashMap<RoomId, HashSet<ConnectionId>>,
}

impl ConnectionManager {
    /// Create a new connection manager
    #[must_use]
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            room_connections: DashMap::new(),
        }
    }

    /// Create a new connection manager wrapped in Arc
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register a new connection
    pub fn add_connection(
        &self,
        id: ConnectionId,
        user_id: Option<UserId>,
        sender: mpsc::Sender<GatewayMessage>,
    ) -> Arc<Connection> {
        let connection = Connection::new(id.clone(), user_id, sender);
        self.connections.insert(id.clone(), connection.clone());

        tracing::debug!(connection_id = %id, "Connection added");

        connection
    }

    /// Remove a connection and drop it from every room group
    pub fn remove_connection(&self, id: &ConnectionId) -> Option<Arc<Connection>> {
        let (_, connection) = self.connections.remove(id)?;

        for room_id in connection.rooms() {
            self.detach_from_room(id, room_id);
        }

        tracing::debug!(connection_id = %id, "Connection removed");

        Some(connection)
    }

    /// Get a connection by id
    pub fn get_connection(&self, id: &ConnectionId) -> Option<Arc<Connection>> {
        self.connections.get(id).map(|r| r.clone())
    }

    /// Add a connection to a room group
    pub fn join_room(&self, id: &ConnectionId, room_id: RoomId) -> bool {
        let Some(connection) = self.get_connection(id) else {
            return false;
        };

        connection.join_room(room_id);
        self.room_connections
            .entry(room_id)
            .or_default()
            .insert(id.clone());

        // Lost a race with remove_connection; don't leave a dangling member.
        if !self.connections.contains_key(id) {
            self.detach_from_room(id, room_id);
            return false;
        }

        tracing::trace!(connection_id = %id, chat_id = %room_id, "Connection joined room");

        true
    }

    /// Remove a connection from a room group
    pub fn leave_room(&self, id: &ConnectionId, room_id: RoomId) -> bool {
        let Some(connection) = self.get_connection(id) else {
            return false;
        };

        connection.leave_room(room_id);
        self.detach_from_room(id, room_id);

        tracing::trace!(connection_id = %id, chat_id = %room_id, "Connection left room");

        true
    }

    /// Atomically drop a member and clean up the group if it emptied
    fn detach_from_room(&self, id: &ConnectionId, room_id: RoomId) {
        self.room_connections.alter(&room_id, |_, mut members| {
            members.remove(id);
            members
        });
        self.room_connections
            .remove_if(&room_id, |_, members| members.is_empty());
    }

    /// Get all connections joined to a room
    pub fn get_room_connections(&self, room_id: RoomId) -> Vec<Arc<Connection>> {
        self.room_connections
            .get(&room_id)
            .map(|members| {
                members
                    .iter()
                    .filter_map(|id| self.connections.get(id).map(|c| c.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Send an event to every connection joined to a room
    pub fn send_to_room(&self, room_id: RoomId, event: &HubEvent) -> usize {
        let connections = self.get_room_connections(room_id);
        let sent = deliver(&connections, event);

        tracing::trace!(
            chat_id = %room_id,
            event_type = %event.event_type(),
            sent = sent,
            "Event sent to room"
        );

        sent
    }

    /// Send an event to every connection
    pub fn broadcast(&self, event: &HubEvent) -> usize {
        let connections: Vec<Arc<Connection>> =
            self.connections.iter().map(|r| r.value().clone()).collect();
        let sent = deliver(&connections, event);

        tracing::debug!(
            event_type = %event.event_type(),
            sent = sent,
            "Event broadcast to all connections"
        );

        sent
    }

    /// Get the total number of active connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Get the number of rooms with at least one member
    pub fn room_count(&self) -> usize {
        self.room_connections.len()
    }

    /// Check if a connection exists
    pub fn has_connection(&self, id: &ConnectionId) -> bool {
        self.connections.contains_key(id)
    }
}

/// Render an event once and queue it on each connection
///
/// Delivery is best-effort: a full or closed outbound queue drops the event
/// for that connection only. Connections already being torn down are skipped.
fn deliver(connections: &[Arc<Connection>], event: &HubEvent) -> usize {
    if connections.is_empty() {
        return 0;
    }

    let data = match event.to_data() {
        Ok(data) => data,
        Err(e) => {
            tracing::warn!(
                event_type = %event.event_type(),
                error = %e,
                "Failed to serialize hub event"
            );
            return 0;
        }
    };

    let event_type = event.event_type();
    let mut sent = 0;

    for conn in connections {
        if conn.state() == ConnectionState::Disconnected {
            continue;
        }

        let message = GatewayMessage::dispatch(event_type, conn.next_sequence(), data.clone());
        match conn.try_send(message) {
            Ok(()) => sent += 1,
            Err(TrySendError::Full(_)) => {
                tracing::debug!(
                    connection_id = %conn.id(),
                    event_type = %event_type,
                    "Outbound queue full, event dropped"
                );
            }
            Err(TrySendError::Closed(_)) => {
                tracing::trace!(connection_id = %conn.id(), "Outbound queue closed");
            }
        }
    }

    sent
}

#[async_trait]
impl HubTransport for ConnectionManager {
    async fn send_to_all(&self, event: &HubEvent) -> usize {
        self.broadcast(event)
    }

    async fn send_to_group(&self, room_id: RoomId, event: &HubEvent) -> usize {
        self.send_to_room(room_id, event)
    }

    fn add_to_group(&self, connection: &ConnectionId, room_id: RoomId) -> bool {
        self.join_room(connection, room_id)
    }

    fn remove_from_group(&self, connection: &ConnectionId, room_id: RoomId) -> bool {
        self.leave_room(connection, room_id)
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("connections", &self.connections.len())
            .field("rooms", &self.room_connections.len())
            .finish()
    }
}
