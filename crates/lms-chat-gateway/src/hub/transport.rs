//! Transport seam used by the presence tracker

use crate::events::HubEvent;
use async_trait::async_trait;
use lms_chat_core::{ConnectionId, RoomId};

/// Broadcast and group-membership primitives supplied by the real-time transport
///
/// Sends are best-effort and report how many connections the event was queued for.
#[async_trait]
pub trait HubTransport: Send + Sync {
    /// Send an event to every connected client
    async fn send_to_all(&self, event: &HubEvent) -> usize;

    /// Send an event to every client in a room group
    async fn send_to_group(&self, room_id: RoomId, event: &HubEvent) -> usize;

    /// Add a connection to a room group; false if the connection is unknown
    fn add_to_group(&self, connection: &ConnectionId, room_id: RoomId) -> bool;

    /// Remove a connection from a room group; false if the connection is unknown
    fn remove_from_group(&self, connection: &ConnectionId, room_id: RoomId) -> bool;
}
