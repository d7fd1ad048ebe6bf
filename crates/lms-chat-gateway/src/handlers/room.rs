//! Room membership handler (ops 2 and 3)

use super::HandlerResult;
use crate::connection::Connection;
use crate::hub::PresenceTracker;
use crate::protocol::RoomPayload;
use std::sync::Arc;

/// Handles JoinChat and LeaveChat
pub struct RoomHandler;

impl RoomHandler {
    /// Subscribe the connection to a room's broadcasts.
    ///
    /// Anonymous connections may join; they receive room traffic but cannot
    /// type or send.
    pub fn join(
        tracker: &PresenceTracker,
        connection: &Arc<Connection>,
        payload: RoomPayload,
    ) -> HandlerResult<()> {
        if !tracker.join_room(connection.id(), payload.chat_id) {
            tracing::debug!(
                connection_id = %connection.id(),
                chat_id = %payload.chat_id,
                "Join ignored, connection no longer registered"
            );
        }
        Ok(())
    }

    /// Unsubscribe the connection from a room. Not being a member is fine.
    pub fn leave(
        tracker: &PresenceTracker,
        connection: &Arc<Connection>,
        payload: RoomPayload,
    ) -> HandlerResult<()> {
        tracker.leave_room(connection.id(), payload.chat_id);
        Ok(())
    }
}
