//! Typing indicator handler (ops 5 and 6)

use super::{HandlerError, HandlerResult};
use crate::connection::Connection;
use crate::hub::PresenceTracker;
use crate::protocol::RoomPayload;
use std::sync::Arc;

/// Handles Typing and StopTyping
pub struct TypingHandler;

impl TypingHandler {
    /// Mark the connection's user as typing in the room and tell its members.
    pub async fn start(
        tracker: &PresenceTracker,
        connection: &Arc<Connection>,
        payload: RoomPayload,
    ) -> HandlerResult<()> {
        let user_id = connection
            .user_id()
            .ok_or_else(|| HandlerError::anonymous("type"))?;

        tracker.set_typing(payload.chat_id, user_id).await;
        Ok(())
    }

    /// Clear the connection's user's typing state and tell the room.
    pub async fn stop(
        tracker: &PresenceTracker,
        connection: &Arc<Connection>,
        payload: RoomPayload,
    ) -> HandlerResult<()> {
        let user_id = connection
            .user_id()
            .ok_or_else(|| HandlerError::anonymous("type"))?;

        tracker.clear_typing(payload.chat_id, user_id).await;
        Ok(())
    }
}
