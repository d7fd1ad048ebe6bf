//! Chat message handler (op 4)

use super::{HandlerError, HandlerResult};
use crate::connection::Connection;
use crate::hub::PresenceTracker;
use crate::protocol::SendMessagePayload;
use lms_chat_core::DomainError;
use std::sync::Arc;
use validator::Validate;

/// Handles SendMessage
pub struct ChatHandler;

impl ChatHandler {
    /// Broadcast a message to the room on behalf of the connection's user.
    pub async fn send(
        tracker: &PresenceTracker,
        connection: &Arc<Connection>,
        payload: SendMessagePayload,
    ) -> HandlerResult<()> {
        let sender = connection
            .user_id()
            .ok_or_else(|| HandlerError::anonymous("send messages"))?;

        payload
            .validate()
            .map_err(|e| DomainError::ValidationError(e.to_string()))?;
        if payload.is_blank() {
            return Err(DomainError::ValidationError("Message is blank".to_string()).into());
        }

        let chat_id = payload.chat_id;
        let message = tracker.send_message(chat_id, payload.message, sender).await;

        tracing::debug!(
            connection_id = %connection.id(),
            user_id = %sender,
            chat_id = %chat_id,
            timestamp = %message.timestamp,
            "Message relayed"
        );
        Ok(())
    }
}
