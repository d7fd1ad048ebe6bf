//! Op code handlers
//!
//! Handles incoming WebSocket messages based on their operation code.

mod chat;
mod error;
mod heartbeat;
mod room;
mod typing;

pub use chat::ChatHandler;
pub use error::{HandlerError, HandlerResult};
pub use heartbeat::HeartbeatHandler;
pub use room::RoomHandler;
pub use typing::TypingHandler;

use crate::connection::Connection;
use crate::protocol::{CloseCode, GatewayMessage, OpCode};
use crate::server::GatewayState;
use std::sync::Arc;

/// Dispatch incoming client messages to appropriate handlers
pub struct MessageDispatcher;

impl MessageDispatcher {
    /// Handle an incoming client message
    ///
    /// `Ok(Some(code))` asks the caller to close the socket with `code`.
    pub async fn dispatch(
        state: &GatewayState,
        connection: &Arc<Connection>,
        message: GatewayMessage,
    ) -> HandlerResult<Option<CloseCode>> {
        if !message.op.is_client_op() {
            tracing::warn!(
                connection_id = %connection.id(),
                op = %message.op,
                "Received server-only op code from client"
            );
            return Ok(Some(CloseCode::UnknownOpcode));
        }

        let tracker = state.tracker();

        match message.op {
            OpCode::Heartbeat => {
                let seq = message.as_heartbeat_seq().ok_or_else(|| invalid("Heartbeat"))?;
                HeartbeatHandler::handle(connection, seq).await?;
            }
            OpCode::JoinChat => {
                let payload = message.as_room().ok_or_else(|| invalid("JoinChat"))?;
                RoomHandler::join(tracker, connection, payload)?;
            }
            OpCode::LeaveChat => {
                let payload = message.as_room().ok_or_else(|| invalid("LeaveChat"))?;
                RoomHandler::leave(tracker, connection, payload)?;
            }
            OpCode::SendMessage => {
                let payload = message.as_send_message().ok_or_else(|| invalid("SendMessage"))?;
                ChatHandler::send(tracker, connection, payload).await?;
            }
            OpCode::Typing => {
                let payload = message.as_room().ok_or_else(|| invalid("Typing"))?;
                TypingHandler::start(tracker, connection, payload).await?;
            }
            OpCode::StopTyping => {
                let payload = message.as_room().ok_or_else(|| invalid("StopTyping"))?;
                TypingHandler::stop(tracker, connection, payload).await?;
            }
            // Server ops are filtered above
            OpCode::Dispatch | OpCode::Hello | OpCode::HeartbeatAck => {
                tracing::error!(op = %message.op, "Unhandled client op code");
                return Ok(Some(CloseCode::UnknownOpcode));
            }
        }

        Ok(None)
    }
}

fn invalid(op: &str) -> HandlerError {
    HandlerError::InvalidPayload(format!("Invalid {op} payload"))
}
