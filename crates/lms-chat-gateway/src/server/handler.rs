//! WebSocket handler
//!
//! Handles hub connections and message processing.

use crate::connection::{Connection, ConnectionState};
use crate::handlers::MessageDispatcher;
use crate::protocol::{CloseCode, GatewayMessage, HelloPayload};
use crate::server::GatewayState;
use axum::{
    extract::{
        ws::{CloseFrame, Message},
        Query, State, WebSocketUpgrade,
    },
    http::HeaderMap,
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use lms_chat_core::{ConnectionId, UserId};
use serde::Deserialize;
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::interval;

/// Longest wait for the close frame to reach the client
const CLOSE_FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

/// Query string accepted on the upgrade request
#[derive(Debug, Default, Deserialize)]
pub struct HubQuery {
    pub user_id: Option<String>,
}

/// WebSocket hub handler
pub async fn hub_handler(
    State(state): State<GatewayState>,
    Query(query): Query<HubQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let user_id = resolve_identity(&headers, &state.config().hub.identity_header, &query);
    ws.on_upgrade(move |socket| handle_socket(state, socket, user_id))
}

/// Pick the caller's identity: the identity header first, then the query string.
///
/// Blank or oversized values count as absent.
pub fn resolve_identity(headers: &HeaderMap, header_name: &str, query: &HubQuery) -> Option<UserId> {
    let from_header = headers
        .get(header_name)
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| UserId::from_optional(Some(raw)));

    from_header.or_else(|| UserId::from_optional(query.user_id.as_deref()))
}

/// Handle an upgraded WebSocket connection
async fn handle_socket(state: GatewayState, socket: axum::extract::ws::WebSocket, user_id: Option<UserId>) {
    let connection_id = ConnectionId::generate();
    let hub_config = &state.config().hub;
    let heartbeat = state.config().heartbeat.clone();

    let (tx, mut rx) = mpsc::channel::<GatewayMessage>(hub_config.message_buffer);

    let connection = state
        .connection_manager()
        .add_connection(connection_id.clone(), user_id.clone(), tx);

    tracing::info!(
        connection_id = %connection_id,
        user_id = user_id.as_ref().map(UserId::as_str),
        "WebSocket connection established"
    );

    let (mut ws_sink, mut ws_stream) = socket.split();

    // Hello goes out before anything the tracker might broadcast
    let hello = GatewayMessage::hello(HelloPayload::with_interval(heartbeat.interval_ms));
    match hello.to_json() {
        Ok(json) => {
            if ws_sink.send(Message::Text(json)).await.is_err() {
                tracing::warn!(connection_id = %connection_id, "Failed to send Hello message");
                cleanup_connection(&state, &connection, false).await;
                return;
            }
        }
        Err(e) => {
            tracing::error!(connection_id = %connection_id, error = %e, "Failed to encode Hello message");
            cleanup_connection(&state, &connection, false).await;
            return;
        }
    }

    state.tracker().on_connect(user_id.as_ref(), &connection_id).await;

    let state_recv = state.clone();
    let connection_recv = connection.clone();

    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = ws_stream.next().await {
            let id = connection_recv.id();
            match msg {
                Ok(Message::Text(text)) => {
                    if let Err(close_code) = handle_text_message(&state_recv, &connection_recv, &text).await {
                        return Some(close_code);
                    }
                }
                Ok(Message::Binary(_)) => {
                    tracing::debug!(connection_id = %id, "Binary messages not supported");
                    return Some(CloseCode::DecodeError);
                }
                Ok(Message::Ping(_) | Message::Pong(_)) => {
                    tracing::trace!(connection_id = %id, "Ping/pong received");
                }
                Ok(Message::Close(_)) => {
                    tracing::info!(connection_id = %id, "Client closed connection");
                    return None;
                }
                Err(e) => {
                    tracing::warn!(connection_id = %id, error = %e, "WebSocket error");
                    return Some(CloseCode::UnknownError);
                }
            }
        }
        None
    });

    let connection_send = connection_id.clone();
    let (close_tx, mut close_rx) = oneshot::channel::<CloseCode>();

    let mut send_task = tokio::spawn(async move {
        let close_code = loop {
            tokio::select! {
                msg = rx.recv() => {
                    let Some(msg) = msg else { break None };
                    let json = match msg.to_json() {
                        Ok(json) => json,
                        Err(e) => {
                            tracing::error!(connection_id = %connection_send, error = %e, "Failed to encode message");
                            continue;
                        }
                    };
                    if ws_sink.send(Message::Text(json)).await.is_err() {
                        tracing::warn!(connection_id = %connection_send, "Failed to send message to WebSocket");
                        return;
                    }
                }
                code = &mut close_rx => break code.ok(),
            }
        };

        let frame = close_code.map(|code| CloseFrame {
            code: code.as_u16(),
            reason: Cow::Borrowed(code.description()),
        });
        let _ = ws_sink.send(Message::Close(frame)).await;
    });

    let connection_hb = connection.clone();

    let mut heartbeat_task = tokio::spawn(async move {
        let mut check_interval = interval(heartbeat.interval() / 2);

        loop {
            check_interval.tick().await;

            let silent_for = connection_hb.time_since_heartbeat();
            if silent_for > heartbeat.timeout() {
                tracing::warn!(
                    connection_id = %connection_hb.id(),
                    silent_ms = silent_for.as_millis() as u64,
                    "Connection timed out (no heartbeat)"
                );
                break;
            }
        }
    });

    let mut send_finished = false;
    let close_code = tokio::select! {
        result = &mut recv_task => result.ok().flatten(),
        _ = &mut send_task => {
            tracing::debug!(connection_id = %connection_id, "Send task ended");
            send_finished = true;
            None
        }
        _ = &mut heartbeat_task => Some(CloseCode::SessionTimeout),
    };

    recv_task.abort();
    heartbeat_task.abort();

    match close_code {
        Some(close_code) => {
            tracing::info!(
                connection_id = %connection_id,
                close_code = close_code.as_u16(),
                reason = close_code.description(),
                "Closing connection"
            );
            let _ = close_tx.send(close_code);
        }
        None => drop(close_tx),
    }

    // Let the send task flush the close frame, but never wait on a stuck peer
    if !send_finished && tokio::time::timeout(CLOSE_FLUSH_TIMEOUT, &mut send_task).await.is_err() {
        send_task.abort();
    }

    cleanup_connection(&state, &connection, true).await;
}

/// Handle a text message from the client
///
/// `Err` carries the code the connection must be closed with.
async fn handle_text_message(
    state: &GatewayState,
    connection: &Arc<Connection>,
    text: &str,
) -> Result<(), CloseCode> {
    let message = match GatewayMessage::from_json(text) {
        Ok(m) => m,
        Err(e) => {
            tracing::debug!(connection_id = %connection.id(), error = %e, "Failed to parse message");
            return Err(CloseCode::DecodeError);
        }
    };

    tracing::trace!(connection_id = %connection.id(), op = %message.op, "Received message");

    match MessageDispatcher::dispatch(state, connection, message).await {
        Ok(Some(close_code)) => Err(close_code),
        Ok(None) => Ok(()),
        Err(e) => match e.to_close_code() {
            Some(close_code) => {
                tracing::warn!(connection_id = %connection.id(), error = %e, "Handler error");
                Err(close_code)
            }
            None => {
                tracing::debug!(connection_id = %connection.id(), error = %e, "Request ignored");
                Ok(())
            }
        },
    }
}

/// Clean up a connection on disconnect
///
/// `tracked` is false when the socket failed before `on_connect` ran; such a
/// connection never announced itself and must not end another tab's session.
async fn cleanup_connection(state: &GatewayState, connection: &Arc<Connection>, tracked: bool) {
    connection.set_state(ConnectionState::Disconnected);

    if tracked {
        state.tracker().on_disconnect(connection.user_id()).await;
    }
    state.connection_manager().remove_connection(connection.id());

    tracing::info!(
        connection_id = %connection.id(),
        age_ms = connection.age().as_millis() as u64,
        "Connection cleaned up"
    );
}
