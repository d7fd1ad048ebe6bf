//! # lms-chat-gateway
//!
//! WebSocket chat hub for the classroom: tracks who is online and who is
//! typing, and fans chat messages out to room members.

pub mod connection;
pub mod events;
pub mod handlers;
pub mod hub;
pub mod protocol;
pub mod server;

pub use hub::{HubTransport, PresenceTracker};
pub use server::{create_app, create_gateway_state, run, run_server, GatewayState};
