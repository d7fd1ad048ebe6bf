//! Connection management
//!
//! Manages WebSocket connections, room groups, and outbound fan-out.

mod connection;
mod manager;

pub use connection::{Connection, ConnectionState};
pub use manager::ConnectionManager;
