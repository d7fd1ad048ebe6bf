//! Integration test utilities for the chat hub
//!
//! Spawns a real hub on a loopback port and drives it with WebSocket and
//! HTTP clients.

pub mod helpers;

pub use helpers::*;
