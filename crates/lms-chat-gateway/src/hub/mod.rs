//! Chat hub
//!
//! Presence and typing bookkeeping on top of a broadcast transport.

mod tracker;
mod transport;

pub use tracker::PresenceTracker;
pub use transport::HubTransport;
