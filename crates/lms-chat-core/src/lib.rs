//! # lms-chat-core
//!
//! Domain layer for the classroom chat hub: identifiers for users, chat rooms
//! and physical connections, plus the domain error type.
//! This crate has zero dependencies on infrastructure (web framework, runtime, etc.).

pub mod error;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use error::DomainError;
pub use value_objects::{ConnectionId, RoomId, UserId};
