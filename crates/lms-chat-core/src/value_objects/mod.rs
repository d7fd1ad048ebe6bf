//! Value objects - immutable types that represent domain concepts

mod connection_id;
mod room_id;
mod user_id;

pub use connection_id::ConnectionId;
pub use room_id::RoomId;
pub use user_id::UserId;
