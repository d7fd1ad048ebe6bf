//! Chat room identifier
//!
//! A room has no entity of its own; it only names a broadcast group.
//! Serialized as a plain JSON integer (the `ChatId` field on the wire).

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Chat room (broadcast group) identifier
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RoomId(i64);

impl RoomId {
    /// Create a room id from a raw value
    #[inline]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner value
    #[inline]
    pub const fn into_inner(self) -> i64 {
        self.0
    }

    /// Parse from string representation
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| DomainError::InvalidRoomId(s.to_string()))
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RoomId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<RoomId> for i64 {
    fn from(id: RoomId) -> Self {
        id.0
    }
}

impl std::str::FromStr for RoomId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
