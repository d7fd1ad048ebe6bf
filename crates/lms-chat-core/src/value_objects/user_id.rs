//! User identity as issued by the upstream identity provider
//!
//! The hub never authenticates users itself; it only carries the identifier
//! it was handed. An empty identifier means the client is anonymous, so a
//! `UserId` can only be built from a non-blank string.

use crate::error::DomainError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Longest identifier accepted from the identity provider
const MAX_LEN: usize = 256;

/// Identity-provider user identifier (never blank)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Parse a user identifier, trimming surrounding whitespace
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(DomainError::InvalidUserId("user id is empty".to_string()));
        }

        if trimmed.len() > MAX_LEN {
            return Err(DomainError::InvalidUserId(format!(
                "user id exceeds {MAX_LEN} bytes"
            )));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Resolve an optional raw identity into a tracked user
    ///
    /// Returns `None` for absent or blank identities (anonymous clients).
    #[must_use]
    pub fn from_optional(raw: Option<&str>) -> Option<Self> {
        raw.and_then(|s| Self::parse(s).ok())
    }

    /// Borrow the identifier as a string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the inner string
    #[inline]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for UserId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
