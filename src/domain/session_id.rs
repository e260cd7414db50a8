//! Type-safe session identifier.
//!
//! [`SessionId`] is a newtype wrapper around [`uuid::Uuid`] (v4), generated
//! once per WebSocket connection at attach time. It keys the session set on
//! a [`super::Room`] and the peer map inside the sync engine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for one client connection to a room.
///
/// Generated when the connection attaches and never reused. A session id
/// is only meaningful for the lifetime of its connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(uuid::Uuid);

impl SessionId {
    /// Creates a new random `SessionId` (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Returns the inner [`uuid::Uuid`].
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
