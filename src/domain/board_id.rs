//! Validated board identifier.
//!
//! [`BoardId`] is the external identifier clients put in the WebSocket
//! connection URL and REST paths. It is the unique key in the
//! [`super::RoomRegistry`] and in the snapshots table, so it is validated
//! once at the boundary and treated as trusted everywhere else.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Maximum accepted length for a board identifier.
const MAX_LEN: usize = 128;

/// Unique identifier for a board.
///
/// Wraps a validated string: non-empty, at most 128 characters, restricted
/// to `[A-Za-z0-9_-]`. Boards created through the REST API use UUID v4
/// strings, but any identifier matching the rules is accepted on the sync
/// endpoint so clients can mint their own ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoardId(String);

impl BoardId {
    /// Validates and wraps a raw board identifier.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidBoardId`] when the input is empty,
    /// too long, or contains characters outside `[A-Za-z0-9_-]`.
    pub fn parse(raw: &str) -> Result<Self, GatewayError> {
        if raw.is_empty() {
            return Err(GatewayError::InvalidBoardId("empty board id".to_string()));
        }
        if raw.len() > MAX_LEN {
            return Err(GatewayError::InvalidBoardId(format!(
                "board id longer than {MAX_LEN} characters"
            )));
        }
        if !raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(GatewayError::InvalidBoardId(format!(
                "board id contains invalid characters: {raw}"
            )));
        }
        Ok(Self(raw.to_string()))
    }

    /// Creates a new random board id (UUID v4 string).
    #[must_use]
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BoardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn accepts_uuid_style_ids() {
        let id = BoardId::random();
        assert!(BoardId::parse(id.as_str()).is_ok());
    }

    #[test]
    fn accepts_slug_style_ids() {
        assert!(BoardId::parse("team-standup_2024").is_ok());
    }

    #[test]
    fn rejects_empty() {
        assert!(BoardId::parse("").is_err());
    }

    #[test]
    fn rejects_too_long() {
        let long = "a".repeat(MAX_LEN + 1);
        assert!(BoardId::parse(&long).is_err());
    }

    #[test]
    fn rejects_invalid_characters() {
        assert!(BoardId::parse("board/../etc").is_err());
        assert!(BoardId::parse("board id").is_err());
    }

    #[test]
    fn serde_is_transparent() {
        let Ok(id) = BoardId::parse("b1") else {
            panic!("valid id");
        };
        let json = serde_json::to_string(&id).ok();
        assert_eq!(json.as_deref(), Some("\"b1\""));
    }
}
