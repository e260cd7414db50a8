//! Opaque, schema-versioned document state.
//!
//! The gateway never interprets board contents beyond folding update
//! frames into a record map. [`DocumentState`] is what the sync engine
//! hands out on snapshot and what the persistence gateway stores.

use serde::{Deserialize, Serialize};

/// Current document schema version written into new documents.
pub const SCHEMA_VERSION: u32 = 1;

/// Versioned, opaque document blob for one board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentState {
    /// Schema version of `data`, owned by the client application.
    pub schema_version: u32,
    /// The document payload. For the built-in engine this is an object
    /// mapping record id to record.
    pub data: serde_json::Value,
}

impl DocumentState {
    /// Creates an empty document at the current schema version.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            data: serde_json::Value::Object(serde_json::Map::new()),
        }
    }

    /// Returns `true` if the document holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match &self.data {
            serde_json::Value::Object(map) => map.is_empty(),
            serde_json::Value::Null => true,
            _ => false,
        }
    }
}

impl Default for DocumentState {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_empty() {
        assert!(DocumentState::empty().is_empty());
    }

    #[test]
    fn populated_document_is_not_empty() {
        let doc = DocumentState {
            schema_version: SCHEMA_VERSION,
            data: serde_json::json!({"shape:1": {"x": 0}}),
        };
        assert!(!doc.is_empty());
    }
}
