//! Database models for snapshots, boards, and collaborators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{BoardId, DocumentState};

/// The persisted unit for one board: at most one current row per board id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Board the snapshot belongs to.
    pub board_id: BoardId,
    /// Schema-versioned document blob.
    pub document: DocumentState,
    /// When this snapshot was written.
    pub saved_at: DateTime<Utc>,
}

/// A board row from the `boards` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardRow {
    /// Board identifier.
    pub id: String,
    /// Human-readable board title.
    pub title: String,
    /// Owner's user id.
    pub owner_id: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp (bumped on snapshot writes).
    pub updated_at: DateTime<Utc>,
}

/// A collaborator row from the `collaborations` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollaboratorRow {
    /// Board the collaborator is attached to.
    pub board_id: String,
    /// Collaborating user's id.
    pub user_id: String,
    /// Role string (`"editor"` or `"viewer"`).
    pub role: String,
    /// When the collaborator was added.
    pub added_at: DateTime<Utc>,
}
