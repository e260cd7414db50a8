//! Collaborator DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::persistence::models::CollaboratorRow;

/// Request body for adding a collaborator to a board.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AddCollaboratorRequest {
    /// Id of the user to add.
    pub user_id: String,
    /// Role to grant: `"editor"` or `"viewer"`. Defaults to `"editor"`.
    #[serde(default)]
    pub role: Option<String>,
}

/// A collaborator as returned by the add endpoint.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CollaboratorDto {
    /// Board the collaborator is attached to.
    pub board_id: String,
    /// Collaborating user's id.
    pub user_id: String,
    /// Granted role.
    pub role: String,
    /// When the collaborator was added.
    pub added_at: DateTime<Utc>,
}

impl From<CollaboratorRow> for CollaboratorDto {
    fn from(row: CollaboratorRow) -> Self {
        Self {
            board_id: row.board_id,
            user_id: row.user_id,
            role: row.role,
            added_at: row.added_at,
        }
    }
}
