//! Board and snapshot DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::persistence::models::BoardRow;

/// Request body for board creation.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateBoardRequest {
    /// Human-readable board title.
    pub title: String,
    /// Id of the user creating (and owning) the board.
    pub user_id: String,
}

/// A board as returned by list and create endpoints.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BoardDto {
    /// Board identifier.
    pub id: String,
    /// Board title.
    pub title: String,
    /// Owner's user id.
    pub owner_id: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<BoardRow> for BoardDto {
    fn from(row: BoardRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            owner_id: row.owner_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Query parameters identifying the acting user.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct UserParams {
    /// Id of the user making the request.
    pub user_id: Option<String>,
}

/// Request body for the REST snapshot write path.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SaveSnapshotRequest {
    /// Document payload to persist.
    pub data: serde_json::Value,
    /// Schema version of `data`; defaults to the current version.
    #[serde(default)]
    pub schema_version: Option<u32>,
}

/// A persisted snapshot as returned by the read endpoint.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SnapshotDto {
    /// Board the snapshot belongs to.
    pub board_id: String,
    /// Schema version of the document payload.
    pub schema_version: u32,
    /// Document payload.
    pub data: serde_json::Value,
    /// When the snapshot was written.
    pub saved_at: DateTime<Utc>,
}
