//! PostgreSQL implementation of the persistence layer.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::PersistenceGateway;
use super::models::{BoardRow, CollaboratorRow, Snapshot};
use crate::domain::{BoardId, DocumentState};
use crate::error::GatewayError;

/// PostgreSQL-backed persistence layer using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new persistence layer with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the schema if it does not exist.
    ///
    /// The `snapshots` table deliberately has no foreign key to `boards`:
    /// the sync endpoint accepts client-minted board ids that may never
    /// be registered through the REST API.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn init_schema(&self) -> Result<(), GatewayError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS boards (
                 id TEXT PRIMARY KEY,
                 title TEXT NOT NULL,
                 owner_id TEXT NOT NULL,
                 created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                 updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
             )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS collaborations (
                 board_id TEXT NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
                 user_id TEXT NOT NULL,
                 role TEXT NOT NULL DEFAULT 'editor',
                 added_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                 PRIMARY KEY (board_id, user_id)
             )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS snapshots (
                 board_id TEXT PRIMARY KEY,
                 schema_version INTEGER NOT NULL,
                 document JSONB NOT NULL,
                 saved_at TIMESTAMPTZ NOT NULL DEFAULT now()
             )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;

        Ok(())
    }

    /// Lists boards a user owns or collaborates on, most recent first.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn list_boards(&self, user_id: &str) -> Result<Vec<BoardRow>, GatewayError> {
        let rows = sqlx::query_as::<_, (String, String, String, DateTime<Utc>, DateTime<Utc>)>(
            "SELECT DISTINCT b.id, b.title, b.owner_id, b.created_at, b.updated_at
             FROM boards b
             LEFT JOIN collaborations c ON c.board_id = b.id
             WHERE b.owner_id = $1 OR c.user_id = $1
             ORDER BY b.updated_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(id, title, owner_id, created_at, updated_at)| BoardRow {
                id,
                title,
                owner_id,
                created_at,
                updated_at,
            })
            .collect())
    }

    /// Inserts a new board row owned by `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn create_board(
        &self,
        board_id: &BoardId,
        title: &str,
        owner_id: &str,
    ) -> Result<BoardRow, GatewayError> {
        let row = sqlx::query_as::<_, (String, String, String, DateTime<Utc>, DateTime<Utc>)>(
            "INSERT INTO boards (id, title, owner_id) VALUES ($1, $2, $3)
             RETURNING id, title, owner_id, created_at, updated_at",
        )
        .bind(board_id.as_str())
        .bind(title)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;

        let (id, title, owner_id, created_at, updated_at) = row;
        Ok(BoardRow {
            id,
            title,
            owner_id,
            created_at,
            updated_at,
        })
    }

    /// Deletes a board and its snapshot; collaborations cascade.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::BoardNotFound`] if the board does not
    /// exist, [`GatewayError::Forbidden`] if `user_id` is not the owner,
    /// or [`GatewayError::PersistenceError`] on database failure.
    pub async fn delete_board(&self, board_id: &BoardId, user_id: &str) -> Result<(), GatewayError> {
        let owner = sqlx::query_scalar::<_, String>("SELECT owner_id FROM boards WHERE id = $1")
            .bind(board_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| GatewayError::PersistenceError(e.to_string()))?
            .ok_or_else(|| GatewayError::BoardNotFound(board_id.to_string()))?;

        if owner != user_id {
            return Err(GatewayError::Forbidden(
                "only the owner can delete a board".to_string(),
            ));
        }

        // Board and snapshot rows go together or not at all.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;

        sqlx::query("DELETE FROM boards WHERE id = $1")
            .bind(board_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;

        sqlx::query("DELETE FROM snapshots WHERE board_id = $1")
            .bind(board_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;

        Ok(())
    }

    /// Adds a collaborator to a board.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::BoardNotFound`] if the board does not
    /// exist, [`GatewayError::InvalidRequest`] if the user is already a
    /// collaborator, or [`GatewayError::PersistenceError`] on database
    /// failure.
    pub async fn add_collaborator(
        &self,
        board_id: &BoardId,
        user_id: &str,
        role: &str,
    ) -> Result<CollaboratorRow, GatewayError> {
        let exists = sqlx::query_scalar::<_, String>("SELECT id FROM boards WHERE id = $1")
            .bind(board_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;
        if exists.is_none() {
            return Err(GatewayError::BoardNotFound(board_id.to_string()));
        }

        let row = sqlx::query_as::<_, (String, String, String, DateTime<Utc>)>(
            "INSERT INTO collaborations (board_id, user_id, role) VALUES ($1, $2, $3)
             ON CONFLICT (board_id, user_id) DO NOTHING
             RETURNING board_id, user_id, role, added_at",
        )
        .bind(board_id.as_str())
        .bind(user_id)
        .bind(role)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| GatewayError::PersistenceError(e.to_string()))?
        .ok_or_else(|| {
            GatewayError::InvalidRequest(format!("user {user_id} is already a collaborator"))
        })?;

        let (board_id, user_id, role, added_at) = row;
        Ok(CollaboratorRow {
            board_id,
            user_id,
            role,
            added_at,
        })
    }

    /// Removes a collaborator from a board.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::BoardNotFound`] if no such collaboration
    /// exists, or [`GatewayError::PersistenceError`] on database failure.
    pub async fn remove_collaborator(
        &self,
        board_id: &BoardId,
        user_id: &str,
    ) -> Result<(), GatewayError> {
        let result = sqlx::query("DELETE FROM collaborations WHERE board_id = $1 AND user_id = $2")
            .bind(board_id.as_str())
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(GatewayError::BoardNotFound(format!(
                "no collaborator {user_id} on board {board_id}"
            )));
        }
        Ok(())
    }
}

impl PersistenceGateway for PostgresStore {
    async fn load(&self, board_id: &BoardId) -> Result<Option<Snapshot>, GatewayError> {
        let row = sqlx::query_as::<_, (i32, serde_json::Value, DateTime<Utc>)>(
            "SELECT schema_version, document, saved_at FROM snapshots WHERE board_id = $1",
        )
        .bind(board_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;

        Ok(row.map(|(schema_version, data, saved_at)| Snapshot {
            board_id: board_id.clone(),
            document: DocumentState {
                schema_version: schema_version.unsigned_abs(),
                data,
            },
            saved_at,
        }))
    }

    async fn save(&self, board_id: &BoardId, document: &DocumentState) -> Result<(), GatewayError> {
        sqlx::query(
            "INSERT INTO snapshots (board_id, schema_version, document, saved_at)
             VALUES ($1, $2, $3, now())
             ON CONFLICT (board_id) DO UPDATE
             SET schema_version = EXCLUDED.schema_version,
                 document = EXCLUDED.document,
                 saved_at = now()",
        )
        .bind(board_id.as_str())
        .bind(i32::try_from(document.schema_version).unwrap_or(i32::MAX))
        .bind(&document.data)
        .execute(&self.pool)
        .await
        .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;

        // Keep the board's updated_at in step with its latest snapshot.
        // A miss is fine: ad-hoc boards have no row to bump.
        sqlx::query("UPDATE boards SET updated_at = now() WHERE id = $1")
            .bind(board_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;

        Ok(())
    }
}
