//! Persistence layer: durable board snapshots and CRUD rows.
//!
//! Provides the [`PersistenceGateway`] trait the room lifecycle consumes
//! for hydration and saves. The concrete implementation uses
//! `sqlx::PgPool` for async PostgreSQL access; tests substitute in-memory
//! fakes.

pub mod models;
pub mod postgres;

use std::fmt;
use std::future::Future;

use crate::domain::{BoardId, DocumentState};
use crate::error::GatewayError;
use models::Snapshot;

/// Durable storage consumed by the room lifecycle.
///
/// Both operations are idempotent from the caller's perspective: loading
/// twice returns the same snapshot, and repeating a save with the same
/// state is safe (writes are upserts keyed by board id).
pub trait PersistenceGateway: fmt::Debug + Send + Sync + 'static {
    /// Loads the most recent snapshot for a board, if any.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on storage failure. The
    /// room service degrades this to "no snapshot" so hydration failures
    /// never block room creation.
    fn load(
        &self,
        board_id: &BoardId,
    ) -> impl Future<Output = Result<Option<Snapshot>, GatewayError>> + Send;

    /// Upserts the current snapshot for a board.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on storage failure. The
    /// caller logs and leaves the room dirty; the next autosave tick or
    /// empty-transition retries naturally.
    fn save(
        &self,
        board_id: &BoardId,
        document: &DocumentState,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;
}
