//! In-memory room: one board's live engine plus session bookkeeping.
//!
//! A [`Room`] pairs the sync engine instance for one board with the
//! mutable lifecycle state the room service drives: the attached session
//! set, the dirty flag, and the timer handles for autosave and eviction.
//! All of that state lives behind a single per-room `tokio::sync::Mutex`,
//! so attach, detach, timer firings, and saves for one room are totally
//! ordered while different rooms never contend.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::AbortHandle;

use super::{BoardId, SessionId};
use crate::engine::SyncEngine;

/// Live in-memory unit for one board.
///
/// Created once per registry entry (hydrated from storage or empty) and
/// dropped when eviction removes it from the registry. The engine handle
/// is created exactly once per room lifetime and shared with every
/// connection attached to the room.
#[derive(Debug)]
pub struct Room {
    board_id: BoardId,
    engine: Arc<dyn SyncEngine>,
    state: Mutex<RoomState>,
}

/// Lifecycle state guarded by the per-room lock.
///
/// Invariant: `autosave` and `eviction` are never both `Some`. The
/// autosave handle is armed exactly while `sessions` is non-empty; the
/// eviction handle exactly while it is empty and the grace period has not
/// elapsed.
#[derive(Debug, Default)]
pub(crate) struct RoomState {
    /// Sessions currently attached to the room.
    pub sessions: HashSet<SessionId>,
    /// Whether state changed since the last successful save.
    pub dirty: bool,
    /// Periodic autosave task, armed while sessions exist.
    pub autosave: Option<AbortHandle>,
    /// Delayed eviction task, armed while the room is empty.
    pub eviction: Option<AbortHandle>,
    /// Set once eviction finalized; the room is no longer in the registry
    /// and must not accept new sessions.
    pub evicted: bool,
}

impl Room {
    /// Creates a room for `board_id` around a freshly built engine.
    #[must_use]
    pub fn new(board_id: BoardId, engine: Arc<dyn SyncEngine>) -> Self {
        Self {
            board_id,
            engine,
            state: Mutex::new(RoomState::default()),
        }
    }

    /// Returns the board this room belongs to.
    #[must_use]
    pub fn board_id(&self) -> &BoardId {
        &self.board_id
    }

    /// Returns the room's sync engine handle.
    #[must_use]
    pub fn engine(&self) -> &Arc<dyn SyncEngine> {
        &self.engine
    }

    /// Marks the room as changed since the last successful save.
    pub async fn mark_dirty(&self) {
        self.state.lock().await.dirty = true;
    }

    /// Returns the number of currently attached sessions.
    pub async fn session_count(&self) -> usize {
        self.state.lock().await.sessions.len()
    }

    /// Returns `true` if the room has unsaved changes.
    pub async fn is_dirty(&self) -> bool {
        self.state.lock().await.dirty
    }

    pub(crate) fn state(&self) -> &Mutex<RoomState> {
        &self.state
    }
}
