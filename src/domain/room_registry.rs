//! Concurrency-safe directory from board id to live room.
//!
//! [`RoomRegistry`] owns creation, lookup, and removal of [`Room`]s. The
//! outer map lock is held only long enough to clone a per-key cell, so
//! hydration for one board never blocks operations on another, and two
//! racing creators for the same board converge on a single room: the
//! loser awaits the winner's in-flight initialization.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};

use super::{BoardId, Room};

/// Process-wide directory of live rooms.
///
/// Constructed once at startup and shared behind an `Arc`; there are no
/// hidden globals. A room is reachable from the registry exactly while it
/// is live (created and not yet evicted).
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: Mutex<HashMap<BoardId, Arc<OnceCell<Arc<Room>>>>>,
}

impl RoomRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the room for `board_id`, running `init` to build it if no
    /// live room exists.
    ///
    /// Under concurrent calls for the same board, `init` runs exactly
    /// once; every caller receives the same `Arc<Room>`. `init` must be
    /// infallible (hydration failures degrade to an empty room upstream).
    pub async fn get_or_create<F, Fut>(&self, board_id: &BoardId, init: F) -> Arc<Room>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Arc<Room>>,
    {
        let cell = {
            let mut map = self.rooms.lock().await;
            Arc::clone(
                map.entry(board_id.clone())
                    .or_insert_with(|| Arc::new(OnceCell::new())),
            )
        };
        Arc::clone(cell.get_or_init(init).await)
    }

    /// Returns the live room for `board_id`, if one exists and has
    /// finished initializing.
    pub async fn get(&self, board_id: &BoardId) -> Option<Arc<Room>> {
        let map = self.rooms.lock().await;
        map.get(board_id).and_then(|cell| cell.get().cloned())
    }

    /// Removes the registry entry for `board_id`.
    ///
    /// Only called from eviction finalization, while the evictor still
    /// holds the room's own lock and has re-checked the session set.
    pub async fn remove(&self, board_id: &BoardId) {
        self.rooms.lock().await.remove(board_id);
    }

    /// Returns every fully initialized room, e.g. for shutdown flushing.
    pub async fn live_rooms(&self) -> Vec<Arc<Room>> {
        let map = self.rooms.lock().await;
        map.values()
            .filter_map(|cell| cell.get().cloned())
            .collect()
    }

    /// Returns the number of registry entries.
    pub async fn len(&self) -> usize {
        self.rooms.lock().await.len()
    }

    /// Returns `true` if no rooms are registered.
    pub async fn is_empty(&self) -> bool {
        self.rooms.lock().await.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::domain::DocumentState;
    use crate::engine::{BroadcastEngine, SyncEngine};

    fn make_room(board_id: &BoardId) -> Arc<Room> {
        let engine: Arc<dyn SyncEngine> = Arc::new(BroadcastEngine::new(DocumentState::empty()));
        Arc::new(Room::new(board_id.clone(), engine))
    }

    fn board(raw: &str) -> BoardId {
        let Ok(id) = BoardId::parse(raw) else {
            panic!("valid board id");
        };
        id
    }

    #[tokio::test]
    async fn get_or_create_returns_same_room() {
        let registry = RoomRegistry::new();
        let id = board("b1");

        let first = registry.get_or_create(&id, || async { make_room(&id) }).await;
        let second = registry.get_or_create(&id, || async { make_room(&id) }).await;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn concurrent_creators_converge_to_one_init() {
        let registry = Arc::new(RoomRegistry::new());
        let id = board("contested");
        let inits = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let registry = Arc::clone(&registry);
            let id = id.clone();
            let inits = Arc::clone(&inits);
            handles.push(tokio::spawn(async move {
                registry
                    .get_or_create(&id, || async {
                        inits.fetch_add(1, Ordering::SeqCst);
                        tokio::task::yield_now().await;
                        make_room(&id)
                    })
                    .await
            }));
        }

        let mut rooms = Vec::new();
        for handle in handles {
            let Ok(room) = handle.await else {
                panic!("task panicked");
            };
            rooms.push(room);
        }

        assert_eq!(inits.load(Ordering::SeqCst), 1);
        let Some(first) = rooms.first() else {
            panic!("no rooms returned");
        };
        assert!(rooms.iter().all(|room| Arc::ptr_eq(room, first)));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn remove_makes_room_unreachable() {
        let registry = RoomRegistry::new();
        let id = board("b2");

        let _ = registry.get_or_create(&id, || async { make_room(&id) }).await;
        assert!(registry.get(&id).await.is_some());

        registry.remove(&id).await;
        assert!(registry.get(&id).await.is_none());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn recreate_after_remove_builds_fresh_room() {
        let registry = RoomRegistry::new();
        let id = board("b3");

        let first = registry.get_or_create(&id, || async { make_room(&id) }).await;
        registry.remove(&id).await;
        let second = registry.get_or_create(&id, || async { make_room(&id) }).await;
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn live_rooms_lists_initialized_entries() {
        let registry = RoomRegistry::new();
        let a = board("a");
        let b = board("b");
        let _ = registry.get_or_create(&a, || async { make_room(&a) }).await;
        let _ = registry.get_or_create(&b, || async { make_room(&b) }).await;

        assert_eq!(registry.live_rooms().await.len(), 2);
    }
}
