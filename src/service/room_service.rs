//! Room lifecycle and persistence manager.
//!
//! [`RoomService`] maps board ids to live [`Room`]s, lazily hydrating
//! them from the persistence gateway on first use, autosaving them on a
//! periodic timer while sessions are attached, flushing them immediately
//! when the last session detaches, and evicting them from memory after a
//! grace period of inactivity.
//!
//! All lifecycle transitions for one room happen under that room's own
//! lock, so attach, detach, autosave ticks, and eviction expiry are
//! totally ordered per room and never contend across rooms.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::AbortHandle;

use crate::domain::{BoardId, Room, RoomRegistry, RoomState, SessionId};
use crate::engine::EngineFactory;
use crate::persistence::PersistenceGateway;

/// Injected room lifecycle intervals.
#[derive(Debug, Clone, Copy)]
pub struct RoomConfig {
    /// Interval between periodic saves while a room has sessions.
    pub autosave_interval: Duration,
    /// How long an empty room stays in memory before eviction.
    pub grace_period: Duration,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            autosave_interval: Duration::from_secs(30),
            grace_period: Duration::from_secs(60),
        }
    }
}

/// Orchestrates room creation, session bookkeeping, autosave, and eviction.
///
/// Constructed once at process start and shared behind an `Arc`; the
/// WebSocket layer calls [`connect`](Self::connect) and
/// [`detach`](Self::detach), everything else is driven by the per-room
/// timers this service arms and disarms.
#[derive(Debug)]
pub struct RoomService<P: PersistenceGateway> {
    registry: RoomRegistry,
    store: Arc<P>,
    engine_factory: Box<dyn EngineFactory>,
    config: RoomConfig,
}

impl<P: PersistenceGateway> RoomService<P> {
    /// Creates a new room service.
    #[must_use]
    pub fn new(store: Arc<P>, engine_factory: Box<dyn EngineFactory>, config: RoomConfig) -> Self {
        Self {
            registry: RoomRegistry::new(),
            store,
            engine_factory,
            config,
        }
    }

    /// Returns the room registry (lookups, live-room listing).
    #[must_use]
    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Resolves the room for `board_id` and attaches a fresh session.
    ///
    /// Creates and hydrates the room if no live one exists. If the
    /// resolved room lost a race with eviction, the lookup is retried;
    /// the evictor removed the registry entry before releasing the room
    /// lock, so the retry always observes a fresh entry.
    pub async fn connect(self: &Arc<Self>, board_id: &BoardId) -> (Arc<Room>, SessionId) {
        let session_id = SessionId::new();
        loop {
            let room = self.get_or_create(board_id).await;
            let mut state = room.state().lock().await;
            if state.evicted {
                drop(state);
                continue;
            }

            let was_empty = state.sessions.is_empty();
            state.sessions.insert(session_id);
            if was_empty {
                if let Some(eviction) = state.eviction.take() {
                    eviction.abort();
                    tracing::debug!(%board_id, "eviction cancelled on reconnect");
                }
                state.autosave = Some(self.spawn_autosave(&room));
            }
            drop(state);

            tracing::info!(%board_id, %session_id, "session attached");
            return (room, session_id);
        }
    }

    /// Detaches a session from its room.
    ///
    /// On the non-empty to empty transition this disarms the autosave
    /// timer, performs an immediate awaited save, and arms the eviction
    /// timer — all under the room lock, so an attach arriving mid-sequence
    /// lands strictly before or strictly after it.
    pub async fn detach(self: &Arc<Self>, room: &Arc<Room>, session_id: SessionId) {
        let mut state = room.state().lock().await;
        if !state.sessions.remove(&session_id) {
            return;
        }
        tracing::info!(board_id = %room.board_id(), %session_id, "session detached");

        if state.sessions.is_empty() && !state.evicted {
            if let Some(autosave) = state.autosave.take() {
                autosave.abort();
            }
            // Final save happens now, not on a timer, so the grace window
            // can never lose data even if the process dies during it.
            self.save_room(room, &mut state).await;
            state.eviction = Some(self.spawn_eviction(room));
        }
    }

    /// Flushes every live room; called on graceful shutdown.
    ///
    /// Timers are disarmed first so no tick races the final write. The
    /// returned future completes only after every save attempt finished,
    /// making shutdown observable to callers and tests.
    pub async fn shutdown(&self) {
        for room in self.registry.live_rooms().await {
            let mut state = room.state().lock().await;
            if state.evicted {
                continue;
            }
            if let Some(autosave) = state.autosave.take() {
                autosave.abort();
            }
            if let Some(eviction) = state.eviction.take() {
                eviction.abort();
            }
            self.save_room(&room, &mut state).await;
        }
        tracing::info!("room service shut down, all live rooms flushed");
    }

    /// Returns the room for `board_id`, hydrating a new one if needed.
    ///
    /// A load failure is logged and treated as "no snapshot": the room
    /// starts empty rather than blocking connection establishment.
    async fn get_or_create(&self, board_id: &BoardId) -> Arc<Room> {
        self.registry
            .get_or_create(board_id, || async {
                let initial = match self.store.load(board_id).await {
                    Ok(Some(snapshot)) => {
                        tracing::debug!(%board_id, saved_at = %snapshot.saved_at, "room hydrated");
                        Some(snapshot.document)
                    }
                    Ok(None) => None,
                    Err(err) => {
                        tracing::warn!(%board_id, error = %err, "hydration failed, starting empty");
                        None
                    }
                };
                let engine = self.engine_factory.create(initial);
                tracing::info!(%board_id, "room created");
                Arc::new(Room::new(board_id.clone(), engine))
            })
            .await
    }

    /// Snapshots the engine and writes it through the gateway.
    ///
    /// Success clears the dirty flag; failure logs and leaves it set. No
    /// retry here — the next tick or empty-transition supersedes it.
    async fn save_room(&self, room: &Room, state: &mut RoomState) {
        let snapshot = room.engine().snapshot();
        match self.store.save(room.board_id(), &snapshot).await {
            Ok(()) => {
                state.dirty = false;
                tracing::debug!(board_id = %room.board_id(), "room saved");
            }
            Err(err) => {
                tracing::warn!(board_id = %room.board_id(), error = %err, "room save failed");
            }
        }
    }

    /// Arms the periodic autosave task for a room.
    ///
    /// The first tick fires one full interval after arming. The task
    /// stops itself if it ever observes an empty session set, though
    /// `detach` normally aborts it first.
    fn spawn_autosave(self: &Arc<Self>, room: &Arc<Room>) -> AbortHandle {
        let service = Arc::clone(self);
        let room = Arc::clone(room);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(
                tokio::time::Instant::now() + service.config.autosave_interval,
                service.config.autosave_interval,
            );
            loop {
                ticker.tick().await;
                let mut state = room.state().lock().await;
                if state.sessions.is_empty() {
                    break;
                }
                service.save_room(&room, &mut state).await;
            }
        });
        handle.abort_handle()
    }

    /// Arms the delayed eviction task for a room.
    ///
    /// After the grace period the session set is re-checked under the
    /// room lock: a session that attached in the meantime aborts the
    /// eviction; otherwise the room is marked evicted and removed from
    /// the registry before the lock is released, so racing attaches
    /// observe the flag and retry against a fresh entry.
    fn spawn_eviction(self: &Arc<Self>, room: &Arc<Room>) -> AbortHandle {
        let service = Arc::clone(self);
        let room = Arc::clone(room);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(service.config.grace_period).await;
            let mut state = room.state().lock().await;
            state.eviction = None;
            if !state.sessions.is_empty() {
                tracing::debug!(board_id = %room.board_id(), "eviction aborted, room in use");
                return;
            }
            state.evicted = true;
            service.registry.remove(room.board_id()).await;
            tracing::info!(board_id = %room.board_id(), "room evicted");
        });
        handle.abort_handle()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use chrono::Utc;

    use super::*;
    use crate::domain::DocumentState;
    use crate::engine::{BroadcastEngineFactory, Frame, SyncEngine};
    use crate::error::GatewayError;
    use crate::persistence::models::Snapshot;

    /// In-memory gateway that counts loads and saves and can be told to
    /// fail writes.
    #[derive(Debug, Default)]
    struct MemoryStore {
        loads: AtomicUsize,
        saves: AtomicUsize,
        fail_saves: AtomicBool,
        snapshots: Mutex<HashMap<String, DocumentState>>,
    }

    impl MemoryStore {
        fn loads(&self) -> usize {
            self.loads.load(Ordering::SeqCst)
        }

        fn saves(&self) -> usize {
            self.saves.load(Ordering::SeqCst)
        }

        fn set_fail_saves(&self, fail: bool) {
            self.fail_saves.store(fail, Ordering::SeqCst);
        }
    }

    impl PersistenceGateway for MemoryStore {
        async fn load(&self, board_id: &BoardId) -> Result<Option<Snapshot>, GatewayError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            let snapshots = self.snapshots.lock().map_err(|_| {
                GatewayError::Internal("snapshot map poisoned".to_string())
            })?;
            Ok(snapshots.get(board_id.as_str()).map(|document| Snapshot {
                board_id: board_id.clone(),
                document: document.clone(),
                saved_at: Utc::now(),
            }))
        }

        async fn save(
            &self,
            board_id: &BoardId,
            document: &DocumentState,
        ) -> Result<(), GatewayError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            if self.fail_saves.load(Ordering::SeqCst) {
                return Err(GatewayError::PersistenceError("storage down".to_string()));
            }
            let mut snapshots = self.snapshots.lock().map_err(|_| {
                GatewayError::Internal("snapshot map poisoned".to_string())
            })?;
            snapshots.insert(board_id.as_str().to_string(), document.clone());
            Ok(())
        }
    }

    /// Engine factory that counts instantiations.
    #[derive(Debug, Default)]
    struct CountingFactory {
        created: Arc<AtomicUsize>,
        inner: BroadcastEngineFactory,
    }

    impl EngineFactory for CountingFactory {
        fn create(&self, initial: Option<DocumentState>) -> Arc<dyn SyncEngine> {
            self.created.fetch_add(1, Ordering::SeqCst);
            self.inner.create(initial)
        }
    }

    fn board(raw: &str) -> BoardId {
        let Ok(id) = BoardId::parse(raw) else {
            panic!("valid board id");
        };
        id
    }

    fn make_service(
        store: &Arc<MemoryStore>,
        autosave_secs: u64,
        grace_secs: u64,
    ) -> (Arc<RoomService<MemoryStore>>, Arc<AtomicUsize>) {
        let created = Arc::new(AtomicUsize::new(0));
        let factory = CountingFactory {
            created: Arc::clone(&created),
            inner: BroadcastEngineFactory,
        };
        let service = Arc::new(RoomService::new(
            Arc::clone(store),
            Box::new(factory),
            RoomConfig {
                autosave_interval: Duration::from_secs(autosave_secs),
                grace_period: Duration::from_secs(grace_secs),
            },
        ));
        (service, created)
    }

    // Two simultaneous first-connections converge on one room, one
    // hydration, one engine.
    #[tokio::test(start_paused = true)]
    async fn simultaneous_first_connections_share_one_room() {
        let store = Arc::new(MemoryStore::default());
        let (service, engines) = make_service(&store, 30, 60);
        let id = board("b1");

        let ((room_a, session_a), (room_b, session_b)) =
            tokio::join!(service.connect(&id), service.connect(&id));

        assert!(Arc::ptr_eq(&room_a, &room_b));
        assert_ne!(session_a, session_b);
        assert_eq!(store.loads(), 1);
        assert_eq!(engines.load(Ordering::SeqCst), 1);
        assert_eq!(room_a.session_count().await, 2);
        assert_eq!(service.registry().len().await, 1);
    }

    // Disconnect at t=10 saves immediately, arms eviction
    // for t=70, and produces no autosave ticks before or after.
    #[tokio::test(start_paused = true)]
    async fn disconnect_saves_immediately_then_evicts_after_grace() {
        let store = Arc::new(MemoryStore::default());
        let (service, _) = make_service(&store, 30, 60);
        let id = board("b2");

        let (room, session) = service.connect(&id).await;
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(store.saves(), 0, "interval has not elapsed yet");

        service.detach(&room, session).await;
        assert_eq!(store.saves(), 1, "empty transition saves synchronously");

        // t=69: one second short of the grace deadline.
        tokio::time::sleep(Duration::from_secs(59)).await;
        assert!(service.registry().get(&id).await.is_some());

        // t=71: grace elapsed, room evicted, no extra saves.
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(service.registry().get(&id).await.is_none());
        assert_eq!(store.saves(), 1);
    }

    // Reconnect inside the grace window cancels eviction and
    // reuses the live room without re-hydrating.
    #[tokio::test(start_paused = true)]
    async fn reconnect_within_grace_reuses_room() {
        let store = Arc::new(MemoryStore::default());
        let (service, engines) = make_service(&store, 30, 60);
        let id = board("b2");

        let (room, session) = service.connect(&id).await;
        service.detach(&room, session).await;
        assert_eq!(store.saves(), 1);

        tokio::time::sleep(Duration::from_secs(40)).await;
        let (room_again, _) = service.connect(&id).await;

        assert!(Arc::ptr_eq(&room, &room_again), "engine instance reused");
        assert_eq!(store.loads(), 1, "no re-hydration");
        assert_eq!(engines.load(Ordering::SeqCst), 1);

        // Past the original eviction deadline: still alive, autosave
        // re-armed (tick 30s after reconnect).
        tokio::time::sleep(Duration::from_secs(35)).await;
        assert!(service.registry().get(&id).await.is_some());
        assert_eq!(store.saves(), 2);
    }

    // A session held for 65 seconds with interval 30 produces
    // exactly two autosaves and zero evictions.
    #[tokio::test(start_paused = true)]
    async fn long_lived_session_autosaves_on_interval() {
        let store = Arc::new(MemoryStore::default());
        let (service, _) = make_service(&store, 30, 60);
        let id = board("b3");

        let (room, _session) = service.connect(&id).await;
        tokio::time::sleep(Duration::from_secs(65)).await;

        assert_eq!(store.saves(), 2, "ticks at t=30 and t=60 only");
        assert!(service.registry().get(&id).await.is_some());
        assert_eq!(room.session_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn session_count_tracks_attach_minus_detach() {
        let store = Arc::new(MemoryStore::default());
        let (service, _) = make_service(&store, 30, 60);
        let id = board("counts");

        let (room, first) = service.connect(&id).await;
        let (_, second) = service.connect(&id).await;
        assert_eq!(room.session_count().await, 2);

        service.detach(&room, first).await;
        assert_eq!(room.session_count().await, 1);
        assert_eq!(store.saves(), 0, "room is not empty yet");

        service.detach(&room, second).await;
        assert_eq!(room.session_count().await, 0);
        assert_eq!(store.saves(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn detach_is_idempotent_per_session() {
        let store = Arc::new(MemoryStore::default());
        let (service, _) = make_service(&store, 30, 60);
        let id = board("dup");

        let (room, session) = service.connect(&id).await;
        service.detach(&room, session).await;
        service.detach(&room, session).await;
        assert_eq!(store.saves(), 1, "second detach is a no-op");
    }

    #[tokio::test(start_paused = true)]
    async fn eviction_then_reconnect_rehydrates_from_saved_state() {
        let store = Arc::new(MemoryStore::default());
        let (service, engines) = make_service(&store, 30, 60);
        let id = board("persisted");

        let (room, session) = service.connect(&id).await;
        room.engine().handle_message(
            session,
            Frame::Text(
                serde_json::json!({"type": "put", "records": {"shape:1": {"x": 1}}}).to_string(),
            ),
        );
        room.mark_dirty().await;
        service.detach(&room, session).await;

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(service.registry().get(&id).await.is_none());

        let (fresh, _) = service.connect(&id).await;
        assert!(!Arc::ptr_eq(&room, &fresh), "evicted room is not reused");
        assert_eq!(store.loads(), 2, "recreation hydrates from storage");
        assert_eq!(engines.load(Ordering::SeqCst), 2);

        let snapshot = fresh.engine().snapshot();
        let Some(records) = snapshot.data.as_object() else {
            panic!("document data must be an object");
        };
        assert!(records.contains_key("shape:1"), "saved state survived eviction");
    }

    #[tokio::test(start_paused = true)]
    async fn save_failure_keeps_dirty_and_retries_on_next_tick() {
        let store = Arc::new(MemoryStore::default());
        let (service, _) = make_service(&store, 30, 60);
        let id = board("flaky");

        let (room, _session) = service.connect(&id).await;
        room.mark_dirty().await;
        store.set_fail_saves(true);

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(store.saves(), 1, "first tick attempted");
        assert!(room.is_dirty().await, "failed save leaves room dirty");

        store.set_fail_saves(false);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(store.saves(), 2, "next tick retried naturally");
        assert!(!room.is_dirty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn hydration_failure_starts_empty_room() {
        #[derive(Debug, Default)]
        struct FailingLoadStore(MemoryStore);

        impl PersistenceGateway for FailingLoadStore {
            async fn load(&self, _: &BoardId) -> Result<Option<Snapshot>, GatewayError> {
                Err(GatewayError::PersistenceError("storage down".to_string()))
            }

            async fn save(
                &self,
                board_id: &BoardId,
                document: &DocumentState,
            ) -> Result<(), GatewayError> {
                self.0.save(board_id, document).await
            }
        }

        let store = Arc::new(FailingLoadStore::default());
        let service = Arc::new(RoomService::new(
            Arc::clone(&store),
            Box::new(BroadcastEngineFactory),
            RoomConfig::default(),
        ));
        let id = board("unloadable");

        let (room, _) = service.connect(&id).await;
        assert!(room.engine().snapshot().is_empty());
        assert_eq!(room.session_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_flushes_every_live_room() {
        let store = Arc::new(MemoryStore::default());
        let (service, _) = make_service(&store, 30, 60);

        let (_room_a, _) = service.connect(&board("a")).await;
        let (_room_b, _) = service.connect(&board("b")).await;
        assert_eq!(store.saves(), 0);

        service.shutdown().await;
        assert_eq!(store.saves(), 2);
    }
}
