//! Sync engine seam.
//!
//! The merge algorithm that reconciles concurrent edits is not part of
//! this gateway. [`SyncEngine`] is the boundary the room lifecycle code
//! talks to: connect and disconnect sessions, forward raw frames, and ask
//! for a snapshot to persist. [`EngineFactory`] lets the room service
//! instantiate exactly one engine per room lifetime and lets tests swap
//! in counting fakes.

pub mod broadcast;

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::domain::{DocumentState, SessionId};

pub use broadcast::{BroadcastEngine, BroadcastEngineFactory};

/// A raw transport frame, in either direction.
///
/// Kept free of axum types so engines can be exercised without a socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// UTF-8 text frame (the built-in engine expects JSON here).
    Text(String),
    /// Opaque binary frame, relayed untouched.
    Binary(Vec<u8>),
}

/// Live merged document for one board.
///
/// Implementations must be internally synchronized: methods are called
/// concurrently from every connection task attached to the room. All
/// methods are synchronous; an engine never performs IO.
pub trait SyncEngine: fmt::Debug + Send + Sync {
    /// Registers a session and the channel its outbound frames go to.
    fn connect(&self, session_id: SessionId, outbound: mpsc::UnboundedSender<Frame>);

    /// Removes a session. Frames are no longer delivered to it.
    fn disconnect(&self, session_id: SessionId);

    /// Feeds one inbound frame from the given session into the engine.
    fn handle_message(&self, from: SessionId, frame: Frame);

    /// Returns the current document state for persistence.
    fn snapshot(&self) -> DocumentState;

    /// Returns the number of sessions currently connected to the engine.
    fn active_sessions(&self) -> usize;
}

/// Creates [`SyncEngine`] instances, one per room lifetime.
pub trait EngineFactory: fmt::Debug + Send + Sync {
    /// Builds an engine, seeded from a hydrated snapshot when one exists.
    fn create(&self, initial: Option<DocumentState>) -> Arc<dyn SyncEngine>;
}
