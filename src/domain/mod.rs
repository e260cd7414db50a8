//! Domain layer: board identity, documents, rooms, and the room registry.
//!
//! This module contains the server-side domain model: validated board
//! and session identifiers, the opaque document blob, the per-board room
//! with its lifecycle state, and the registry mapping board ids to live
//! rooms.

pub mod board_id;
pub mod document;
pub mod room;
pub mod room_registry;
pub mod session_id;

pub use board_id::BoardId;
pub use document::{DocumentState, SCHEMA_VERSION};
pub use room::Room;
pub use room_registry::RoomRegistry;
pub use session_id::SessionId;

pub(crate) use room::RoomState;
