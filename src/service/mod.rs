//! Service layer: room lifecycle orchestration.
//!
//! [`RoomService`] is the core of the gateway: it owns the
//! [`super::domain::RoomRegistry`], drives hydration, autosave, and
//! eviction, and is the only component that writes through the
//! persistence gateway.

pub mod room_service;

pub use room_service::{RoomConfig, RoomService};
