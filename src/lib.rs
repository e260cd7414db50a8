//! # boardsync-gateway
//!
//! WebSocket relay and REST gateway for shared whiteboard documents
//! ("boards").
//!
//! Many clients connect to the same board over WebSocket; the gateway
//! keeps one authoritative in-memory copy per board, hydrates it lazily
//! from PostgreSQL on first use, autosaves it periodically while clients
//! are attached, flushes it the moment the last client leaves, and
//! evicts it from memory after a grace period of inactivity. Merge
//! semantics for concurrent edits live behind the [`engine::SyncEngine`]
//! seam — this service is a coordination layer.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── Sync Endpoint (ws/)
//!     │
//!     ├── RoomService (service/)        lifecycle: hydrate, autosave, evict
//!     │
//!     ├── RoomRegistry (domain/)        board id → live Room
//!     ├── SyncEngine (engine/)          per-room fan-out + document
//!     │
//!     └── PostgreSQL Persistence
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod persistence;
pub mod service;
pub mod ws;
