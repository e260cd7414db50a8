//! WebSocket layer: the sync endpoint and per-connection bridging.
//!
//! The endpoint at `/sync` accepts one connection per client editing a
//! board. The connection task attaches a session to the board's room,
//! bridges frames between the socket and the sync engine, and guarantees
//! exactly one detach on teardown.

pub mod connection;
pub mod handler;
